//! # Timeline Module
//!
//! The scroll-scrub substrate.
//!
//! A `Timeline` is a set of per-node, per-property keyframe tracks that are
//! sampled as a pure function of time: seeking to the same time always
//! produces the same styles, which is what makes scrubbing safe to drive
//! from scroll position in either direction. `ScrubBinding` maps a pinned
//! scroll region onto a timeline, optionally smoothing the playhead, and
//! fires edge events (enter / leave-back) as declarative style actions.
//!
//! Tracks resolve by binary search over absolute keyframe times rather
//! than advancing a playhead, since a scrubbed timeline has no notion of
//! "forward".

use crate::animation::EasingType;
use crate::errors::StageError;
use crate::stage::Stage;
use crate::types::{NodeId, StyleProp};
use std::collections::HashMap;

const TIME_EPSILON: f64 = 1e-9;

#[derive(Clone, Debug)]
struct TrackKeyframe {
    value: f32,
    /// Absolute time on the timeline.
    time: f64,
    /// Easing applied over the segment ending at this keyframe.
    easing: EasingType,
}

/// All keyframes for one property of one node.
#[derive(Clone, Debug)]
pub struct PropertyTrack {
    pub node: NodeId,
    pub prop: StyleProp,
    keyframes: Vec<TrackKeyframe>,
    /// Start of the first tween. Before this the track does not write the
    /// property at all: setup styles and edge actions own it.
    active_from: f64,
}

impl PropertyTrack {
    fn new(node: NodeId, prop: StyleProp, initial: f32, active_from: f64) -> Self {
        Self {
            node,
            prop,
            keyframes: vec![TrackKeyframe {
                value: initial,
                time: 0.0,
                easing: EasingType::Linear,
            }],
            active_from,
        }
    }

    fn end_time(&self) -> f64 {
        self.keyframes.last().map(|k| k.time).unwrap_or(0.0)
    }

    fn last_value(&self) -> f32 {
        self.keyframes.last().map(|k| k.value).unwrap_or(0.0)
    }

    /// Samples the track at an absolute time.
    ///
    /// Before the first keyframe the initial value holds; past the last
    /// keyframe the final value holds (scrub end state).
    pub fn sample(&self, time: f64) -> f32 {
        let frames = &self.keyframes;
        if time <= frames[0].time {
            return frames[0].value;
        }
        if time >= frames[frames.len() - 1].time {
            return frames[frames.len() - 1].value;
        }

        // Index of the first keyframe strictly after `time`.
        let upper = frames.partition_point(|k| k.time <= time);
        let a = &frames[upper - 1];
        let b = &frames[upper];
        let span = b.time - a.time;
        if span <= TIME_EPSILON {
            return b.value;
        }
        let local = ((time - a.time) / span) as f32;
        a.value + (b.value - a.value) * b.easing.eval(local)
    }

    /// Samples the track for application to the stage: `None` while the
    /// timeline has not yet reached the track's first tween.
    pub fn sample_applied(&self, time: f64) -> Option<f32> {
        if time + TIME_EPSILON < self.active_from {
            return None;
        }
        Some(self.sample(time))
    }

    /// Drops keyframes past `time`, inserting a synthetic keyframe at
    /// `time` so the sampled value there is preserved. Used when a later
    /// insert overlaps the tail of the track.
    fn rewind_to(&mut self, time: f64) {
        if time >= self.end_time() - TIME_EPSILON {
            return;
        }
        let value_at = self.sample(time);
        self.keyframes.retain(|k| k.time < time - TIME_EPSILON);
        if self.keyframes.is_empty() {
            self.keyframes.push(TrackKeyframe {
                value: value_at,
                time: 0.0,
                easing: EasingType::Linear,
            });
        }
        if time > TIME_EPSILON {
            self.keyframes.push(TrackKeyframe {
                value: value_at,
                time,
                easing: EasingType::Linear,
            });
        }
    }
}

/// A scrubbed animation timeline: many property tracks sharing one clock.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    tracks: Vec<PropertyTrack>,
}

impl Timeline {
    /// Total duration: the latest keyframe across all tracks.
    pub fn duration(&self) -> f64 {
        self.tracks
            .iter()
            .map(|t| t.end_time())
            .fold(0.0, f64::max)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Samples every track at `time` and writes the values into the stage.
    pub fn sample_into(&self, stage: &mut Stage, time: f64) {
        for track in &self.tracks {
            let Some(value) = track.sample_applied(time) else {
                continue;
            };
            if let Some(node) = stage.node_mut(track.node) {
                node.style.set(track.prop, value);
            }
        }
    }

    /// Samples one property as it would be applied to the stage. Test seam.
    pub fn sample_prop(&self, node: NodeId, prop: StyleProp, time: f64) -> Option<f32> {
        self.tracks
            .iter()
            .find(|t| t.node == node && t.prop == prop)
            .and_then(|t| t.sample_applied(time))
    }
}

/// Builds a `Timeline` with positioned inserts.
///
/// `to` mirrors the usual tween-authoring call: animate a property to a
/// target value over a duration, starting at an absolute position on the
/// timeline. Gaps are filled by holding the previous value; an insert that
/// starts before the current end of its track truncates the overlap.
/// Implicit from-values are read from the stage's current inline styles at
/// build time, so setup state and timeline state cannot drift apart.
pub struct TimelineBuilder<'a> {
    stage: &'a Stage,
    tracks: HashMap<(NodeId, StyleProp), PropertyTrack>,
    order: Vec<(NodeId, StyleProp)>,
}

impl<'a> TimelineBuilder<'a> {
    pub fn new(stage: &'a Stage) -> Self {
        Self {
            stage,
            tracks: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Tweens `prop` on `node` to `target` over `duration` seconds,
    /// starting at absolute `position`.
    pub fn to(
        &mut self,
        node: NodeId,
        prop: StyleProp,
        target: f32,
        duration: f64,
        easing: EasingType,
        position: f64,
    ) -> &mut Self {
        let key = (node, prop);
        let position = position.max(0.0);
        if !self.tracks.contains_key(&key) {
            let initial = self
                .stage
                .node(node)
                .map(|n| n.style.effective(prop))
                .unwrap_or_default();
            self.tracks
                .insert(key, PropertyTrack::new(node, prop, initial, position));
            self.order.push(key);
        }
        let track = self.tracks.get_mut(&key).unwrap();
        if position < track.end_time() - TIME_EPSILON {
            track.rewind_to(position);
        } else if position > track.end_time() + TIME_EPSILON {
            // Hold the previous value until the insert position.
            let hold = track.last_value();
            track.keyframes.push(TrackKeyframe {
                value: hold,
                time: position,
                easing: EasingType::Linear,
            });
        }
        track.keyframes.push(TrackKeyframe {
            value: target,
            time: position + duration.max(0.0),
            easing,
        });
        self
    }

    pub fn build(mut self) -> Timeline {
        let tracks = self
            .order
            .iter()
            .filter_map(|key| self.tracks.remove(key))
            .collect();
        Timeline { tracks }
    }
}

/// The pinned scroll region a scrubbed timeline is bound to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PinSpec {
    /// Document scroll offset where pinning engages.
    pub start: f64,
    /// Document scroll offset where the timeline completes.
    pub end: f64,
}

impl PinSpec {
    /// Raw progress through the pinned region, clamped to [0, 1].
    pub fn progress(&self, scroll: f64) -> f64 {
        let span = self.end - self.start;
        if span <= TIME_EPSILON {
            return if scroll >= self.start { 1.0 } else { 0.0 };
        }
        ((scroll - self.start) / span).clamp(0.0, 1.0)
    }
}

/// A declarative style mutation fired on a pin edge event.
#[derive(Clone, Debug)]
pub enum StyleAction {
    SetOpacity { node: NodeId, value: f32 },
    SetVisible { node: NodeId, value: bool },
    AddClass { node: NodeId, class: String },
    RemoveClass { node: NodeId, class: String },
}

impl StyleAction {
    pub fn apply(&self, stage: &mut Stage) {
        match self {
            StyleAction::SetOpacity { node, value } => {
                if let Some(n) = stage.node_mut(*node) {
                    n.style.opacity = Some(*value);
                }
            }
            StyleAction::SetVisible { node, value } => {
                if let Some(n) = stage.node_mut(*node) {
                    n.style.visible = Some(*value);
                }
            }
            StyleAction::AddClass { node, class } => {
                if let Some(n) = stage.node_mut(*node) {
                    n.classes.add(class);
                }
            }
            StyleAction::RemoveClass { node, class } => {
                if let Some(n) = stage.node_mut(*node) {
                    n.classes.remove(class);
                }
            }
        }
    }
}

/// Binds a timeline to a pinned scroll region with optional scrub
/// smoothing.
///
/// The smoothed playhead only affects presentation; edge events and the
/// target time are derived from the raw pin progress, so semantics remain
/// a pure function of scroll position.
pub struct ScrubBinding {
    pub id: String,
    pub timeline: Timeline,
    pub pin: PinSpec,
    /// Catch-up time constant in seconds. Zero disables smoothing.
    pub scrub: f64,
    pub on_enter: Vec<StyleAction>,
    pub on_leave_back: Vec<StyleAction>,
    target_time: f64,
    current_time: f64,
    entered: bool,
}

impl ScrubBinding {
    pub fn new(id: &str, timeline: Timeline, pin: PinSpec, scrub: f64) -> Self {
        Self {
            id: id.to_string(),
            timeline,
            pin,
            scrub,
            on_enter: Vec::new(),
            on_leave_back: Vec::new(),
            target_time: 0.0,
            current_time: 0.0,
            entered: false,
        }
    }

    /// Reacts to a scroll position change: retargets the playhead and
    /// fires edge actions.
    pub fn on_scroll(&mut self, stage: &mut Stage, scroll: f64) {
        let progress = self.pin.progress(scroll);
        self.target_time = progress * self.timeline.duration();

        if progress > 0.0 && !self.entered {
            self.entered = true;
            for action in &self.on_enter {
                action.apply(stage);
            }
        } else if progress <= 0.0 && self.entered {
            self.entered = false;
            for action in &self.on_leave_back {
                action.apply(stage);
            }
        }
    }

    /// Advances the smoothed playhead and writes the sampled styles.
    pub fn tick(&mut self, stage: &mut Stage, dt: f64) {
        if self.scrub <= 0.0 {
            self.current_time = self.target_time;
        } else if dt > 0.0 {
            let alpha = 1.0 - (-dt / self.scrub).exp();
            self.current_time += (self.target_time - self.current_time) * alpha;
            if (self.target_time - self.current_time).abs() < 1e-4 {
                self.current_time = self.target_time;
            }
        }
        self.timeline.sample_into(stage, self.current_time);
    }

    pub fn has_entered(&self) -> bool {
        self.entered
    }

    pub fn playhead(&self) -> f64 {
        self.current_time
    }
}

/// Registry of scrub bindings, keyed by identifier.
///
/// Registration is guarded: a binding whose id is already present is
/// rejected, which is how route-scoped timelines stay idempotent across
/// repeated page-ready events.
#[derive(Default)]
pub struct ScrubRegistry {
    bindings: HashMap<String, ScrubBinding>,
}

impl ScrubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, binding: ScrubBinding) -> Result<(), StageError> {
        if self.bindings.contains_key(&binding.id) {
            return Err(StageError::DuplicateTimeline(binding.id));
        }
        self.bindings.insert(binding.id.clone(), binding);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.bindings.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&ScrubBinding> {
        self.bindings.get(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<ScrubBinding> {
        self.bindings.remove(id)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn on_scroll_all(&mut self, stage: &mut Stage, scroll: f64) {
        for binding in self.bindings.values_mut() {
            binding.on_scroll(stage, scroll);
        }
    }

    pub fn tick_all(&mut self, stage: &mut Stage, dt: f64) {
        for binding in self.bindings.values_mut() {
            binding.tick(stage, dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{Stage, StageNode};

    fn stage_with_node() -> (Stage, NodeId) {
        let mut stage = Stage::new();
        let id = stage.add_node(StageNode::new());
        (stage, id)
    }

    #[test]
    fn positioned_insert_holds_previous_value() {
        let (mut stage, id) = stage_with_node();
        stage.node_mut(id).unwrap().style.opacity = Some(0.0);

        let mut builder = TimelineBuilder::new(&stage);
        builder.to(id, StyleProp::Opacity, 1.0, 0.5, EasingType::Linear, 2.0);
        let tl = builder.build();

        // Untouched before the first tween starts; owned by setup styles.
        assert_eq!(tl.sample_prop(id, StyleProp::Opacity, 0.0), None);
        assert_eq!(tl.sample_prop(id, StyleProp::Opacity, 1.9), None);
        // From the insert position the tween interpolates from the value
        // the node had at build time.
        assert_eq!(tl.sample_prop(id, StyleProp::Opacity, 2.0), Some(0.0));
        let mid = tl.sample_prop(id, StyleProp::Opacity, 2.25).unwrap();
        assert!((mid - 0.5).abs() < 1e-4);
        assert_eq!(tl.sample_prop(id, StyleProp::Opacity, 5.0), Some(1.0));
    }

    #[test]
    fn overlapping_insert_truncates_tail() {
        let (mut stage, id) = stage_with_node();
        stage.node_mut(id).unwrap().style.opacity = Some(0.0);

        let mut builder = TimelineBuilder::new(&stage);
        builder
            .to(id, StyleProp::Opacity, 1.0, 0.25, EasingType::Linear, 0.0)
            .to(id, StyleProp::Opacity, 1.0, 0.4, EasingType::Linear, 0.25)
            // Exit begins 0.1 before the hold ends.
            .to(id, StyleProp::Opacity, 0.0, 0.5, EasingType::Linear, 0.55);
        let tl = builder.build();

        assert_eq!(tl.sample_prop(id, StyleProp::Opacity, 0.5), Some(1.0));
        let halfway = tl.sample_prop(id, StyleProp::Opacity, 0.8).unwrap();
        assert!((halfway - 0.5).abs() < 1e-4);
        assert_eq!(tl.sample_prop(id, StyleProp::Opacity, 2.0), Some(0.0));
        assert!((tl.duration() - 1.05).abs() < 1e-9);
    }

    #[test]
    fn scrub_binding_edges() {
        let (mut stage, id) = stage_with_node();
        stage.node_mut(id).unwrap().style.opacity = Some(0.0);

        let mut builder = TimelineBuilder::new(&stage);
        builder.to(id, StyleProp::Opacity, 1.0, 1.0, EasingType::Linear, 0.0);
        let tl = builder.build();

        let mut binding = ScrubBinding::new(
            "test",
            tl,
            PinSpec {
                start: 100.0,
                end: 200.0,
            },
            0.0,
        );
        binding.on_enter.push(StyleAction::AddClass {
            node: id,
            class: "is-ready".into(),
        });
        binding.on_leave_back.push(StyleAction::RemoveClass {
            node: id,
            class: "is-ready".into(),
        });

        binding.on_scroll(&mut stage, 0.0);
        assert!(!binding.has_entered());

        binding.on_scroll(&mut stage, 150.0);
        assert!(binding.has_entered());
        assert!(stage.node(id).unwrap().classes.contains("is-ready"));

        binding.tick(&mut stage, 0.016);
        let opacity = stage.node(id).unwrap().style.opacity.unwrap();
        assert!((opacity - 0.5).abs() < 1e-4);

        binding.on_scroll(&mut stage, 50.0);
        assert!(!binding.has_entered());
        assert!(!stage.node(id).unwrap().classes.contains("is-ready"));
    }

    #[test]
    fn registry_rejects_duplicate_ids() {
        let mut registry = ScrubRegistry::new();
        let pin = PinSpec {
            start: 0.0,
            end: 100.0,
        };
        registry
            .register(ScrubBinding::new("tl", Timeline::default(), pin, 0.0))
            .unwrap();
        let err = registry
            .register(ScrubBinding::new("tl", Timeline::default(), pin, 0.0))
            .unwrap_err();
        assert!(matches!(err, StageError::DuplicateTimeline(_)));
        assert_eq!(registry.len(), 1);
    }
}
