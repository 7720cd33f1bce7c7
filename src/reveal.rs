//! # Reveal Module
//!
//! One-shot viewport entrance animations.
//!
//! Tagged elements are armed with a variant-specific hidden state the
//! moment the engine scans the stage, so there is never a frame where an
//! element is visible in its resting state before its entrance plays.
//! Detection arms after a short layout-settling delay; each element
//! triggers at most once per initialization cycle, tracked by a visited
//! set that is cleared wholesale on re-init.

use crate::animation::Animated;
use crate::narrative;
use crate::stage::Stage;
use crate::tokens::RevealTokens;
use crate::types::{NodeId, Rect, RevealVariant, StyleProp};
use crate::ViewportProvider;
use std::collections::HashSet;
use tracing::debug;

/// Class marking an element whose entrance has settled.
pub const VISIBLE_CLASS: &str = "is-visible";

/// Header element key used for anchor offset measurement.
pub const HEADER_KEY: &str = "header";

/// Fallback header height when no header node is present.
const HEADER_FALLBACK: f32 = 80.0;

/// The hidden initial state for one reveal variant.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InitialState {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub blur: f32,
}

/// Variant lookup: each variant maps to a distinct combination of offset,
/// scale, and blur. Opacity is always 0 and visibility hidden on top of
/// this record.
pub fn initial_state(variant: RevealVariant) -> InitialState {
    match variant {
        RevealVariant::Left => InitialState {
            x: -60.0,
            y: 0.0,
            scale: 1.0,
            blur: 5.0,
        },
        RevealVariant::Right => InitialState {
            x: 60.0,
            y: 0.0,
            scale: 1.0,
            blur: 5.0,
        },
        RevealVariant::Scale => InitialState {
            x: 0.0,
            y: 0.0,
            scale: 0.8,
            blur: 5.0,
        },
        RevealVariant::Fade => InitialState {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            blur: 10.0,
        },
        // Slight drop and zoom, explicitly no blur.
        RevealVariant::Pop => InitialState {
            x: 0.0,
            y: 30.0,
            scale: 0.95,
            blur: 0.0,
        },
        // Slides in from the trailing edge with a slight zoom; no
        // vertical motion so it reads differently from `up`.
        RevealVariant::SoftSlide => InitialState {
            x: 80.0,
            y: 0.0,
            scale: 0.95,
            blur: 5.0,
        },
        RevealVariant::Up => InitialState {
            x: 0.0,
            y: 50.0,
            scale: 1.0,
            blur: 5.0,
        },
    }
}

/// Viewport-intersection detection over a set of observed nodes.
struct IntersectionWatcher {
    observed: Vec<NodeId>,
    threshold: f32,
    bottom_margin: f32,
    top_guard_scroll: f64,
}

impl IntersectionWatcher {
    /// Returns the nodes that crossed into the viewport this frame,
    /// removing them from observation.
    fn check(
        &mut self,
        provider: &dyn ViewportProvider,
        scroll: f64,
    ) -> Vec<NodeId> {
        let viewport = provider.viewport_size();
        let root = Rect::new(
            0.0,
            0.0,
            viewport.x,
            viewport.y * (1.0 - self.bottom_margin),
        );

        let mut triggered = Vec::new();
        self.observed.retain(|&node| {
            let Some(rect) = provider.element_rect(node) else {
                return true;
            };
            if rect.coverage_by(&root) < self.threshold {
                return true;
            }
            // Top-of-page guard: while sitting at the very top, elements
            // fully below the fold stay armed instead of firing.
            if scroll < self.top_guard_scroll && rect.top() > viewport.y {
                return true;
            }
            triggered.push(node);
            false
        });
        triggered
    }

    fn observed_count(&self) -> usize {
        self.observed.len()
    }
}

/// One in-flight entrance animation.
struct EntranceTween {
    node: NodeId,
    delay: f64,
    elapsed: f64,
    duration: f64,
    tracks: Vec<(StyleProp, Animated<f32>)>,
}

impl EntranceTween {
    fn new(stage: &Stage, node: NodeId, delay: f64, tokens: &RevealTokens) -> Self {
        let style = stage
            .node(node)
            .map(|n| n.style)
            .unwrap_or_default();

        let resting = [
            (StyleProp::Opacity, 1.0),
            (StyleProp::TranslateX, 0.0),
            (StyleProp::TranslateY, 0.0),
            (StyleProp::Scale, 1.0),
            (StyleProp::RotationY, 0.0),
            (StyleProp::Blur, 0.0),
        ];

        let tracks = resting
            .into_iter()
            .map(|(prop, target)| {
                let mut anim = Animated::new(style.effective(prop));
                anim.add_keyframe(target, tokens.duration, tokens.easing);
                (prop, anim)
            })
            .collect();

        Self {
            node,
            delay,
            elapsed: 0.0,
            duration: tokens.duration,
            tracks,
        }
    }

    /// Advances the tween. Returns true once the entrance has settled.
    fn advance(&mut self, stage: &mut Stage, dt: f64) -> bool {
        self.elapsed += dt;
        let local = self.elapsed - self.delay;
        if local < 0.0 {
            return false;
        }

        let Some(node) = stage.node_mut(self.node) else {
            // Node removed mid-flight; drop the tween.
            return true;
        };

        node.style.visible = Some(true);
        for (prop, anim) in self.tracks.iter_mut() {
            anim.update(local);
            node.style.set(*prop, anim.current_value);
        }

        if local >= self.duration {
            // Settle: drop the transient inline state so later re-flows
            // cannot pick up stale transform or opacity values.
            node.style.clear_transient();
            node.classes.add(VISIBLE_CLASS);
            return true;
        }
        false
    }
}

/// The reveal engine: scan, arm, detect, play, settle.
pub struct RevealEngine {
    tokens: RevealTokens,
    watcher: Option<IntersectionWatcher>,
    /// Nodes waiting for the watcher to arm, with the remaining delay.
    pending_arm: Option<(f64, Vec<NodeId>)>,
    visited: HashSet<NodeId>,
    active: Vec<EntranceTween>,
}

impl RevealEngine {
    pub fn new(tokens: RevealTokens) -> Self {
        Self {
            tokens,
            watcher: None,
            pending_arm: None,
            visited: HashSet::new(),
            active: Vec::new(),
        }
    }

    /// Idempotent entry point, called on every page-ready event.
    ///
    /// Discards any previous watcher, clears the visited set, and re-arms
    /// every tagged element with its hidden initial state. Elements inside
    /// the narrative wrapper are owned by the narrative controller and are
    /// force-set visible here instead.
    pub fn init_scroll_animations(&mut self, stage: &mut Stage) {
        self.watcher = None;
        self.pending_arm = None;
        self.visited.clear();
        self.active.clear();

        let narrative_root = stage.by_key(narrative::WRAPPER_KEY);
        let mut to_observe = Vec::new();

        for id in stage.tagged() {
            if let Some(root) = narrative_root {
                if stage.contains(root, id) {
                    if let Some(node) = stage.node_mut(id) {
                        node.style.opacity = Some(1.0);
                        node.classes.add(VISIBLE_CLASS);
                    }
                    continue;
                }
            }

            let Some(node) = stage.node_mut(id) else {
                continue;
            };
            let variant = node.reveal.map(|r| r.variant).unwrap_or_default();
            let from = initial_state(variant);

            // Applied synchronously, before any detection can run.
            node.style.opacity = Some(0.0);
            node.style.visible = Some(false);
            node.style.translate_x = Some(from.x);
            node.style.translate_y = Some(from.y);
            node.style.scale = Some(from.scale);
            node.style.blur = Some(from.blur);

            to_observe.push(id);
        }

        if to_observe.is_empty() {
            return;
        }
        debug!(count = to_observe.len(), "armed reveal elements");
        self.pending_arm = Some((self.tokens.arm_delay, to_observe));
    }

    /// Advances arming, detection, and in-flight entrances by one frame.
    pub fn tick(
        &mut self,
        stage: &mut Stage,
        provider: &dyn ViewportProvider,
        scroll: f64,
        dt: f64,
    ) {
        let armed = match self.pending_arm.as_mut() {
            Some((remaining, nodes)) => {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    Some(std::mem::take(nodes))
                } else {
                    None
                }
            }
            None => None,
        };
        if let Some(observed) = armed {
            self.pending_arm = None;
            self.watcher = Some(IntersectionWatcher {
                observed,
                threshold: self.tokens.threshold,
                bottom_margin: self.tokens.bottom_margin,
                top_guard_scroll: self.tokens.top_guard_scroll,
            });
        }

        let triggered = match self.watcher.as_mut() {
            Some(watcher) => watcher.check(provider, scroll),
            None => Vec::new(),
        };
        for node in triggered {
            self.play(stage, node);
        }

        self.active
            .retain_mut(|tween| !tween.advance(stage, dt));
    }

    fn play(&mut self, stage: &Stage, node: NodeId) {
        if !self.visited.insert(node) {
            return;
        }
        let delay = stage
            .node(node)
            .and_then(|n| n.reveal)
            .map(|r| r.delay)
            .unwrap_or(0.0);
        self.active
            .push(EntranceTween::new(stage, node, delay, &self.tokens));
    }

    /// Tears detection down before a page swap: disconnects the watcher,
    /// clears the visited set, and cancels in-flight entrances so no
    /// callback can touch removed nodes.
    pub fn cleanup_animations(&mut self) {
        self.watcher = None;
        self.pending_arm = None;
        self.visited.clear();
        self.active.clear();
    }

    /// Number of nodes the detector is still watching.
    pub fn observed_count(&self) -> usize {
        self.watcher
            .as_ref()
            .map(|w| w.observed_count())
            .unwrap_or(0)
            + self
                .pending_arm
                .as_ref()
                .map(|(_, nodes)| nodes.len())
                .unwrap_or(0)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// True once the watcher has armed (the settling delay elapsed).
    pub fn is_armed(&self) -> bool {
        self.watcher.is_some()
    }
}

/// In-page anchor scrolling: resolves a link target to the scroll offset
/// that places it just below the fixed header.
///
/// Stateless apart from the install guard; installing twice is a no-op and
/// there is deliberately no teardown.
#[derive(Default)]
pub struct AnchorScroller {
    installed: bool,
}

impl AnchorScroller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the click interceptor installed. Returns false when it
    /// already was.
    pub fn install(&mut self) -> bool {
        if self.installed {
            return false;
        }
        self.installed = true;
        true
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Computes the scroll target for an in-page anchor, or `None` when
    /// the target element does not exist.
    pub fn resolve(
        &self,
        stage: &Stage,
        provider: &dyn ViewportProvider,
        target_key: &str,
    ) -> Option<f64> {
        let target = stage.by_key(target_key)?;
        let offset = provider.document_offset(target)?;

        let header_height = stage
            .by_key(HEADER_KEY)
            .and_then(|id| provider.element_rect(id))
            .map(|rect| rect.size.y)
            .unwrap_or(HEADER_FALLBACK);

        Some(offset - header_height as f64)
    }
}
