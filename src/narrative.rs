//! # Narrative Module
//!
//! The pinned, scroll-scrubbed word sequence on the home route.
//!
//! Four words take turns entering, holding, and exiting while the region
//! stays pinned; a content panel and (on compact viewports) a flip card
//! share the same timeline. Everything is keyed to scroll position, so
//! re-entering the region resumes exactly where the scroll offset says.
//!
//! Two timeline recipes exist side by side (see `NarrativeRecipe`); they
//! are deliberately not merged. `HeldFinale` is the canonical one.

use crate::animation::EasingType;
use crate::stage::Stage;
use crate::timeline::{PinSpec, ScrubBinding, ScrubRegistry, StyleAction, TimelineBuilder};
use crate::tokens::{Breakpoints, NarrativeTokens};
use crate::types::{NodeId, ViewportClass};
use crate::ViewportProvider;
use tracing::debug;

/// Registry identifier guarding against duplicate construction.
pub const TIMELINE_ID: &str = "scrollytelling";

/// The route this controller applies to.
pub const HOME_ROUTE: &str = "/";

pub const WRAPPER_KEY: &str = "scrollytellingWrapper";
pub const CONTAINER_KEY: &str = "scrollytellingContainer";
pub const CONTENT_KEY: &str = "scrollytellingContent";
pub const WORDS_CONTAINER_KEY: &str = "scrollytelling-words";
pub const FLIP_SCENE_KEY: &str = "mobile-flip-scene";
pub const FLIP_FRONT_KEY: &str = "mobile-flip-front";
pub const FLIP_BACK_KEY: &str = "mobile-flip-back";

/// Class gating the word container's visibility.
pub const READY_CLASS: &str = "is-ready";
/// Class cleared from words during reset (CSS-only fallback styling).
pub const ACTIVE_CLASS: &str = "is-active";

/// Number of narrative words the markup must provide.
pub const WORD_COUNT: usize = 4;

/// The two scrollytelling timeline recipes.
///
/// They disagree on the last word's exit, the placement of the compact
/// flip sub-sequence, and the total-duration formula, and are kept as
/// alternatives rather than merged. Which one is authoritative is a
/// product decision; `HeldFinale` matches the shipped behavior.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum NarrativeRecipe {
    /// Content fades out first, the flip (compact) runs before the words,
    /// and the last word skips its exit and holds as the end state.
    #[default]
    HeldFinale,
    /// Every word performs the full exit; the sequence resolves with a
    /// crossfade that brings the content panel in as the words fade out.
    /// The flip (compact) runs after the words. On wide viewports the
    /// first word starts visible and skips its entrance.
    CrossfadeFinale,
}

struct NarrativeNodes {
    wrapper: NodeId,
    container: NodeId,
    content: NodeId,
    words_container: NodeId,
    words: [NodeId; WORD_COUNT],
    flip: Option<(NodeId, NodeId)>,
}

/// Word-sequence duration excluding content fade and flip:
/// `(n - 1) * cycle + enter + hold`.
pub fn word_sequence_duration(tokens: &NarrativeTokens, words: usize) -> f64 {
    (words.saturating_sub(1)) as f64 * tokens.cycle() + tokens.enter + tokens.hold
}

/// Total pinned-timeline duration for a recipe, in timeline units.
pub fn total_duration(tokens: &NarrativeTokens, recipe: NarrativeRecipe, has_flip: bool) -> f64 {
    let flip = if has_flip {
        tokens.flip_duration + tokens.flip_hold
    } else {
        0.0
    };
    match recipe {
        NarrativeRecipe::HeldFinale => {
            tokens.content_fade + flip + word_sequence_duration(tokens, WORD_COUNT)
        }
        NarrativeRecipe::CrossfadeFinale => {
            WORD_COUNT as f64 * tokens.cycle() + tokens.content_fade + flip
        }
    }
}

/// Builds and registers the narrative timeline.
///
/// A no-op away from the home route, when any required element is absent,
/// when the wrapper has no measurable document offset, or when the
/// timeline is already registered. None of these is an error.
pub fn init(
    registry: &mut ScrubRegistry,
    stage: &mut Stage,
    provider: &dyn ViewportProvider,
    tokens: &NarrativeTokens,
    breakpoints: &Breakpoints,
    recipe: NarrativeRecipe,
    route: &str,
) {
    if route != HOME_ROUTE {
        return;
    }
    if registry.contains(TIMELINE_ID) {
        return;
    }

    let viewport = provider.viewport_size();
    let device = ViewportClass::from_width(viewport.x, breakpoints.compact);

    let Some(nodes) = resolve_nodes(stage, device) else {
        return;
    };
    let Some(pin_start) = provider.document_offset(nodes.wrapper) else {
        return;
    };

    reset(stage, &nodes);
    setup(stage, &nodes, recipe, device);

    let has_flip = nodes.flip.is_some();
    let timeline = match recipe {
        NarrativeRecipe::HeldFinale => build_held_finale(stage, &nodes, tokens),
        NarrativeRecipe::CrossfadeFinale => build_crossfade_finale(stage, &nodes, tokens, device),
    };

    let (multiplier, scrub) = match device {
        ViewportClass::Compact => (tokens.compact_multiplier, tokens.compact_scrub),
        ViewportClass::Wide => (tokens.wide_multiplier, tokens.wide_scrub),
    };
    let total = total_duration(tokens, recipe, has_flip);
    let scroll_length = total * multiplier / 100.0 * viewport.y as f64;
    let pin = PinSpec {
        start: pin_start,
        end: pin_start + scroll_length,
    };

    let mut binding = ScrubBinding::new(TIMELINE_ID, timeline, pin, scrub);
    binding.on_enter.push(StyleAction::SetOpacity {
        node: nodes.words_container,
        value: 1.0,
    });
    binding.on_leave_back.push(StyleAction::SetOpacity {
        node: nodes.words_container,
        value: 0.0,
    });
    if recipe == NarrativeRecipe::CrossfadeFinale {
        // The finale panel must stay hidden when re-entering from above,
        // or it flashes before the words restart.
        binding.on_leave_back.push(StyleAction::SetOpacity {
            node: nodes.content,
            value: 0.0,
        });
    }

    debug!(
        ?recipe,
        ?device,
        total,
        scroll_length,
        "registered narrative timeline"
    );
    // Contains-check above makes this infallible; a racing registration
    // cannot happen within a single event turn.
    let _ = registry.register(binding);
}

fn resolve_nodes(stage: &Stage, device: ViewportClass) -> Option<NarrativeNodes> {
    let wrapper = stage.by_key(WRAPPER_KEY)?;
    let container = stage.by_key(CONTAINER_KEY)?;
    let content = stage.by_key(CONTENT_KEY)?;
    let words_container = stage.by_key(WORDS_CONTAINER_KEY)?;

    let mut words = [0; WORD_COUNT];
    for (i, slot) in words.iter_mut().enumerate() {
        *slot = stage.by_key(&format!("word-{i}"))?;
    }

    // The flip card participates only on compact viewports and only when
    // all three faces exist in the markup.
    let flip = if device == ViewportClass::Compact {
        match (
            stage.by_key(FLIP_SCENE_KEY),
            stage.by_key(FLIP_FRONT_KEY),
            stage.by_key(FLIP_BACK_KEY),
        ) {
            (Some(_), Some(front), Some(back)) => Some((front, back)),
            _ => None,
        }
    } else {
        None
    };

    Some(NarrativeNodes {
        wrapper,
        container,
        content,
        words_container,
        words,
        flip,
    })
}

/// Strips all inline style and class state so the sequence starts from a
/// deterministic baseline regardless of navigation history.
fn reset(stage: &mut Stage, nodes: &NarrativeNodes) {
    let mut targets = vec![nodes.words_container, nodes.content, nodes.container];
    targets.extend_from_slice(&nodes.words);
    for id in targets {
        if let Some(node) = stage.node_mut(id) {
            node.style.clear();
            node.classes.remove(READY_CLASS);
            node.classes.remove(ACTIVE_CLASS);
        }
    }
}

fn setup(stage: &mut Stage, nodes: &NarrativeNodes, recipe: NarrativeRecipe, device: ViewportClass) {
    // Shown but transparent until the pinned region is entered, so no
    // static frame of the words can flash during layout.
    if let Some(container) = stage.node_mut(nodes.words_container) {
        container.style.visible = Some(true);
        container.style.opacity = Some(0.0);
        container.classes.add(READY_CLASS);
    }

    if let Some(content) = stage.node_mut(nodes.content) {
        content.style.visible = Some(true);
        content.style.opacity = Some(match recipe {
            NarrativeRecipe::HeldFinale => 1.0,
            NarrativeRecipe::CrossfadeFinale => 0.0,
        });
    }

    for (i, &word) in nodes.words.iter().enumerate() {
        let starts_visible = recipe == NarrativeRecipe::CrossfadeFinale
            && device == ViewportClass::Wide
            && i == 0;
        if let Some(node) = stage.node_mut(word) {
            node.style.visible = Some(true);
            if starts_visible {
                node.style.opacity = Some(1.0);
                node.style.scale = Some(1.0);
                node.style.blur = Some(0.0);
            } else {
                node.style.opacity = Some(0.0);
                node.style.scale = Some(0.8);
                node.style.blur = Some(20.0);
            }
        }
    }

    if let Some((front, back)) = nodes.flip {
        if let Some(node) = stage.node_mut(front) {
            node.style.rotation_y = Some(0.0);
            node.style.opacity = Some(1.0);
            node.style.z_index = Some(2);
        }
        if let Some(node) = stage.node_mut(back) {
            node.style.rotation_y = Some(-180.0);
            node.style.opacity = Some(0.0);
            node.style.z_index = Some(1);
        }
    }
}

/// Adds the flip-card rotation pair starting at `at`. Returns the time
/// the sub-sequence (including its hold) completes.
fn add_flip(
    builder: &mut TimelineBuilder,
    front: NodeId,
    back: NodeId,
    tokens: &NarrativeTokens,
    at: f64,
) -> f64 {
    use crate::types::StyleProp::{Opacity, RotationY};

    let d = tokens.flip_duration;
    builder
        .to(front, RotationY, 180.0, d, EasingType::QuadInOut, at)
        .to(front, Opacity, 0.0, d, EasingType::QuadInOut, at)
        .to(back, RotationY, 0.0, d, EasingType::QuadInOut, at)
        .to(back, Opacity, 1.0, d, EasingType::QuadInOut, at);
    at + d + tokens.flip_hold
}

/// Adds one word's enter/hold(/exit) tracks starting at `start`.
fn add_word(
    builder: &mut TimelineBuilder,
    word: NodeId,
    tokens: &NarrativeTokens,
    start: f64,
    with_enter: bool,
    with_exit: bool,
) {
    use crate::types::StyleProp::{Blur, Opacity, Scale};

    if with_enter {
        builder
            .to(word, Opacity, 1.0, tokens.enter, EasingType::CubicOut, start)
            .to(word, Scale, 1.0, tokens.enter, EasingType::CubicOut, start)
            .to(word, Blur, 0.0, tokens.enter, EasingType::CubicOut, start);
    }

    // Hold: static keyframes so the track (and the timeline's duration)
    // covers the full cycle even for the final, never-exiting word.
    let hold_at = start + tokens.enter;
    let shown = [(Opacity, 1.0), (Scale, 1.0), (Blur, 0.0)];
    for (prop, value) in shown {
        builder.to(word, prop, value, tokens.hold, EasingType::Linear, hold_at);
    }

    if with_exit {
        let exit_at = start + tokens.enter + tokens.hold - tokens.exit_overlap;
        builder
            .to(word, Opacity, 0.0, tokens.exit, EasingType::QuadIn, exit_at)
            .to(word, Scale, 0.6, tokens.exit, EasingType::QuadIn, exit_at)
            .to(word, Blur, 15.0, tokens.exit, EasingType::QuadIn, exit_at);
    }
}

/// Canonical recipe: content fade (after the compact flip, when present),
/// then the word cycle, last word held.
fn build_held_finale(
    stage: &Stage,
    nodes: &NarrativeNodes,
    tokens: &NarrativeTokens,
) -> crate::timeline::Timeline {
    use crate::types::StyleProp::Opacity;

    let mut builder = TimelineBuilder::new(stage);

    let content_fade_at = match nodes.flip {
        Some((front, back)) => add_flip(&mut builder, front, back, tokens, tokens.flip_start),
        None => 0.0,
    };
    builder.to(
        nodes.content,
        Opacity,
        0.0,
        tokens.content_fade,
        EasingType::CubicIn,
        content_fade_at,
    );

    let words_start = content_fade_at + tokens.content_fade + tokens.words_lead_in;
    for (i, &word) in nodes.words.iter().enumerate() {
        let start = words_start + i as f64 * tokens.cycle();
        let last = i == nodes.words.len() - 1;
        add_word(&mut builder, word, tokens, start, true, !last);
    }

    builder.build()
}

/// Alternate recipe: full word cycle with every exit, compact flip after
/// the words, then a crossfade into the content panel.
fn build_crossfade_finale(
    stage: &Stage,
    nodes: &NarrativeNodes,
    tokens: &NarrativeTokens,
    device: ViewportClass,
) -> crate::timeline::Timeline {
    use crate::types::StyleProp::Opacity;

    let mut builder = TimelineBuilder::new(stage);

    let words_start = tokens.words_lead_in;
    for (i, &word) in nodes.words.iter().enumerate() {
        let start = words_start + i as f64 * tokens.cycle();
        let with_enter = !(device == ViewportClass::Wide && i == 0);
        add_word(&mut builder, word, tokens, start, with_enter, true);
    }

    let words_end = words_start + nodes.words.len() as f64 * tokens.cycle();
    let crossfade_at = match nodes.flip {
        Some((front, back)) => add_flip(&mut builder, front, back, tokens, words_end),
        None => words_end,
    };

    builder
        .to(
            nodes.content,
            Opacity,
            1.0,
            tokens.content_fade,
            EasingType::CubicOut,
            crossfade_at,
        )
        .to(
            nodes.words_container,
            Opacity,
            0.0,
            tokens.content_fade,
            EasingType::CubicIn,
            crossfade_at,
        );

    builder.build()
}
