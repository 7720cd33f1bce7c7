//! # Tokens Module
//!
//! Motion design tokens: every tuned constant in the engine lives here so
//! product can retune timings without touching control logic. All groups
//! deserialize from JSON with per-field defaults, so a tokens file only
//! needs to name what it overrides.

use crate::animation::EasingType;
use crate::errors::StageError;
use serde::{Deserialize, Serialize};

/// Reveal (one-shot entrance) tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealTokens {
    /// Entrance tween duration, seconds.
    pub duration: f64,
    pub easing: EasingType,
    /// Layout-settling delay before the intersection watcher arms.
    pub arm_delay: f64,
    /// Minimum visible fraction of an element before it triggers.
    pub threshold: f32,
    /// Fraction of viewport height shaved off the detection root's bottom
    /// edge, so elements trigger slightly before the exact viewport edge.
    pub bottom_margin: f32,
    /// While the page sits above this scroll offset, elements fully below
    /// the fold are not allowed to trigger.
    pub top_guard_scroll: f64,
}

impl Default for RevealTokens {
    fn default() -> Self {
        Self {
            duration: 0.8,
            easing: EasingType::QuartOut,
            arm_delay: 0.1,
            threshold: 0.1,
            bottom_margin: 0.05,
            top_guard_scroll: 50.0,
        }
    }
}

/// Narrative word-sequence tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeTokens {
    pub enter: f64,
    pub hold: f64,
    pub exit: f64,
    pub gap: f64,
    /// How far the exit overlaps the end of the hold.
    pub exit_overlap: f64,
    /// Content panel fade duration.
    pub content_fade: f64,
    /// Pause between the content fade and the first word.
    pub words_lead_in: f64,
    pub flip_start: f64,
    pub flip_duration: f64,
    pub flip_hold: f64,
    /// Scroll length per timeline unit, percent of viewport height.
    pub compact_multiplier: f64,
    pub wide_multiplier: f64,
    /// Scrub catch-up time constants, seconds.
    pub compact_scrub: f64,
    pub wide_scrub: f64,
}

impl NarrativeTokens {
    /// Length of one word's enter/hold/exit/gap cycle.
    pub fn cycle(&self) -> f64 {
        self.enter + self.hold + self.exit + self.gap
    }
}

impl Default for NarrativeTokens {
    fn default() -> Self {
        Self {
            enter: 0.25,
            hold: 0.4,
            exit: 0.5,
            gap: 0.15,
            exit_overlap: 0.1,
            content_fade: 0.5,
            words_lead_in: 0.1,
            flip_start: 0.2,
            flip_duration: 1.0,
            flip_hold: 0.3,
            compact_multiplier: 20.0,
            wide_multiplier: 50.0,
            compact_scrub: 0.2,
            wide_scrub: 0.8,
        }
    }
}

/// Virtual smooth-scroll tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollTokens {
    /// Eased segment duration, seconds.
    pub duration: f64,
    /// Minimum viewport width for the virtual scroll engine; narrower
    /// viewports keep native scrolling.
    pub min_width: f32,
    pub wheel_multiplier: f64,
    /// Lag-smoothing catch-up cap, seconds.
    pub lag_catch_up: f64,
    /// Frame delta substituted when the cap is exceeded.
    pub lag_min_frame: f64,
}

impl Default for ScrollTokens {
    fn default() -> Self {
        Self {
            duration: 1.2,
            min_width: 1024.0,
            wheel_multiplier: 1.0,
            lag_catch_up: 0.5,
            lag_min_frame: 0.033,
        }
    }
}

/// Viewport breakpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Breakpoints {
    /// Below this width the compact narrative recipe parameters apply.
    pub compact: f32,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self { compact: 768.0 }
    }
}

/// The full token set.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTokens {
    pub reveal: RevealTokens,
    pub narrative: NarrativeTokens,
    pub scroll: ScrollTokens,
    pub breakpoints: Breakpoints,
}

impl MotionTokens {
    pub fn from_json_str(json: &str) -> Result<Self, StageError> {
        Ok(serde_json::from_str(json)?)
    }
}
