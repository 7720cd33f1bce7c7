//! # Types Module
//!
//! Shared data types used across the engine.
//!
//! ## Responsibilities
//! - **Geometry**: Viewport-relative rectangles and intersection math.
//! - **Reveal attributes**: The markup-facing variant/delay contract.
//! - **Inline style**: The per-node style record the engine writes and the
//!   embedder renders.
//!
//! ## Key Types
//! - `Rect`: Axis-aligned rectangle built on `glam::Vec2`.
//! - `RevealVariant`: Entrance animation variants (`up`, `left`, ...).
//! - `InlineStyle`: Sparse inline style, `None` meaning "not set".
//! - `NodeId`: Type alias for arena indices (`usize`).

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A unique identifier for a node on the stage.
pub type NodeId = usize;

/// An axis-aligned rectangle in viewport or document space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rect {
    /// Top-left corner.
    pub origin: Vec2,
    /// Width and height.
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn top(&self) -> f32 {
        self.origin.y
    }

    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.y
    }

    pub fn area(&self) -> f32 {
        self.size.x * self.size.y
    }

    /// Area of the overlap between two rectangles (zero if disjoint).
    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let x0 = self.origin.x.max(other.origin.x);
        let y0 = self.origin.y.max(other.origin.y);
        let x1 = (self.origin.x + self.size.x).min(other.origin.x + other.size.x);
        let y1 = (self.origin.y + self.size.y).min(other.origin.y + other.size.y);
        (x1 - x0).max(0.0) * (y1 - y0).max(0.0)
    }

    /// Fraction of this rectangle covered by `other` (0.0 to 1.0).
    ///
    /// A degenerate (zero-area) rectangle counts as fully covered when its
    /// origin lies inside `other`.
    pub fn coverage_by(&self, other: &Rect) -> f32 {
        let area = self.area();
        if area <= f32::EPSILON {
            let inside = self.origin.x >= other.origin.x
                && self.origin.x <= other.origin.x + other.size.x
                && self.origin.y >= other.origin.y
                && self.origin.y <= other.origin.y + other.size.y;
            return if inside { 1.0 } else { 0.0 };
        }
        self.intersection_area(other) / area
    }
}

/// Entrance animation variants carried by tagged elements.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevealVariant {
    #[default]
    Up,
    Left,
    Right,
    Scale,
    Fade,
    Pop,
    SoftSlide,
}

impl RevealVariant {
    /// Parses a markup attribute value. Unknown or empty values fall back
    /// to the default variant.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "left" => Self::Left,
            "right" => Self::Right,
            "scale" => Self::Scale,
            "fade" => Self::Fade,
            "pop" => Self::Pop,
            "soft-slide" => Self::SoftSlide,
            _ => Self::Up,
        }
    }
}

/// The reveal contract parsed from element attributes.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevealAttrs {
    pub variant: RevealVariant,
    /// Delay before the entrance animation, in seconds.
    pub delay: f64,
}

impl RevealAttrs {
    pub fn new(variant: RevealVariant) -> Self {
        Self {
            variant,
            delay: 0.0,
        }
    }

    /// Builds attributes from raw markup strings.
    ///
    /// The variant attribute may be empty (plain tag means `up`); invalid
    /// delay values coerce to 0.
    pub fn from_markup(variant: Option<&str>, delay: Option<&str>) -> Self {
        let variant = variant.map(RevealVariant::parse).unwrap_or_default();
        let delay = delay
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d >= 0.0)
            .unwrap_or(0.0);
        Self { variant, delay }
    }
}

/// An animatable style property.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StyleProp {
    Opacity,
    TranslateX,
    TranslateY,
    Scale,
    RotationY,
    Blur,
}

/// Sparse inline style state for one stage node.
///
/// `None` means the property is not set inline and the embedder's
/// stylesheet value applies. Clearing a property is therefore distinct
/// from setting it to a neutral value.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct InlineStyle {
    pub opacity: Option<f32>,
    pub translate_x: Option<f32>,
    pub translate_y: Option<f32>,
    pub scale: Option<f32>,
    pub rotation_y: Option<f32>,
    pub blur: Option<f32>,
    pub visible: Option<bool>,
    pub z_index: Option<i32>,
}

impl InlineStyle {
    pub fn set(&mut self, prop: StyleProp, value: f32) {
        match prop {
            StyleProp::Opacity => self.opacity = Some(value),
            StyleProp::TranslateX => self.translate_x = Some(value),
            StyleProp::TranslateY => self.translate_y = Some(value),
            StyleProp::Scale => self.scale = Some(value),
            StyleProp::RotationY => self.rotation_y = Some(value),
            StyleProp::Blur => self.blur = Some(value),
        }
    }

    pub fn get(&self, prop: StyleProp) -> Option<f32> {
        match prop {
            StyleProp::Opacity => self.opacity,
            StyleProp::TranslateX => self.translate_x,
            StyleProp::TranslateY => self.translate_y,
            StyleProp::Scale => self.scale,
            StyleProp::RotationY => self.rotation_y,
            StyleProp::Blur => self.blur,
        }
    }

    /// Effective value of a property, falling back to the stylesheet
    /// neutral (opacity 1, scale 1, everything else 0).
    pub fn effective(&self, prop: StyleProp) -> f32 {
        self.get(prop).unwrap_or(match prop {
            StyleProp::Opacity | StyleProp::Scale => 1.0,
            _ => 0.0,
        })
    }

    /// Removes every inline property.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Removes the transient animation properties (transform, opacity,
    /// filter, visibility) while leaving stacking state alone.
    pub fn clear_transient(&mut self) {
        self.opacity = None;
        self.translate_x = None;
        self.translate_y = None;
        self.scale = None;
        self.rotation_y = None;
        self.blur = None;
        self.visible = None;
    }

    pub fn is_unset(&self) -> bool {
        *self == Self::default()
    }
}

/// Viewport width classes used for recipe and tuning selection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ViewportClass {
    Compact,
    Wide,
}

impl ViewportClass {
    pub fn from_width(width: f32, compact_breakpoint: f32) -> Self {
        if width < compact_breakpoint {
            Self::Compact
        } else {
            Self::Wide
        }
    }
}

/// Lifecycle phases for session-owned singletons.
///
/// Transitions are checked within a single event turn; there is no
/// concurrent access.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Active,
    TornDown,
}
