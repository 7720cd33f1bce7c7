//! # Scrollstage
//!
//! `scrollstage` is a headless scroll-driven animation orchestration engine
//! for content sites: one-shot viewport reveals, a pinned scroll-scrubbed
//! narrative sequence, and a virtual smooth-scroll engine, coordinated
//! across client-side page navigations without leaking detectors or
//! frame subscriptions.
//!
//! The engine never touches a real document. The embedder mirrors its
//! markup into a [`stage::Stage`], implements [`ViewportProvider`] for
//! geometry and scroll queries, and renders back the inline styles and
//! classes the engine writes. That seam keeps every state machine in the
//! crate testable without a rendering surface.
//!
//! ## Core Features
//!
//! *   **Reveals**: variant-tagged elements armed with a hidden state at
//!     scan time and played exactly once when they enter the viewport.
//! *   **Scrubbing**: timelines sampled as a pure function of scroll
//!     position, with pinned regions and optional catch-up smoothing.
//! *   **Virtual scroll**: an eased scroll position driven from a shared
//!     frame ticker, gated to wide viewports, with strict
//!     unsubscribe-before-dispose teardown.
//! *   **Lifecycle**: a single [`session::PageSession`] object owns all of
//!     the above and consumes page-ready / before-swap events.
//!
//! ## Usage
//!
//! ```rust
//! use scrollstage::{session::{PageEvent, PageSession}, stage::Stage, FixedViewport};
//! use std::sync::Arc;
//!
//! let provider = Arc::new(FixedViewport::new(1280.0, 800.0, 4000.0));
//! let mut stage = Stage::new();
//! let mut session = PageSession::new(provider);
//!
//! session.dispatch(&mut stage, PageEvent::Ready { route: "/".into() });
//! session.tick(&mut stage, 0.0);
//! ```

/// The element arena the engine animates.
pub mod stage;

/// Shared data structures used across the engine.
pub mod types;

/// Animation primitives: `Animated<T>` and easing functions.
pub mod animation;

/// The shared animation-frame ticker.
pub mod ticker;

/// Scrubbed timelines, pin math, and the timeline registry.
pub mod timeline;

/// One-shot viewport reveal animations.
pub mod reveal;

/// The pinned narrative word sequence.
pub mod narrative;

/// The virtual smooth-scroll engine and its lifecycle.
pub mod smooth_scroll;

/// The page-session controller.
pub mod session;

/// Motion design tokens.
pub mod tokens;

pub mod errors;

pub use errors::StageError;
pub use session::{PageEvent, PageSession};

use glam::Vec2;
use std::collections::HashMap;
use std::sync::Mutex;
use types::{NodeId, Rect};

/// A trait for abstracting viewport geometry and scroll state.
///
/// The control logic in this crate never queries a document directly;
/// everything it needs to know about the rendered page comes through this
/// interface, which keeps the reveal and narrative state machines
/// unit-testable without a real rendering surface.
pub trait ViewportProvider: Send + Sync {
    /// Current viewport width and height in pixels.
    fn viewport_size(&self) -> Vec2;

    /// The embedder's native scroll offset.
    fn scroll_offset(&self) -> f64;

    /// Total scrollable content height. Defaults to the viewport height
    /// (nothing to scroll).
    fn content_height(&self) -> f32 {
        self.viewport_size().y
    }

    /// Viewport-relative bounding rectangle of an element, or `None` when
    /// the element has no rendered box.
    fn element_rect(&self, id: NodeId) -> Option<Rect>;

    /// Absolute document offset of an element's top edge.
    fn document_offset(&self, id: NodeId) -> Option<f64>;
}

/// The default `ViewportProvider`: a fixed viewport over a set of
/// document-space element boxes.
///
/// Element rectangles are stored in document space and translated by the
/// current scroll offset on query, so rect and offset answers can never
/// disagree. Used by the preview binary and throughout the test suite.
pub struct FixedViewport {
    size: Vec2,
    content_height: f32,
    scroll: Mutex<f64>,
    rects: Mutex<HashMap<NodeId, Rect>>,
}

impl FixedViewport {
    pub fn new(width: f32, height: f32, content_height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            content_height: content_height.max(height),
            scroll: Mutex::new(0.0),
            rects: Mutex::new(HashMap::new()),
        }
    }

    /// Places an element at a document-space rectangle.
    pub fn place(&self, id: NodeId, rect: Rect) {
        self.rects.lock().unwrap().insert(id, rect);
    }

    pub fn remove(&self, id: NodeId) {
        self.rects.lock().unwrap().remove(&id);
    }

    /// Moves the native scroll offset.
    pub fn set_scroll(&self, offset: f64) {
        *self.scroll.lock().unwrap() = offset;
    }
}

impl ViewportProvider for FixedViewport {
    fn viewport_size(&self) -> Vec2 {
        self.size
    }

    fn scroll_offset(&self) -> f64 {
        *self.scroll.lock().unwrap()
    }

    fn content_height(&self) -> f32 {
        self.content_height
    }

    fn element_rect(&self, id: NodeId) -> Option<Rect> {
        let scroll = self.scroll_offset() as f32;
        self.rects.lock().unwrap().get(&id).map(|doc| {
            Rect::new(
                doc.origin.x,
                doc.origin.y - scroll,
                doc.size.x,
                doc.size.y,
            )
        })
    }

    fn document_offset(&self, id: NodeId) -> Option<f64> {
        self.rects
            .lock()
            .unwrap()
            .get(&id)
            .map(|doc| doc.origin.y as f64)
    }
}
