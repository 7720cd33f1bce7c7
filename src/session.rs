//! # Session Module
//!
//! The page-session controller: one explicit lifecycle object that owns
//! every animation subsystem for the lifetime of the page, so there is no
//! hidden module state. Navigation lifecycle events drive init/teardown;
//! `tick` is the single cooperative entry point that advances everything
//! else.

use crate::narrative::{self, NarrativeRecipe};
use crate::reveal::{AnchorScroller, RevealEngine};
use crate::smooth_scroll::SmoothScrollLifecycle;
use crate::stage::Stage;
use crate::ticker::Ticker;
use crate::timeline::ScrubRegistry;
use crate::tokens::MotionTokens;
use crate::ViewportProvider;
use std::sync::Arc;
use tracing::debug;

/// Navigation lifecycle events consumed by the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageEvent {
    /// The page (or the next page, after a client-side swap) is ready.
    Ready { route: String },
    /// The current page is about to be swapped out.
    BeforeSwap,
}

/// Owns and coordinates the scroll-driven animation subsystems.
pub struct PageSession {
    provider: Arc<dyn ViewportProvider>,
    tokens: MotionTokens,
    recipe: NarrativeRecipe,
    pub ticker: Ticker,
    pub smooth_scroll: SmoothScrollLifecycle,
    pub reveal: RevealEngine,
    pub scrubs: ScrubRegistry,
    pub anchors: AnchorScroller,
}

impl PageSession {
    pub fn new(provider: Arc<dyn ViewportProvider>) -> Self {
        Self::with_tokens(provider, MotionTokens::default())
    }

    pub fn with_tokens(provider: Arc<dyn ViewportProvider>, tokens: MotionTokens) -> Self {
        Self {
            smooth_scroll: SmoothScrollLifecycle::new(tokens.scroll.clone()),
            reveal: RevealEngine::new(tokens.reveal.clone()),
            provider,
            tokens,
            recipe: NarrativeRecipe::default(),
            ticker: Ticker::new(),
            scrubs: ScrubRegistry::new(),
            anchors: AnchorScroller::new(),
        }
    }

    /// Selects the narrative timeline recipe for subsequent page loads.
    pub fn with_recipe(mut self, recipe: NarrativeRecipe) -> Self {
        self.recipe = recipe;
        self
    }

    /// Feeds a navigation lifecycle event into the session.
    pub fn dispatch(&mut self, stage: &mut Stage, event: PageEvent) {
        match event {
            PageEvent::Ready { route } => self.on_ready(stage, &route),
            PageEvent::BeforeSwap => self.on_before_swap(),
        }
    }

    fn on_ready(&mut self, stage: &mut Stage, route: &str) {
        debug!(route, "page ready");
        self.smooth_scroll.init(&mut self.ticker, self.provider.as_ref());
        self.reveal.init_scroll_animations(stage);
        narrative::init(
            &mut self.scrubs,
            stage,
            self.provider.as_ref(),
            &self.tokens.narrative,
            &self.tokens.breakpoints,
            self.recipe,
            route,
        );
        self.anchors.install();
    }

    fn on_before_swap(&mut self) {
        debug!("page teardown");
        // Detection goes first so nothing can trigger against nodes that
        // are about to disappear; the frame callback is unbound before
        // the scroll engine is disposed.
        self.reveal.cleanup_animations();
        self.smooth_scroll.destroy(&mut self.ticker);
    }

    /// Current scroll position from whichever source is active: the
    /// virtual engine when live, the embedder's native offset otherwise.
    pub fn scroll_position(&self) -> f64 {
        self.smooth_scroll
            .position()
            .unwrap_or_else(|| self.provider.scroll_offset())
    }

    /// Advances the whole session to absolute time `now` (seconds).
    pub fn tick(&mut self, stage: &mut Stage, now: f64) {
        let dt = self.ticker.tick(now);
        let scroll = self.scroll_position();
        self.reveal
            .tick(stage, self.provider.as_ref(), scroll, dt);
        self.scrubs.on_scroll_all(stage, scroll);
        self.scrubs.tick_all(stage, dt);
    }

    /// Wheel input. Consumed by the virtual engine when it is active;
    /// otherwise native scrolling already moved the page and the next
    /// tick picks the new offset up from the provider.
    pub fn on_wheel(&mut self, delta: f64) {
        if self.smooth_scroll.is_active() {
            self.smooth_scroll.add_wheel_delta(delta);
        }
    }

    /// Handles a click on an in-page anchor link. Returns the resolved
    /// scroll offset (document offset minus header height), or `None`
    /// when the target does not exist. When the virtual engine is active
    /// the session starts the eased scroll itself; the embedder performs
    /// the native scroll otherwise.
    pub fn anchor_click(&mut self, stage: &Stage, target_key: &str) -> Option<f64> {
        let offset = self
            .anchors
            .resolve(stage, self.provider.as_ref(), target_key)?;
        if self.smooth_scroll.is_active() {
            self.smooth_scroll.scroll_to(offset);
        }
        Some(offset)
    }

    /// Pauses scrolling while a modal overlay is up.
    pub fn stop_scrolling(&mut self) {
        self.smooth_scroll.stop();
    }

    pub fn start_scrolling(&mut self) {
        self.smooth_scroll.start();
    }

    pub fn provider(&self) -> &dyn ViewportProvider {
        self.provider.as_ref()
    }

    pub fn tokens(&self) -> &MotionTokens {
        &self.tokens
    }
}
