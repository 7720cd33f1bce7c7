//! # Smooth Scroll Module
//!
//! The virtual smooth-scroll engine and its lifecycle wrapper.
//!
//! `VirtualScroll` replaces native scrolling with an eased position that
//! chases a target; `SmoothScrollLifecycle` owns exactly one engine at a
//! time and manages its ticker subscription across page navigations.
//! Teardown ordering is load-bearing: the frame callback is removed from
//! the ticker before the engine is dropped, so no frame can observe a
//! disposed engine.

use crate::ticker::{LagSmoothing, Ticker, TickerHandle};
use crate::tokens::ScrollTokens;
use crate::types::LifecycleState;
use crate::ViewportProvider;
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument, warn};

/// Exponential ease used for scroll segments: fast start, long settle.
fn scroll_ease(t: f64) -> f64 {
    (1.001 - 2f64.powf(-10.0 * t)).min(1.0)
}

/// One virtual-scroll session: an eased position chasing a target.
pub struct VirtualScroll {
    current: f64,
    target: f64,
    segment_from: f64,
    segment_elapsed: f64,
    duration: f64,
    wheel_multiplier: f64,
    /// Maximum scrollable offset (content height minus viewport).
    limit: f64,
    stopped: bool,
}

impl VirtualScroll {
    pub fn new(tokens: &ScrollTokens, start: f64, limit: f64) -> Self {
        Self {
            current: start,
            target: start,
            segment_from: start,
            segment_elapsed: 0.0,
            duration: tokens.duration,
            wheel_multiplier: tokens.wheel_multiplier,
            limit: limit.max(0.0),
            stopped: false,
        }
    }

    pub fn position(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Starts an eased segment toward `target`.
    pub fn scroll_to(&mut self, target: f64) {
        self.target = target.clamp(0.0, self.limit);
        self.segment_from = self.current;
        self.segment_elapsed = 0.0;
    }

    /// Accumulates wheel input into the current target.
    pub fn add_wheel_delta(&mut self, delta: f64) {
        if self.stopped {
            return;
        }
        self.scroll_to(self.target + delta * self.wheel_multiplier);
    }

    /// Pauses without losing position or target.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn start(&mut self) {
        self.stopped = false;
    }

    /// Frame callback: advances the eased position by `dt` seconds.
    pub fn raf(&mut self, dt: f64) {
        if self.stopped || (self.current - self.target).abs() < 1e-6 {
            return;
        }
        self.segment_elapsed += dt;
        let t = (self.segment_elapsed / self.duration).min(1.0);
        self.current = self.segment_from + (self.target - self.segment_from) * scroll_ease(t);
        if t >= 1.0 {
            self.current = self.target;
        }
    }
}

/// Lifecycle wrapper enforcing the one-live-instance invariant.
pub struct SmoothScrollLifecycle {
    tokens: ScrollTokens,
    state: LifecycleState,
    engine: Option<Arc<Mutex<VirtualScroll>>>,
    subscription: Option<TickerHandle>,
}

impl SmoothScrollLifecycle {
    pub fn new(tokens: ScrollTokens) -> Self {
        Self {
            tokens,
            state: LifecycleState::Uninitialized,
            engine: None,
            subscription: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == LifecycleState::Active
    }

    /// Creates the engine and binds it to the shared ticker.
    ///
    /// Touch-first viewports (below the configured width) keep native
    /// scrolling. A second call while an engine is live warns and no-ops.
    #[instrument(skip_all)]
    pub fn init(&mut self, ticker: &mut Ticker, provider: &dyn ViewportProvider) {
        let width = provider.viewport_size().x;
        if width < self.tokens.min_width {
            debug!(width, "viewport below smooth-scroll threshold, keeping native scroll");
            return;
        }

        if self.state == LifecycleState::Active {
            warn!("smooth scroll already initialized, skipping");
            return;
        }

        let viewport_height = provider.viewport_size().y as f64;
        let limit = provider.content_height() as f64 - viewport_height;
        let engine = Arc::new(Mutex::new(VirtualScroll::new(
            &self.tokens,
            provider.scroll_offset(),
            limit,
        )));

        let frame_engine = Arc::clone(&engine);
        let handle = ticker.add(Box::new(move |ctx| {
            if let Ok(mut engine) = frame_engine.lock() {
                engine.raf(ctx.dt);
            }
        }));

        ticker.set_lag_smoothing(Some(LagSmoothing {
            catch_up_cap: self.tokens.lag_catch_up,
            min_frame: self.tokens.lag_min_frame,
        }));

        self.engine = Some(engine);
        self.subscription = Some(handle);
        self.state = LifecycleState::Active;
    }

    /// Unbinds from the ticker, then disposes the engine.
    #[instrument(skip_all)]
    pub fn destroy(&mut self, ticker: &mut Ticker) {
        if self.engine.is_none() {
            return;
        }

        // Unsubscribe before dropping the engine so a frame can never
        // fire against a disposed instance.
        if let Some(handle) = self.subscription.take() {
            ticker.remove(handle);
        }
        self.engine = None;
        self.state = LifecycleState::TornDown;
    }

    /// Pauses scrolling (modal overlays). State is retained.
    pub fn stop(&mut self) {
        if let Some(engine) = &self.engine {
            if let Ok(mut engine) = engine.lock() {
                engine.stop();
            }
        }
    }

    pub fn start(&mut self) {
        if let Some(engine) = &self.engine {
            if let Ok(mut engine) = engine.lock() {
                engine.start();
            }
        }
    }

    /// Current eased position, when an engine is live.
    pub fn position(&self) -> Option<f64> {
        self.engine
            .as_ref()
            .and_then(|e| e.lock().ok())
            .map(|e| e.position())
    }

    /// Current scroll target, when an engine is live.
    pub fn target(&self) -> Option<f64> {
        self.engine
            .as_ref()
            .and_then(|e| e.lock().ok())
            .map(|e| e.target())
    }

    pub fn scroll_to(&mut self, target: f64) {
        if let Some(engine) = &self.engine {
            if let Ok(mut engine) = engine.lock() {
                engine.scroll_to(target);
            }
        }
    }

    pub fn add_wheel_delta(&mut self, delta: f64) {
        if let Some(engine) = &self.engine {
            if let Ok(mut engine) = engine.lock() {
                engine.add_wheel_delta(delta);
            }
        }
    }
}
