//! # Ticker Module
//!
//! The shared animation-frame ticker.
//!
//! Everything time-driven in the engine hangs off one ticker: the
//! virtual-scroll engine subscribes a frame callback, and the session
//! advances reveal tweens and scrub smoothing with the delta the ticker
//! computes. The ticker applies a bounded lag-smoothing policy so a
//! dropped frame does not translate into a visible jump.

/// Per-frame timing information passed to subscribers.
#[derive(Copy, Clone, Debug)]
pub struct TickContext {
    /// Absolute time of this frame, in seconds.
    pub time: f64,
    /// Delta since the previous frame, after lag smoothing.
    pub dt: f64,
}

/// Handle identifying one ticker subscription.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TickerHandle(u64);

/// Lag-smoothing policy: when a frame arrives later than `catch_up_cap`
/// seconds after the previous one, the reported delta collapses to
/// `min_frame` instead of forcing animations to jump the whole gap.
#[derive(Copy, Clone, Debug)]
pub struct LagSmoothing {
    pub catch_up_cap: f64,
    pub min_frame: f64,
}

type FrameCallback = Box<dyn FnMut(TickContext)>;

/// The shared frame ticker.
#[derive(Default)]
pub struct Ticker {
    subscribers: Vec<(u64, FrameCallback)>,
    next_id: u64,
    last_time: Option<f64>,
    lag_smoothing: Option<LagSmoothing>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a per-frame callback and returns its handle.
    pub fn add(&mut self, callback: FrameCallback) -> TickerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, callback));
        TickerHandle(id)
    }

    /// Removes a subscription. Returns false if the handle was already gone.
    pub fn remove(&mut self, handle: TickerHandle) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(id, _)| *id != handle.0);
        self.subscribers.len() != before
    }

    pub fn set_lag_smoothing(&mut self, policy: Option<LagSmoothing>) {
        self.lag_smoothing = policy;
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Advances the ticker to absolute time `now` (seconds), dispatching
    /// every subscriber. Returns the smoothed frame delta.
    pub fn tick(&mut self, now: f64) -> f64 {
        let raw_dt = match self.last_time {
            Some(last) => (now - last).max(0.0),
            None => 0.0,
        };
        self.last_time = Some(now);

        let dt = match self.lag_smoothing {
            Some(policy) if raw_dt > policy.catch_up_cap => policy.min_frame,
            _ => raw_dt,
        };

        let ctx = TickContext { time: now, dt };
        for (_, callback) in self.subscribers.iter_mut() {
            callback(ctx);
        }
        dt
    }
}
