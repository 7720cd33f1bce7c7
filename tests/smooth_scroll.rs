//! Smooth Scroll Lifecycle Tests
//!
//! Viewport gating, the one-live-instance invariant, and teardown
//! ordering.

use scrollstage::smooth_scroll::SmoothScrollLifecycle;
use scrollstage::ticker::Ticker;
use scrollstage::tokens::ScrollTokens;
use scrollstage::types::LifecycleState;
use scrollstage::FixedViewport;

fn lifecycle() -> SmoothScrollLifecycle {
    SmoothScrollLifecycle::new(ScrollTokens::default())
}

#[test]
fn gated_below_width_threshold() {
    let provider = FixedViewport::new(1023.0, 800.0, 8000.0);
    let mut ticker = Ticker::new();
    let mut scroll = lifecycle();

    scroll.init(&mut ticker, &provider);
    assert_eq!(scroll.state(), LifecycleState::Uninitialized);
    assert!(!scroll.is_active());
    assert_eq!(ticker.subscriber_count(), 0);
    assert!(scroll.position().is_none());
}

#[test]
fn activates_at_width_threshold() {
    let provider = FixedViewport::new(1024.0, 800.0, 8000.0);
    let mut ticker = Ticker::new();
    let mut scroll = lifecycle();

    scroll.init(&mut ticker, &provider);
    assert_eq!(scroll.state(), LifecycleState::Active);
    assert_eq!(ticker.subscriber_count(), 1);
    assert_eq!(scroll.position(), Some(0.0));
}

#[test]
fn second_init_is_a_no_op() {
    let provider = FixedViewport::new(1280.0, 800.0, 8000.0);
    let mut ticker = Ticker::new();
    let mut scroll = lifecycle();

    scroll.init(&mut ticker, &provider);
    scroll.scroll_to(500.0);
    ticker.tick(0.0);
    ticker.tick(0.2);
    let position = scroll.position().unwrap();
    assert!(position > 0.0);

    // A second init must not create a second engine or reset the first.
    scroll.init(&mut ticker, &provider);
    assert_eq!(ticker.subscriber_count(), 1);
    assert_eq!(scroll.position(), Some(position));
}

#[test]
fn destroy_then_tick_has_no_effect() {
    let provider = FixedViewport::new(1280.0, 800.0, 8000.0);
    let mut ticker = Ticker::new();
    let mut scroll = lifecycle();

    scroll.init(&mut ticker, &provider);
    scroll.scroll_to(1000.0);
    ticker.tick(0.0);

    scroll.destroy(&mut ticker);
    assert_eq!(scroll.state(), LifecycleState::TornDown);
    assert_eq!(ticker.subscriber_count(), 0);
    assert!(scroll.position().is_none());

    // The frame callback was unsubscribed before disposal: a tick right
    // after destroy observes nothing and mutates nothing.
    ticker.tick(0.016);
    assert!(scroll.position().is_none());
    assert_eq!(scroll.state(), LifecycleState::TornDown);
}

#[test]
fn recreated_on_next_navigation() {
    let provider = FixedViewport::new(1280.0, 800.0, 8000.0);
    let mut ticker = Ticker::new();
    let mut scroll = lifecycle();

    scroll.init(&mut ticker, &provider);
    scroll.destroy(&mut ticker);

    scroll.init(&mut ticker, &provider);
    assert_eq!(scroll.state(), LifecycleState::Active);
    assert_eq!(ticker.subscriber_count(), 1);
}

#[test]
fn stop_and_start_preserve_state() {
    let provider = FixedViewport::new(1280.0, 800.0, 8000.0);
    let mut ticker = Ticker::new();
    let mut scroll = lifecycle();

    scroll.init(&mut ticker, &provider);
    scroll.scroll_to(2000.0);
    ticker.tick(0.0);
    ticker.tick(0.1);
    let frozen = scroll.position().unwrap();

    // Stopped for a modal: frames pass, position does not.
    scroll.stop();
    ticker.tick(0.5);
    assert_eq!(scroll.position(), Some(frozen));
    assert_eq!(scroll.target(), Some(2000.0));

    scroll.start();
    ticker.tick(0.6);
    assert!(scroll.position().unwrap() > frozen);
}

#[test]
fn init_configures_lag_smoothing() {
    let provider = FixedViewport::new(1280.0, 800.0, 8000.0);
    let mut ticker = Ticker::new();
    let mut scroll = lifecycle();

    scroll.init(&mut ticker, &provider);
    ticker.tick(0.0);
    // A 600ms stall is clamped to the minimum frame time.
    let dt = ticker.tick(0.6);
    assert!((dt - 0.033).abs() < 1e-9);
}
