//! Page Session Tests
//!
//! The full navigation lifecycle: init, frame loop, input routing, and
//! teardown ordering across page swaps.

use scrollstage::reveal::VISIBLE_CLASS;
use scrollstage::session::{PageEvent, PageSession};
use scrollstage::stage::{Stage, StageNode};
use scrollstage::types::{NodeId, Rect, RevealAttrs, RevealVariant};
use scrollstage::{FixedViewport, ViewportProvider};
use std::sync::Arc;

const FRAME: f64 = 1.0 / 60.0;

fn reveal_stage() -> (Stage, NodeId, NodeId) {
    let mut stage = Stage::new();
    let hero = stage.add_node(StageNode::new().with_reveal(RevealAttrs::new(RevealVariant::Up)));
    let below = stage.add_node(
        StageNode::new().with_reveal(RevealAttrs::new(RevealVariant::SoftSlide)),
    );
    (stage, hero, below)
}

/// Runs the session frame loop, mirroring the engine's scroll position
/// back into the provider the way a rendering embedder would.
fn run(
    session: &mut PageSession,
    stage: &mut Stage,
    provider: &FixedViewport,
    start: f64,
    frames: usize,
) -> f64 {
    let mut now = start;
    for _ in 0..frames {
        session.tick(stage, now);
        provider.set_scroll(session.scroll_position());
        now += FRAME;
    }
    now
}

#[test]
fn full_navigation_cycle() {
    let (mut stage, hero, below) = reveal_stage();
    let provider = Arc::new(FixedViewport::new(1280.0, 800.0, 4000.0));
    provider.place(hero, Rect::new(0.0, 100.0, 600.0, 200.0));
    provider.place(below, Rect::new(0.0, 1500.0, 600.0, 200.0));

    let mut session =
        PageSession::new(Arc::clone(&provider) as Arc<dyn ViewportProvider>);

    session.dispatch(&mut stage, PageEvent::Ready { route: "/".into() });
    assert!(session.smooth_scroll.is_active());
    assert_eq!(session.ticker.subscriber_count(), 1);

    // Above-the-fold element reveals; the below-fold one waits.
    let now = run(&mut session, &mut stage, &provider, 0.0, 90);
    assert!(stage.node(hero).unwrap().classes.contains(VISIBLE_CLASS));
    assert!(!stage.node(below).unwrap().classes.contains(VISIBLE_CLASS));
    assert_eq!(session.reveal.visited_count(), 1);

    // Scroll down via the virtual engine until the second element enters.
    session.smooth_scroll.scroll_to(1200.0);
    let now = run(&mut session, &mut stage, &provider, now, 180);
    assert!(stage.node(below).unwrap().classes.contains(VISIBLE_CLASS));
    assert_eq!(session.reveal.visited_count(), 2);

    // Navigation teardown: detection gone, engine unbound.
    session.dispatch(&mut stage, PageEvent::BeforeSwap);
    assert_eq!(session.reveal.visited_count(), 0);
    assert_eq!(session.reveal.observed_count(), 0);
    assert_eq!(session.ticker.subscriber_count(), 0);
    assert!(!session.smooth_scroll.is_active());

    // A tick between teardown and the next page must be harmless.
    session.tick(&mut stage, now + FRAME);

    // Next page: everything re-arms from scratch.
    session.dispatch(&mut stage, PageEvent::Ready { route: "/about".into() });
    assert!(session.smooth_scroll.is_active());
    assert_eq!(session.reveal.visited_count(), 0);
    assert_eq!(session.reveal.observed_count(), 2);
    assert_eq!(stage.node(hero).unwrap().style.opacity, Some(0.0));
}

#[test]
fn scroll_position_prefers_virtual_engine() {
    let mut stage = Stage::new();
    let provider = Arc::new(FixedViewport::new(1280.0, 800.0, 4000.0));
    let mut session =
        PageSession::new(Arc::clone(&provider) as Arc<dyn ViewportProvider>);

    session.dispatch(&mut stage, PageEvent::Ready { route: "/".into() });

    // Native offset moves, but the virtual engine is authoritative.
    provider.set_scroll(300.0);
    assert_eq!(session.scroll_position(), 0.0);

    session.dispatch(&mut stage, PageEvent::BeforeSwap);
    assert_eq!(session.scroll_position(), 300.0);
}

#[test]
fn narrow_viewport_uses_native_scroll() {
    let (mut stage, hero, _below) = reveal_stage();
    let provider = Arc::new(FixedViewport::new(900.0, 800.0, 4000.0));
    provider.place(hero, Rect::new(0.0, 100.0, 600.0, 200.0));

    let mut session =
        PageSession::new(Arc::clone(&provider) as Arc<dyn ViewportProvider>);
    session.dispatch(&mut stage, PageEvent::Ready { route: "/".into() });

    assert!(!session.smooth_scroll.is_active());
    assert_eq!(session.ticker.subscriber_count(), 0);

    // Wheel input is a no-op for the engine; native scrolling feeds the
    // provider directly and reveals still work.
    session.on_wheel(250.0);
    assert_eq!(session.scroll_position(), 0.0);

    run(&mut session, &mut stage, &provider, 0.0, 90);
    assert!(stage.node(hero).unwrap().classes.contains(VISIBLE_CLASS));
}

#[test]
fn wheel_input_retargets_virtual_scroll() {
    let mut stage = Stage::new();
    let provider = Arc::new(FixedViewport::new(1280.0, 800.0, 4000.0));
    let mut session =
        PageSession::new(Arc::clone(&provider) as Arc<dyn ViewportProvider>);

    session.dispatch(&mut stage, PageEvent::Ready { route: "/".into() });
    session.on_wheel(480.0);
    assert_eq!(session.smooth_scroll.target(), Some(480.0));

    run(&mut session, &mut stage, &provider, 0.0, 120);
    assert!((session.scroll_position() - 480.0).abs() < 1.0);
}

#[test]
fn anchor_click_routes_to_virtual_engine() {
    let mut stage = Stage::new();
    let header = stage.add_node(StageNode::new().with_key("header"));
    let target = stage.add_node(StageNode::new().with_key("pricing"));

    let provider = Arc::new(FixedViewport::new(1280.0, 800.0, 4000.0));
    provider.place(header, Rect::new(0.0, 0.0, 1280.0, 64.0));
    provider.place(target, Rect::new(0.0, 2000.0, 1280.0, 600.0));

    let mut session =
        PageSession::new(Arc::clone(&provider) as Arc<dyn ViewportProvider>);
    session.dispatch(&mut stage, PageEvent::Ready { route: "/".into() });

    let offset = session.anchor_click(&stage, "pricing").unwrap();
    assert_eq!(offset, 1936.0);
    assert_eq!(session.smooth_scroll.target(), Some(1936.0));

    assert!(session.anchor_click(&stage, "missing").is_none());
}

#[test]
fn modal_pause_resumes_cleanly() {
    let mut stage = Stage::new();
    let provider = Arc::new(FixedViewport::new(1280.0, 800.0, 4000.0));
    let mut session =
        PageSession::new(Arc::clone(&provider) as Arc<dyn ViewportProvider>);

    session.dispatch(&mut stage, PageEvent::Ready { route: "/".into() });
    session.on_wheel(800.0);
    let now = run(&mut session, &mut stage, &provider, 0.0, 30);
    let paused_at = session.scroll_position();

    session.stop_scrolling();
    let now = run(&mut session, &mut stage, &provider, now, 30);
    assert_eq!(session.scroll_position(), paused_at);

    session.start_scrolling();
    run(&mut session, &mut stage, &provider, now, 30);
    assert!(session.scroll_position() > paused_at);
}
