use anyhow::{Context, Result};
use clap::Parser;
use scrollstage::session::{PageEvent, PageSession};
use scrollstage::stage::{Stage, StageManifest};
use scrollstage::types::Rect;
use scrollstage::FixedViewport;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Simulates a scroll session over a stage manifest and reports the final
/// element states. Useful for checking timings and recipes without a
/// browser in the loop.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a stage manifest (JSON)
    #[arg(value_name = "MANIFEST")]
    manifest: PathBuf,

    /// Route to simulate
    #[arg(long, default_value = "/")]
    route: String,

    /// Viewport size as WIDTHxHEIGHT
    #[arg(long, default_value = "1280x800")]
    viewport: String,

    /// Total scrollable content height
    #[arg(long, default_value_t = 6000.0)]
    content_height: f32,

    /// Number of simulated frames (60 per second)
    #[arg(long, default_value_t = 600)]
    frames: u32,
}

fn parse_viewport(raw: &str) -> Result<(f32, f32)> {
    let (w, h) = raw
        .split_once('x')
        .with_context(|| format!("invalid viewport '{raw}', expected WIDTHxHEIGHT"))?;
    Ok((w.trim().parse()?, h.trim().parse()?))
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let (width, height) = parse_viewport(&cli.viewport)?;

    let json = fs::read_to_string(&cli.manifest)
        .with_context(|| format!("reading {:?}", cli.manifest))?;
    let manifest: StageManifest = serde_json::from_str(&json)?;
    let stage_ref = Stage::from_manifest(&manifest);

    let provider = Arc::new(FixedViewport::new(width, height, cli.content_height));

    // Seed geometry from the manifest rects, matching nodes up by
    // traversal order (Stage::from_manifest inserts depth-first).
    let mut rects = Vec::new();
    for entry in &manifest.nodes {
        entry.walk(&mut |node| rects.push(node.rect));
    }
    for ((id, _), rect) in stage_ref.iter().zip(rects) {
        if let Some([x, y, w, h]) = rect {
            provider.place(id, Rect::new(x, y, w, h));
        }
    }

    let mut stage = stage_ref;
    let mut session = PageSession::new(Arc::clone(&provider) as Arc<dyn scrollstage::ViewportProvider>);

    session.dispatch(&mut stage, PageEvent::Ready { route: cli.route });
    info!(
        nodes = stage.len(),
        smooth = session.smooth_scroll.is_active(),
        "session started"
    );

    // Sweep the page top to bottom over the simulated frames.
    let max_scroll = (cli.content_height - height).max(0.0) as f64;
    for frame in 0..cli.frames {
        let now = frame as f64 / 60.0;
        let target = max_scroll * frame as f64 / cli.frames.max(1) as f64;
        if session.smooth_scroll.is_active() {
            session.smooth_scroll.scroll_to(target);
        } else {
            provider.set_scroll(target);
        }
        session.tick(&mut stage, now);
        // Mirror the virtual position back so element rects stay honest.
        provider.set_scroll(session.scroll_position());
    }

    for (id, node) in stage.iter() {
        let key = node.key.as_deref().unwrap_or("-");
        let classes: Vec<&str> = node.classes.iter().collect();
        info!(
            id,
            key,
            classes = classes.join(" "),
            opacity = node.style.opacity,
            "final state"
        );
    }
    info!(
        revealed = session.reveal.visited_count(),
        still_observed = session.reveal.observed_count(),
        "sweep complete"
    );

    Ok(())
}
