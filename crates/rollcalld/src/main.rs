use anyhow::{Context, Result};
use rollcall_core::{AlertThrottle, Gallery, GridExtractor};
use rollcall_ledger::AttendanceLedger;
use tracing_subscriber::EnvFilter;

mod announcer;
mod capture;
mod config;
mod display;
mod pipeline;
mod replay;
mod speech;

use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("rollcalld starting");

    let config = Config::from_env();

    // Fail fast: both stores must be usable before any frame is pulled.
    let ledger = AttendanceLedger::open(&config.ledger_path).with_context(|| {
        format!("opening attendance store {}", config.ledger_path.display())
    })?;

    let gallery = Gallery::load(&config.gallery_dir, &GridExtractor).with_context(|| {
        format!("loading gallery from {}", config.gallery_dir.display())
    })?;
    if gallery.is_empty() {
        tracing::warn!("gallery is empty; every face will be reported unknown");
    }

    let frames_dir = config
        .frames_dir
        .clone()
        .context("ROLLCALL_FRAMES_DIR is not set; point it at a directory of frame images")?;

    let speech = speech::CommandSpeech::new(&config.speak_command)
        .context("ROLLCALL_SPEAK_COMMAND is empty")?;
    let announcer = announcer::spawn_announcer(Box::new(speech));

    let handle = pipeline::spawn_pipeline(pipeline::PipelineDeps {
        source: Box::new(replay::ReplaySource::new(&frames_dir)),
        analyzer: Box::new(replay::FullFrameAnalyzer),
        display: Box::new(display::LogDisplay),
        gallery,
        ledger,
        throttle: AlertThrottle::new(config.alert_gap),
        announcer,
        match_threshold: config.match_threshold,
        frame_interval: config.frame_interval,
        alert_phrase: config.alert_phrase.clone(),
    });

    handle.start().await?;
    tracing::info!("rollcalld ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("rollcalld shutting down");
    handle.stop().await?;

    Ok(())
}
