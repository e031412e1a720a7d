mod cli;
mod config;
mod encode;
mod error;
mod export;
mod playback;
mod render;
mod song;
mod video;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use cli::Cli;
use encode::FfmpegLauncher;
use export::ExportRequest;
use playback::trace::TraceEngine;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    if let Some(path) = config::find_config(cli.config.as_deref()) {
        if let Some(cfg) = config::load_config(&path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.encoder == PathBuf::from("ffmpeg") { cli.encoder = cfg.encoder.executable; }
            if cli.audio_bitrate == 128 { cli.audio_bitrate = cfg.encoder.audio_bitrate; }
            if cli.video_bitrate == 10 { cli.video_bitrate = cfg.encoder.video_bitrate; }
            if cli.zoom == 0 { cli.zoom = cfg.piano_roll.zoom; }
            if !cli.thin_notes { cli.thin_notes = cfg.piano_roll.thin_notes; }
            if cli.font.is_none() { cli.font = cfg.overlay.font; }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    if !cli.trace.exists() {
        anyhow::bail!("Trace file not found: {}", cli.trace.display());
    }

    log::info!("chipreel - chiptune piano roll video export");
    log::info!("Input: {}", cli.trace.display());
    log::info!("Output: {}", cli.output.display());

    let (engine, song) = TraceEngine::open(&cli.trace)
        .with_context(|| format!("Failed to load {}", cli.trace.display()))?;

    let request = ExportRequest {
        channel_mask: cli.channels.unwrap_or(u64::MAX),
        audio_bitrate_kbps: cli.audio_bitrate,
        video_bitrate_mbps: cli.video_bitrate,
        piano_roll_zoom: cli.zoom,
        thin_notes: cli.thin_notes,
        duration_secs: cli.duration,
        font: cli.font.clone(),
        show_progress: !cli.no_progress,
        ..ExportRequest::new(cli.output.clone())
    };

    let mut launcher = FfmpegLauncher::new(cli.encoder.clone());
    if !export::save(&song, &engine, &mut launcher, &request) {
        anyhow::bail!("Video export failed");
    }

    log::info!("Done! Output: {}", cli.output.display());
    Ok(())
}
