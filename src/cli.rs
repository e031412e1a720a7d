use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chipreel", about = "Render piano-roll videos of chiptune songs")]
pub struct Cli {
    /// Playback trace (JSON) of the song to export
    pub trace: PathBuf,

    /// Output video file
    #[arg(short, long, default_value = "output.mp4")]
    pub output: PathBuf,

    /// ffmpeg executable (must be built with libx264)
    #[arg(long, default_value = "ffmpeg")]
    pub encoder: PathBuf,

    /// Channels to export as a bitmask, e.g. 0b10011 or 0x1f. Defaults to all.
    #[arg(short, long, value_parser = parse_channel_mask)]
    pub channels: Option<u64>,

    /// Audio bitrate in kbps
    #[arg(long, default_value_t = 128)]
    pub audio_bitrate: u32,

    /// Video bitrate in Mbps
    #[arg(long, default_value_t = 10)]
    pub video_bitrate: u32,

    /// Piano roll zoom level (-2 to 2)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub zoom: i32,

    /// Draw highlighted notes at half height
    #[arg(long)]
    pub thin_notes: bool,

    /// Font (TTF/OTF) used for channel names
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Stop after this many seconds
    #[arg(short, long)]
    pub duration: Option<u32>,

    /// Config file (defaults to chipreel.toml or the user config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Accepts decimal, `0x` hex or `0b` binary.
fn parse_channel_mask(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else if let Some(bin) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        u64::from_str_radix(bin, 2)
    } else {
        s.parse()
    };
    parsed.map_err(|e| format!("invalid channel mask '{}': {}", s, e))
}
