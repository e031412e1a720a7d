//! Encoder bridge: capability probe, the raw-frame video pass and the audio mux pass.

pub mod ffmpeg;

pub use ffmpeg::FfmpegLauncher;

use crate::error::{EncoderPass, ExportError, ExportResult};
use std::path::{Path, PathBuf};

/// Token the encoder's version output must contain.
pub const REQUIRED_CAPABILITY: &str = "--enable-libx264";

/// Starts encoder processes. Implemented by the real ffmpeg launcher and by test fakes.
pub trait EncoderLauncher {
    fn executable(&self) -> &Path;

    /// Run to completion and return captured stdout.
    fn run(&mut self, args: &[String], pass: EncoderPass) -> ExportResult<String>;

    /// Start a process that reads raw frames from its standard input.
    fn spawn_piped(&mut self, args: &[String], pass: EncoderPass) -> ExportResult<Box<dyn FrameSink>>;
}

/// Write end of a running video pass.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &[u8]) -> ExportResult<()>;

    /// Close the input and wait for the process to exit.
    fn finish(self: Box<Self>) -> ExportResult<()>;
}

fn common_args() -> Vec<String> {
    ["-y", "-hide_banner", "-loglevel", "error"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// First pass: raw ARGB frames on stdin to a video-only H.264 stream.
#[derive(Clone, Debug)]
pub struct VideoPass {
    pub width: u32,
    pub height: u32,
    /// Rational frame rate, e.g. `6009883/100000`.
    pub frame_rate: String,
    pub bitrate_mbps: u32,
    pub output: PathBuf,
}

impl VideoPass {
    pub fn args(&self) -> Vec<String> {
        let mut args = common_args();
        args.extend([
            "-f".into(), "rawvideo".into(),
            "-pix_fmt".into(), "argb".into(),
            "-s".into(), format!("{}x{}", self.width, self.height),
            "-r".into(), self.frame_rate.clone(),
            "-i".into(), "-".into(),
            "-c:v".into(), "libx264".into(),
            "-pix_fmt".into(), "yuv420p".into(),
            "-b:v".into(), format!("{}M", self.bitrate_mbps),
            "-an".into(),
            path_arg(&self.output),
        ]);
        args
    }
}

/// Second pass: copy the video stream and encode the audio track into the final container.
#[derive(Clone, Debug)]
pub struct MuxPass {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub audio_bitrate_kbps: u32,
    pub output: PathBuf,
}

impl MuxPass {
    pub fn args(&self) -> Vec<String> {
        let mut args = common_args();
        args.extend([
            "-i".into(), path_arg(&self.video),
            "-i".into(), path_arg(&self.audio),
            "-c:v".into(), "copy".into(),
            "-c:a".into(), "aac".into(),
            "-b:a".into(), format!("{}k", self.audio_bitrate_kbps),
            path_arg(&self.output),
        ]);
        args
    }
}

/// Fails unless the encoder runs and reports [`REQUIRED_CAPABILITY`].
pub fn detect_encoder(launcher: &mut dyn EncoderLauncher) -> ExportResult<()> {
    let version = launcher.run(&["-version".to_string()], EncoderPass::Probe)?;
    if !version.contains(REQUIRED_CAPABILITY) {
        return Err(ExportError::MissingCapability {
            marker: REQUIRED_CAPABILITY.to_string(),
        });
    }
    if let Some(first) = version.lines().next() {
        log::debug!("{}: {}", launcher.executable().display(), first);
    }
    Ok(())
}

pub fn start_video_pass(launcher: &mut dyn EncoderLauncher, pass: &VideoPass) -> ExportResult<Box<dyn FrameSink>> {
    log::info!(
        "Starting video pass: {}x{} @ {} fps, {} Mbps",
        pass.width, pass.height, pass.frame_rate, pass.bitrate_mbps
    );
    launcher.spawn_piped(&pass.args(), EncoderPass::Video)
}

pub fn mux_audio(launcher: &mut dyn EncoderLauncher, pass: &MuxPass) -> ExportResult<()> {
    if let Some(parent) = pass.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    log::info!("Muxing audio into {}", pass.output.display());
    launcher.run(&pass.args(), EncoderPass::Mux)?;
    Ok(())
}
