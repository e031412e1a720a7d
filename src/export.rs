//! Video export orchestration: metadata, per-frame rendering and compositing,
//! then the two encoder passes.

use crate::encode::{self, EncoderLauncher, MuxPass, VideoPass};
use crate::error::{ExportError, ExportResult};
use crate::playback::metadata::{generate_metadata, FrameMetadata};
use crate::playback::tempo::smooth_variable_tempo;
use crate::playback::PlaybackEngine;
use crate::render::canvas::CpuCanvas;
use crate::render::overlay::{paint_overlay, scope_rect, OverlayLabel};
use crate::render::piano_roll::{LanePianoRoll, PianoRollRenderer};
use crate::render::text::TextRenderer;
use crate::render::{Bitmap, Canvas, Rgba, DARK_GREY, MEDIUM_GREY, TRANSPARENT};
use crate::song::{ChannelKind, Note, Song};
use crate::video::composite::{ColumnLayout, FrameCompositor};
use crate::video::oscilloscope::generate_oscilloscope;
use crate::video::scroll::compute_channels_scroll;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const VIDEO_WIDTH: u32 = 1920;
pub const VIDEO_HEIGHT: u32 = 1080;
/// Length of audio shown by each oscilloscope, in seconds.
pub const OSCILLOSCOPE_WINDOW_SECS: f32 = 0.075;

const CHANNEL_FONT_SIZE: f32 = 28.0;
const CHANNEL_ICON_SIZE: u32 = 32;

#[derive(Clone, Debug)]
pub struct ExportRequest {
    pub output: PathBuf,
    /// Bit `i` selects song channel `i`.
    pub channel_mask: u64,
    pub audio_bitrate_kbps: u32,
    pub video_bitrate_mbps: u32,
    pub piano_roll_zoom: i32,
    pub thin_notes: bool,
    /// Stop after this many seconds of audio.
    pub duration_secs: Option<u32>,
    /// Font for the channel labels; labels are left out without one.
    pub font: Option<PathBuf>,
    pub show_progress: bool,
    pub video_size: (u32, u32),
}

impl ExportRequest {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            channel_mask: u64::MAX,
            audio_bitrate_kbps: 128,
            video_bitrate_mbps: 10,
            piano_roll_zoom: 0,
            thin_notes: false,
            duration_secs: None,
            font: None,
            show_progress: true,
            video_size: (VIDEO_WIDTH, VIDEO_HEIGHT),
        }
    }
}

/// One exported channel and the buffers it owns for the duration of an export.
struct ExportChannel {
    song_channel: usize,
    column: usize,
    name: String,
    kind: ChannelKind,
    icon: Bitmap,
    wave: Vec<i16>,
    scope: Vec<[f32; 2]>,
}

/// Everything allocated for one export. Dropping it releases the lot,
/// including the temporary directory, whichever way the export ends.
struct ExportArena {
    channels: Vec<ExportChannel>,
    overlay: CpuCanvas,
    channel_canvas: CpuCanvas,
    temp_dir: Option<TempDir>,
}

impl Drop for ExportArena {
    fn drop(&mut self) {
        if let Some(dir) = self.temp_dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                log::warn!("Failed to remove temporary directory {}: {}", path.display(), e);
            }
        }
        log::debug!("Released export resources for {} channels", self.channels.len());
    }
}

/// Colour the current note is highlighted with on the piano roll.
pub fn highlight_color(kind: ChannelKind, note: &Note, volume: u8) -> Rgba {
    let Some(musical) = note.as_musical() else {
        return TRANSPARENT;
    };
    if kind == ChannelKind::Dpcm {
        let [r, g, b] = MEDIUM_GREY;
        return [r, g, b, 210];
    }
    let [r, g, b] = musical.instrument_color.unwrap_or(DARK_GREY);
    [r, g, b, (128 + volume.min(15) as u32 * 127 / 15) as u8]
}

/// Gain that brings the loudest sample of any channel to full scale.
fn oscilloscope_scale(channels: &[ExportChannel]) -> f32 {
    let max_abs = channels
        .par_iter()
        .map(|c| c.wave.par_iter().map(|s| s.unsigned_abs()).max().unwrap_or(0))
        .max()
        .unwrap_or(0);
    if max_abs == 0 {
        1.0
    } else {
        i16::MAX as f32 / max_abs as f32
    }
}

fn load_icon(song: &Song, channel: usize) -> Bitmap {
    let ch = &song.channels[channel];
    if let Some(ref path) = ch.icon {
        match Bitmap::load(path) {
            Ok(bmp) => return bmp,
            Err(e) => log::warn!("Using a generated icon for '{}': {:#}", ch.name, e),
        }
    }
    Bitmap::tile(CHANNEL_ICON_SIZE, ch.kind.icon_tint())
}

fn write_wav(path: &Path, samples: &[i16], sample_rate: u32) -> ExportResult<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Number of note lanes that fit across a channel column.
fn visible_note_count(layout: &ColumnLayout, piano_roll: &impl PianoRollRenderer) -> usize {
    let (_, image_h) = layout.channel_image_size();
    (image_h / piano_roll.note_size_y().max(1)) as usize
}

/// Step the song once per engine frame and prepare what the frame loop reads:
/// scroll centres for the selected channels, and fractional rows when the
/// tempo is variable.
fn build_frames(
    song: &Song,
    engine: &dyn PlaybackEngine,
    selected: &[usize],
    channel_mask: u64,
    max_samples: Option<u64>,
    num_visible_notes: usize,
) -> ExportResult<Vec<FrameMetadata>> {
    let mut source = engine.frame_source(song, song.region)?;
    let mut frames = generate_metadata(source.as_mut(), max_samples);
    drop(source);
    if frames.is_empty() {
        return Err(ExportError::EmptySong);
    }

    let needed = selected.iter().max().map_or(0, |&c| c + 1);
    if let Some(short) = frames
        .iter()
        .find(|f| f.channel_notes.len() < needed || f.channel_volumes.len() < needed)
    {
        return Err(ExportError::trace(format!(
            "playback reports {} channels but channel {} is selected",
            short.channel_notes.len(),
            needed - 1
        )));
    }

    compute_channels_scroll(&mut frames, channel_mask, num_visible_notes);
    if song.uses_variable_tempo() {
        smooth_variable_tempo(&mut frames);
    }
    Ok(frames)
}

/// Blend with whatever alpha convention the overlay canvas paints in.
fn overlay_compositor(layout: ColumnLayout, overlay: &dyn Canvas) -> FrameCompositor {
    FrameCompositor::new(layout, overlay.alpha_mode())
}

/// Remove whatever a failed mux left at the output path.
fn discard_partial_output(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => log::debug!("Removed partial output {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to delete partial output {}: {}", path.display(), e),
    }
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

/// Export `song` to a video file. Failures are logged and reported as `false`.
pub fn save(
    song: &Song,
    engine: &dyn PlaybackEngine,
    launcher: &mut dyn EncoderLauncher,
    request: &ExportRequest,
) -> bool {
    match export(song, engine, launcher, request) {
        Ok(()) => {
            log::info!("Video exported to {}", request.output.display());
            true
        }
        Err(e) if e.is_configuration() => {
            log::error!("Cannot export video: {}", e);
            false
        }
        Err(e) => {
            log::error!("Error exporting video: {}", e);
            false
        }
    }
}

pub fn export(
    song: &Song,
    engine: &dyn PlaybackEngine,
    launcher: &mut dyn EncoderLauncher,
    request: &ExportRequest,
) -> ExportResult<()> {
    let selected = song.selected_channels(request.channel_mask);
    if selected.is_empty() {
        return Err(ExportError::NoChannelsSelected);
    }

    encode::detect_encoder(launcher)?;

    let region = song.region;
    let sample_rate = engine.sample_rate();
    let max_samples = request.duration_secs.map(|s| s as u64 * sample_rate as u64);
    let (video_w, video_h) = request.video_size;
    let layout = ColumnLayout::new(video_w, video_h, selected.len());
    let (image_w, image_h) = layout.channel_image_size();

    let mut channels = Vec::with_capacity(selected.len());
    for (column, &index) in selected.iter().enumerate() {
        let wave = engine.render_waveform(song, region, 1u64 << index, max_samples)?;
        channels.push(ExportChannel {
            song_channel: index,
            column,
            name: song.channels[index].name.clone(),
            kind: song.channels[index].kind,
            icon: load_icon(song, index),
            wave,
            scope: vec![[0.0, 0.0]; layout.column_width() as usize],
        });
    }

    let mut overlay = CpuCanvas::new(video_w, video_h);
    match request.font {
        Some(ref font) => match TextRenderer::from_file(font, CHANNEL_FONT_SIZE) {
            Ok(text) => overlay = overlay.with_text(text),
            Err(e) => log::warn!("Channel names disabled: {:#}", e),
        },
        None => log::warn!("No font configured, channel names are not drawn"),
    }

    let mut arena = ExportArena {
        channels,
        overlay,
        channel_canvas: CpuCanvas::new(image_w, image_h),
        temp_dir: None,
    };

    let scale_y = oscilloscope_scale(&arena.channels);
    let samples_per_frame = region.samples_per_frame(sample_rate);
    let scope_window = (sample_rate as f32 * OSCILLOSCOPE_WINDOW_SECS).round() as usize;
    let scope_lookback = (samples_per_frame / 2.0) as usize;

    let mut piano_roll = LanePianoRoll::new(request.piano_roll_zoom, request.thin_notes);
    let num_visible_notes = visible_note_count(&layout, &piano_roll);
    let frames = build_frames(
        song,
        engine,
        &selected,
        request.channel_mask,
        max_samples,
        num_visible_notes,
    )?;

    let temp_dir = tempfile::Builder::new().prefix("chipreel").tempdir()?;
    let temp_video = temp_dir.path().join("temp.h264");
    let temp_audio = temp_dir.path().join("temp.wav");
    arena.temp_dir = Some(temp_dir);

    log::info!(
        "Exporting '{}': {} channels, {} frames, {} visible notes",
        song.name,
        arena.channels.len(),
        frames.len(),
        num_visible_notes
    );

    let mut sink = encode::start_video_pass(
        launcher,
        &VideoPass {
            width: video_w,
            height: video_h,
            frame_rate: region.frame_rate_arg(),
            bitrate_mbps: request.video_bitrate_mbps,
            output: temp_video.clone(),
        },
    )?;

    let mut compositor = overlay_compositor(layout, &arena.overlay);
    let pb = progress_bar(frames.len() as u64, request.show_progress);

    for frame in &frames {
        let ExportArena {
            channels,
            overlay,
            channel_canvas,
            ..
        } = &mut arena;

        for ch in channels.iter_mut() {
            generate_oscilloscope(
                &ch.wave,
                frame.audio_sample_offset as usize,
                scope_window,
                scope_lookback,
                scale_y,
                scope_rect(&layout, ch.column),
                &mut ch.scope,
            );
        }

        let labels: Vec<OverlayLabel<'_>> = channels
            .iter()
            .map(|ch| OverlayLabel {
                column: ch.column,
                name: &ch.name,
                icon: &ch.icon,
                scope: &ch.scope,
            })
            .collect();
        paint_overlay(overlay, &layout, &labels);

        compositor.begin_frame();
        for ch in channels.iter() {
            let note = &frame.channel_notes[ch.song_channel];
            let color = highlight_color(ch.kind, note, frame.channel_volumes[ch.song_channel]);
            piano_roll.render_frame(
                channel_canvas,
                ch.song_channel,
                frame.pattern_index,
                frame.row_position,
                frame.channel_scroll[ch.song_channel],
                note.as_musical().map(|n| n.value),
                color,
            );
            compositor.composite_channel(overlay.pixels(), ch.column, channel_canvas.pixels())?;
        }
        compositor.fix_seams();

        sink.write_frame(compositor.output())?;
        pb.inc(1);
    }

    pb.finish_with_message("Rendering complete");
    sink.finish()?;

    log::info!("Rendering audio track...");
    let mix = engine.render_waveform(song, region, request.channel_mask, max_samples)?;
    write_wav(&temp_audio, &mix, sample_rate)?;

    let mux = MuxPass {
        video: temp_video.clone(),
        audio: temp_audio.clone(),
        audio_bitrate_kbps: request.audio_bitrate_kbps,
        output: request.output.clone(),
    };
    if let Err(e) = encode::mux_audio(launcher, &mux) {
        discard_partial_output(&request.output);
        return Err(e);
    }

    for path in [&temp_audio, &temp_video] {
        if let Err(e) = std::fs::remove_file(path) {
            log::warn!("Failed to delete {}: {}", path.display(), e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::FrameSink;
    use crate::error::EncoderPass;
    use crate::playback::metadata::tests::ScriptedSource;
    use crate::playback::FrameSource;
    use crate::song::{Channel, Region, TempoMode};
    use std::cell::RefCell;
    use std::rc::Rc;

    const SPF: u64 = 735;

    struct FakeEngine {
        notes: Vec<Vec<Note>>,
    }

    impl PlaybackEngine for FakeEngine {
        fn sample_rate(&self) -> u32 {
            44100
        }

        fn frame_source(&self, _song: &Song, _region: Region) -> ExportResult<Box<dyn FrameSource + '_>> {
            Ok(Box::new(ScriptedSource::new(self.notes.clone())))
        }

        fn render_waveform(
            &self,
            _song: &Song,
            _region: Region,
            channel_mask: u64,
            max_samples: Option<u64>,
        ) -> ExportResult<Vec<i16>> {
            let len = (self.notes.len() as u64 * SPF).min(max_samples.unwrap_or(u64::MAX));
            let amp = 1000 * channel_mask.count_ones() as i32;
            Ok((0..len)
                .map(|i| if (i / 50) % 2 == 0 { amp as i16 } else { -amp as i16 })
                .collect())
        }
    }

    #[derive(Default)]
    struct Record {
        calls: Vec<(EncoderPass, Vec<String>)>,
        frames: Vec<usize>,
    }

    struct FakeLauncher {
        version: &'static str,
        fail_video: bool,
        fail_mux: bool,
        record: Rc<RefCell<Record>>,
    }

    impl FakeLauncher {
        fn new() -> Self {
            Self {
                version: "ffmpeg version n6.1 configuration: --enable-gpl --enable-libx264",
                fail_video: false,
                fail_mux: false,
                record: Rc::default(),
            }
        }

        fn passes(&self) -> Vec<EncoderPass> {
            self.record.borrow().calls.iter().map(|(p, _)| *p).collect()
        }
    }

    struct FakeSink {
        output: PathBuf,
        fail: bool,
        record: Rc<RefCell<Record>>,
    }

    impl FrameSink for FakeSink {
        fn write_frame(&mut self, frame: &[u8]) -> ExportResult<()> {
            self.record.borrow_mut().frames.push(frame.len());
            Ok(())
        }

        fn finish(self: Box<Self>) -> ExportResult<()> {
            if self.fail {
                return Err(ExportError::EncoderFailed {
                    pass: EncoderPass::Video,
                    status: "exit status: 1".into(),
                    stderr: "Unknown encoder 'libx264'".into(),
                });
            }
            std::fs::write(&self.output, b"h264")?;
            Ok(())
        }
    }

    impl EncoderLauncher for FakeLauncher {
        fn executable(&self) -> &Path {
            Path::new("ffmpeg")
        }

        fn run(&mut self, args: &[String], pass: EncoderPass) -> ExportResult<String> {
            self.record.borrow_mut().calls.push((pass, args.to_vec()));
            if pass == EncoderPass::Mux {
                if let Some(out) = args.last() {
                    std::fs::write(out, b"mp4")?;
                }
                if self.fail_mux {
                    return Err(ExportError::EncoderFailed {
                        pass,
                        status: "exit status: 1".into(),
                        stderr: "Error while opening encoder for output stream #0:1".into(),
                    });
                }
            }
            Ok(self.version.to_string())
        }

        fn spawn_piped(&mut self, args: &[String], pass: EncoderPass) -> ExportResult<Box<dyn FrameSink>> {
            self.record.borrow_mut().calls.push((pass, args.to_vec()));
            Ok(Box::new(FakeSink {
                output: PathBuf::from(args.last().cloned().unwrap_or_default()),
                fail: self.fail_video,
                record: self.record.clone(),
            }))
        }
    }

    fn two_channel_song() -> Song {
        Song {
            name: "Test".into(),
            channels: vec![
                Channel {
                    name: "Square 1".into(),
                    kind: ChannelKind::Square1,
                    icon: None,
                },
                Channel {
                    name: "DPCM".into(),
                    kind: ChannelKind::Dpcm,
                    icon: None,
                },
            ],
            tempo_mode: TempoMode::Fixed,
            region: Region::Ntsc,
        }
    }

    fn engine(num_frames: usize) -> FakeEngine {
        let notes = (0..num_frames)
            .map(|f| vec![Note::musical(40 + (f / 20) as i32), Note::musical(30)])
            .collect();
        FakeEngine { notes }
    }

    fn request(dir: &Path) -> ExportRequest {
        ExportRequest {
            show_progress: false,
            // 60 px columns of 3 px lanes: 20 visible notes.
            piano_roll_zoom: -2,
            video_size: (120, 36),
            ..ExportRequest::new(dir.join("out").join("song.mp4"))
        }
    }

    #[test]
    fn highlight_colours() {
        assert_eq!(highlight_color(ChannelKind::Square1, &Note::Rest, 15), TRANSPARENT);
        assert_eq!(highlight_color(ChannelKind::Dpcm, &Note::musical(30), 3), [160, 160, 160, 210]);
        assert_eq!(highlight_color(ChannelKind::Square1, &Note::musical(30), 15), [70, 70, 70, 255]);
        assert_eq!(highlight_color(ChannelKind::Square1, &Note::musical(30), 0), [70, 70, 70, 128]);

        let mut note = crate::song::MusicalNote::new(30);
        note.instrument_color = Some([1, 2, 3]);
        assert_eq!(highlight_color(ChannelKind::Noise, &Note::Musical(note), 15), [1, 2, 3, 255]);
    }

    #[test]
    fn full_export_streams_every_frame_and_muxes() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path());
        let mut launcher = FakeLauncher::new();

        assert!(save(&two_channel_song(), &engine(100), &mut launcher, &req));

        assert_eq!(
            launcher.passes(),
            vec![EncoderPass::Probe, EncoderPass::Video, EncoderPass::Mux]
        );

        let record = launcher.record.borrow();
        assert_eq!(record.frames.len(), 100);
        assert!(record.frames.iter().all(|&len| len == 120 * 36 * 4));

        let video_args = &record.calls[1].1;
        let temp_video = PathBuf::from(video_args.last().unwrap());
        assert!(video_args.contains(&"6009883/100000".to_string()));

        let mux_args = &record.calls[2].1;
        let inputs: Vec<&String> = mux_args
            .iter()
            .zip(mux_args.iter().skip(1))
            .filter(|(flag, _)| *flag == "-i")
            .map(|(_, v)| v)
            .collect();
        assert_eq!(inputs.len(), 2);
        assert_eq!(PathBuf::from(inputs[0]), temp_video);
        assert_eq!(PathBuf::from(inputs[1]), temp_video.with_file_name("temp.wav"));

        assert!(req.output.exists());
        assert!(!temp_video.parent().unwrap().exists());
    }

    #[test]
    fn missing_capability_fails_before_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let mut launcher = FakeLauncher::new();
        launcher.version = "ffmpeg version n6.1 configuration: --enable-lgpl";

        assert!(!save(&two_channel_song(), &engine(10), &mut launcher, &request(dir.path())));
        assert_eq!(launcher.passes(), vec![EncoderPass::Probe]);
    }

    #[test]
    fn empty_mask_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut launcher = FakeLauncher::new();
        let req = ExportRequest {
            channel_mask: 0b100,
            ..request(dir.path())
        };

        let err = export(&two_channel_song(), &engine(10), &mut launcher, &req).unwrap_err();
        assert!(matches!(err, ExportError::NoChannelsSelected));
        assert!(launcher.passes().is_empty());
    }

    #[test]
    fn video_failure_skips_mux_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path());
        let mut launcher = FakeLauncher::new();
        launcher.fail_video = true;

        assert!(!save(&two_channel_song(), &engine(20), &mut launcher, &req));
        assert_eq!(launcher.passes(), vec![EncoderPass::Probe, EncoderPass::Video]);
        assert!(!req.output.exists());

        let record = launcher.record.borrow();
        let temp_video = PathBuf::from(record.calls[1].1.last().unwrap());
        assert!(!temp_video.parent().unwrap().exists());
    }

    #[test]
    fn duration_cap_limits_frames() {
        let dir = tempfile::tempdir().unwrap();
        let req = ExportRequest {
            duration_secs: Some(1),
            channel_mask: 0b01,
            ..request(dir.path())
        };
        let mut launcher = FakeLauncher::new();

        assert!(save(&two_channel_song(), &engine(200), &mut launcher, &req));
        // 44100 / 735 = 60 steps reach the cap, so frames 0..=59 are kept.
        assert_eq!(launcher.record.borrow().frames.len(), 60);
    }

    #[test]
    fn mux_failure_removes_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path());
        let mut launcher = FakeLauncher::new();
        launcher.fail_mux = true;

        assert!(!save(&two_channel_song(), &engine(20), &mut launcher, &req));
        assert_eq!(
            launcher.passes(),
            vec![EncoderPass::Probe, EncoderPass::Video, EncoderPass::Mux]
        );
        assert!(!req.output.exists());

        let record = launcher.record.borrow();
        let temp_video = PathBuf::from(record.calls[1].1.last().unwrap());
        assert!(!temp_video.parent().unwrap().exists());
    }

    #[test]
    fn frames_start_at_zero_and_scroll_selected_channels() {
        let song = two_channel_song();
        let layout = ColumnLayout::new(120, 36, 2);
        let visible = visible_note_count(&layout, &LanePianoRoll::new(-2, false));
        assert_eq!(visible, 20);

        let frames = build_frames(&song, &engine(100), &[0], 0b01, None, visible).unwrap();
        assert_eq!(frames.len(), 100);
        assert_eq!(frames[0].audio_sample_offset, 0);
        assert_eq!(frames[2].audio_sample_offset, SPF);
        assert!(frames[0].channel_scroll[0] > 0.0);
        assert!(frames.iter().all(|f| f.channel_scroll[1] == 0.0));
    }

    #[test]
    fn playback_with_fewer_channels_than_selected_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut launcher = FakeLauncher::new();
        let one_channel = FakeEngine {
            notes: vec![vec![Note::musical(40)]; 10],
        };

        let err = export(&two_channel_song(), &one_channel, &mut launcher, &request(dir.path())).unwrap_err();
        assert!(matches!(err, ExportError::Trace(_)));
        assert_eq!(launcher.passes(), vec![EncoderPass::Probe]);
    }

    #[test]
    fn compositor_follows_the_overlay_alpha_convention() {
        let layout = ColumnLayout::new(1, 1, 1);
        let mut overlay = CpuCanvas::new(1, 1);
        overlay.fill_rect(0.0, 0.0, 1.0, 1.0, [200, 0, 100, 128]);
        assert_eq!(overlay.pixels(), &[200, 0, 100, 128]);

        let mut compositor = overlay_compositor(layout, &overlay);
        compositor.begin_frame();
        compositor
            .composite_channel(overlay.pixels(), 0, &[100, 100, 100, 255])
            .unwrap();
        // Straight alpha: (100 * 127 + 200 * 128) >> 8 = 149.
        assert_eq!(compositor.output(), &[255, 149, 49, 99]);
    }
}
