//! Playback engine that replays a recorded trace instead of emulating the sound chip.
//!
//! A trace is a JSON document describing the song's channels and the state of
//! every engine frame, plus one pre-rendered audio file per channel:
//!
//! ```json
//! {
//!   "name": "Intro",
//!   "region": "ntsc",
//!   "tempo_mode": "variable",
//!   "channels": [{ "kind": "square1", "wave": "sq1.wav" }],
//!   "frames": [
//!     { "pattern": 0, "row": 0, "channels": [{ "note": { "type": "rest" } }] },
//!     { "pattern": 0, "row": 0, "samples": 735,
//!       "channels": [{ "note": { "type": "musical", "value": 49 }, "volume": 15 }] }
//!   ]
//! }
//! ```
//!
//! The first frame is the state right after initialisation and produces no audio.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::decode::decode_channel_wave;
use super::{ChannelSnapshot, FrameSource, PlayPosition, PlaybackEngine};
use crate::error::{ExportError, ExportResult};
use crate::song::{Channel, ChannelKind, Note, Region, Song, TempoMode};

#[derive(Debug, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region: Region,
    #[serde(default)]
    pub tempo_mode: TempoMode,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    pub channels: Vec<TraceChannel>,
    pub frames: Vec<TraceFrame>,
}

#[derive(Debug, Deserialize)]
pub struct TraceChannel {
    pub kind: ChannelKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub wave: Option<PathBuf>,
    #[serde(default)]
    pub icon: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct TraceFrame {
    #[serde(default)]
    pub pattern: usize,
    #[serde(default)]
    pub row: u32,
    /// Samples generated by this frame. Derived from the region frame rate when absent.
    #[serde(default)]
    pub samples: Option<u32>,
    #[serde(default)]
    pub channels: Vec<TraceChannelState>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TraceChannelState {
    #[serde(default)]
    pub note: Note,
    #[serde(default = "default_volume")]
    pub volume: u8,
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_volume() -> u8 {
    15
}

pub struct TraceEngine {
    trace: Trace,
    waves: Vec<Option<Vec<i16>>>,
}

impl TraceEngine {
    /// Load a trace file and the channel renders it references.
    pub fn open(path: &Path) -> Result<(Self, Song)> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace: {}", path.display()))?;
        let mut trace: Trace = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse trace: {}", path.display()))?;

        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        for channel in &mut trace.channels {
            channel.wave = channel.wave.take().map(|p| base_dir.join(p));
            channel.icon = channel.icon.take().map(|p| base_dir.join(p));
        }

        let mut waves = Vec::with_capacity(trace.channels.len());
        for channel in &trace.channels {
            let wave = match channel.wave {
                Some(ref wave_path) => {
                    let decoded = decode_channel_wave(wave_path)?;
                    if decoded.sample_rate != trace.sample_rate {
                        log::warn!(
                            "{} is {}Hz but the trace runs at {}Hz, oscilloscope timing will drift",
                            wave_path.display(),
                            decoded.sample_rate,
                            trace.sample_rate
                        );
                    }
                    Some(decoded.samples)
                }
                None => None,
            };
            waves.push(wave);
        }

        let song = Song {
            name: trace.name.clone(),
            channels: trace
                .channels
                .iter()
                .map(|c| Channel {
                    name: c.name.clone().unwrap_or_else(|| c.kind.default_name().to_string()),
                    kind: c.kind,
                    icon: c.icon.clone(),
                })
                .collect(),
            tempo_mode: trace.tempo_mode,
            region: trace.region,
        };

        log::info!(
            "Loaded trace '{}': {} channels, {} frames",
            song.name,
            song.channels.len(),
            trace.frames.len()
        );

        Ok((Self::from_trace(trace, waves), song))
    }

    pub fn from_trace(trace: Trace, waves: Vec<Option<Vec<i16>>>) -> Self {
        Self { trace, waves }
    }

    /// Sample count generated by each trace frame, index 0 being initialisation.
    fn frame_sample_counts(&self, region: Region) -> Vec<u64> {
        let spf = region.samples_per_frame(self.trace.sample_rate);
        let mut exact = 0.0f64;
        let mut emitted = 0u64;
        self.trace
            .frames
            .iter()
            .enumerate()
            .map(|(i, f)| {
                if i == 0 {
                    return 0;
                }
                let count = match f.samples {
                    Some(n) => n as u64,
                    None => {
                        exact += spf;
                        (exact.round() as u64).saturating_sub(emitted)
                    }
                };
                emitted += count;
                count
            })
            .collect()
    }

    fn total_samples(&self, region: Region) -> u64 {
        self.frame_sample_counts(region).iter().sum()
    }
}

impl PlaybackEngine for TraceEngine {
    fn sample_rate(&self) -> u32 {
        self.trace.sample_rate
    }

    fn frame_source(&self, song: &Song, region: Region) -> ExportResult<Box<dyn FrameSource + '_>> {
        if song.channels.len() != self.trace.channels.len() {
            return Err(ExportError::trace(format!(
                "song has {} channels but the trace records {}",
                song.channels.len(),
                self.trace.channels.len()
            )));
        }
        Ok(Box::new(TraceSource {
            frames: &self.trace.frames,
            sample_counts: self.frame_sample_counts(region),
            num_channels: self.trace.channels.len(),
            index: 0,
            samples: 0,
        }))
    }

    fn render_waveform(
        &self,
        _song: &Song,
        region: Region,
        channel_mask: u64,
        max_samples: Option<u64>,
    ) -> ExportResult<Vec<i16>> {
        let mut len = self.total_samples(region);
        if let Some(max) = max_samples {
            len = len.min(max);
        }
        let len = len as usize;

        let mut mix = vec![0i32; len];
        for (i, wave) in self.waves.iter().enumerate() {
            if i >= 64 || channel_mask & (1u64 << i) == 0 {
                continue;
            }
            let Some(wave) = wave else {
                continue;
            };
            for (acc, &s) in mix.iter_mut().zip(wave.iter()) {
                *acc += s as i32;
            }
        }

        Ok(mix
            .into_iter()
            .map(|s| s.clamp(i16::MIN as i32, i16::MAX as i32) as i16)
            .collect())
    }
}

struct TraceSource<'a> {
    frames: &'a [TraceFrame],
    sample_counts: Vec<u64>,
    num_channels: usize,
    index: usize,
    samples: u64,
}

impl FrameSource for TraceSource<'_> {
    fn begin(&mut self) -> bool {
        self.index = 0;
        self.samples = 0;
        !self.frames.is_empty()
    }

    fn advance(&mut self) -> bool {
        if self.index + 1 >= self.frames.len() {
            return false;
        }
        self.index += 1;
        self.samples += self.sample_counts[self.index];
        true
    }

    fn position(&self) -> PlayPosition {
        let frame = &self.frames[self.index];
        PlayPosition {
            pattern: frame.pattern,
            row: frame.row,
        }
    }

    fn channel_count(&self) -> usize {
        self.num_channels
    }

    fn channel_state(&self, channel: usize) -> ChannelSnapshot {
        self.frames[self.index]
            .channels
            .get(channel)
            .map(|s| ChannelSnapshot {
                note: s.note.clone(),
                volume: s.volume,
            })
            .unwrap_or_default()
    }

    fn sample_count(&self) -> u64 {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::metadata::generate_metadata;

    const TRACE: &str = r#"{
        "name": "t",
        "tempo_mode": "variable",
        "channels": [{ "kind": "square1" }, { "kind": "triangle", "name": "Bass" }],
        "frames": [
            { "channels": [] },
            { "samples": 100, "channels": [{ "note": { "type": "musical", "value": 49 }, "volume": 9 }] },
            { "samples": 100, "row": 1 },
            { "samples": 100, "row": 1 }
        ]
    }"#;

    fn engine_with(waves: Vec<Option<Vec<i16>>>) -> TraceEngine {
        let trace: Trace = serde_json::from_str(TRACE).unwrap();
        TraceEngine::from_trace(trace, waves)
    }

    fn song() -> Song {
        Song {
            name: "t".into(),
            channels: vec![
                Channel {
                    name: "Square 1".into(),
                    kind: ChannelKind::Square1,
                    icon: None,
                },
                Channel {
                    name: "Bass".into(),
                    kind: ChannelKind::Triangle,
                    icon: None,
                },
            ],
            tempo_mode: TempoMode::Variable,
            region: Region::Ntsc,
        }
    }

    #[test]
    fn replays_frames_in_order() {
        let engine = engine_with(vec![None, None]);
        let song = song();
        let mut source = engine.frame_source(&song, Region::Ntsc).unwrap();
        let frames = generate_metadata(source.as_mut(), None);
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[1].channel_notes[0], Note::musical(49));
        assert_eq!(frames[1].channel_volumes[0], 9);
        assert_eq!(frames[1].channel_notes[1], Note::Rest);
        assert_eq!(frames[2].row_position, 1.0);
        assert_eq!(frames[3].audio_sample_offset, 200);
    }

    #[test]
    fn mix_saturates_and_respects_mask() {
        let engine = engine_with(vec![Some(vec![30000; 300]), Some(vec![10000; 300])]);
        let song = song();
        let both = engine.render_waveform(&song, Region::Ntsc, 0b11, None).unwrap();
        assert_eq!(both.len(), 300);
        assert!(both.iter().all(|&s| s == i16::MAX));
        let second = engine.render_waveform(&song, Region::Ntsc, 0b10, Some(50)).unwrap();
        assert_eq!(second.len(), 50);
        assert!(second.iter().all(|&s| s == 10000));
    }

    #[test]
    fn missing_sample_counts_follow_the_frame_rate() {
        let trace: Trace = serde_json::from_str(
            r#"{ "channels": [], "frames": [{}, {}, {}, {}] }"#,
        )
        .unwrap();
        let engine = TraceEngine::from_trace(trace, Vec::new());
        let counts = engine.frame_sample_counts(Region::Ntsc);
        assert_eq!(counts[0], 0);
        assert_eq!(counts.iter().sum::<u64>(), (3.0 * Region::Ntsc.samples_per_frame(44100)).round() as u64);
    }
}
