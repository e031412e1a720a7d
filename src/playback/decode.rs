//! Decoding of per-channel renders into mono 16-bit samples.

use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

#[derive(Debug)]
pub struct ChannelWave {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

/// Append the average of each interleaved frame of `channels` samples to `out`.
fn downmix_into(out: &mut Vec<i16>, interleaved: &[i16], channels: usize) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(interleaved.chunks_exact(channels).map(|frame| {
        let sum: i32 = frame.iter().map(|&s| s as i32).sum();
        (sum / channels as i32) as i16
    }));
}

/// First decodable track of a channel render, read one packet at a time.
struct WaveReader {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    channels: usize,
    sample_rate: u32,
    buffer: Option<SampleBuffer<i16>>,
    buffer_frames: usize,
}

impl WaveReader {
    fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open channel render: {}", path.display()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let format = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .with_context(|| format!("Unsupported channel render: {}", path.display()))?
            .format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .with_context(|| format!("No audio track in {}", path.display()))?;
        let track_id = track.id;
        let channels = track.codec_params.channels.map_or(1, |c| c.count());
        let sample_rate = track.codec_params.sample_rate.context("Unknown sample rate")?;
        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .context("Failed to create audio decoder")?;

        Ok(Self {
            format,
            decoder,
            track_id,
            channels,
            sample_rate,
            buffer: None,
            buffer_frames: 0,
        })
    }

    /// Decode the next packet into `out`. Returns false at the end of the stream.
    fn read_packet(&mut self, out: &mut Vec<i16>) -> Result<bool> {
        let packet = match self.format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Ok(false);
            }
            Err(SymphoniaError::ResetRequired) => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != self.track_id {
            return Ok(true);
        }

        let decoded = match self.decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                log::debug!("Skipping undecodable packet: {}", e);
                return Ok(true);
            }
            Err(e) => return Err(e.into()),
        };

        let frames = decoded.frames();
        if self.buffer.is_none() || frames > self.buffer_frames {
            self.buffer = Some(SampleBuffer::new(frames as u64, *decoded.spec()));
            self.buffer_frames = frames;
        }
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.copy_interleaved_ref(decoded);
            downmix_into(out, buffer.samples(), self.channels);
        }
        Ok(true)
    }
}

/// Decode a rendered channel file into mono signed 16-bit samples.
pub fn decode_channel_wave(path: &Path) -> Result<ChannelWave> {
    let mut reader = WaveReader::open(path)?;
    let mut samples = Vec::new();
    while reader.read_packet(&mut samples)? {}

    log::debug!(
        "Decoded {}: {} samples, {}Hz, {} source channels",
        path.display(),
        samples.len(),
        reader.sample_rate,
        reader.channels
    );

    Ok(ChannelWave {
        samples,
        sample_rate: reader.sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_is_copied() {
        let mut out = vec![1];
        downmix_into(&mut out, &[2, 3], 1);
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn stereo_frames_are_averaged() {
        let mut out = Vec::new();
        downmix_into(&mut out, &[100, 300, -5, -6, i16::MAX, i16::MAX], 2);
        assert_eq!(out, vec![200, -5, i16::MAX]);
    }

    #[test]
    fn decodes_a_stereo_wav_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("square.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..1000i16 {
            writer.write_sample(i).unwrap();
            writer.write_sample(3 * i).unwrap();
        }
        writer.finalize().unwrap();

        let wave = decode_channel_wave(&path).unwrap();
        assert_eq!(wave.sample_rate, 22050);
        assert_eq!(wave.samples.len(), 1000);
        assert!(wave.samples.iter().enumerate().all(|(i, &s)| s == 2 * i as i16));
    }

    #[test]
    fn missing_render_names_the_file() {
        let err = decode_channel_wave(Path::new("/nonexistent/pulse.wav")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/pulse.wav"));
    }
}
