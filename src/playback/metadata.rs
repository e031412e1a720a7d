use super::FrameSource;
use crate::song::Note;

/// Musical state captured for one output video frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameMetadata {
    pub pattern_index: usize,
    /// Row within the pattern. Fractional only after tempo smoothing.
    pub row_position: f32,
    /// Samples generated before this frame's audio starts.
    pub audio_sample_offset: u64,
    pub channel_notes: Vec<Note>,
    pub channel_volumes: Vec<u8>,
    /// Piano-roll scroll centre per channel, filled by the scroll segmenter.
    pub channel_scroll: Vec<f32>,
}

impl FrameMetadata {
    fn capture(source: &dyn FrameSource, audio_sample_offset: u64) -> Self {
        let position = source.position();
        let num_channels = source.channel_count();
        let (channel_notes, channel_volumes) = (0..num_channels)
            .map(|c| {
                let state = source.channel_state(c);
                (state.note, state.volume.min(15))
            })
            .unzip();

        Self {
            pattern_index: position.pattern,
            row_position: position.row as f32,
            audio_sample_offset,
            channel_notes,
            channel_volumes,
            channel_scroll: vec![0.0; num_channels],
        }
    }
}

/// Step `source` to completion, snapshotting its state once per engine frame.
///
/// The first snapshot is taken right after initialisation so the first video
/// frame shows the state before any audio. Stepping stops when the source runs
/// out of frames or its sample count reaches `max_samples`.
pub fn generate_metadata(source: &mut dyn FrameSource, max_samples: Option<u64>) -> Vec<FrameMetadata> {
    let max_samples = max_samples.unwrap_or(u64::MAX);
    let mut frames = Vec::new();

    if !source.begin() {
        log::warn!("Playback could not be initialised, no frames generated");
        return frames;
    }

    let mut samples_before_step = source.sample_count();
    frames.push(FrameMetadata::capture(source, samples_before_step));

    while source.advance() {
        let samples_after_step = source.sample_count();
        if samples_after_step >= max_samples {
            break;
        }
        frames.push(FrameMetadata::capture(source, samples_before_step));
        samples_before_step = samples_after_step;
    }

    log::info!(
        "Generated metadata for {} frames ({} samples)",
        frames.len(),
        samples_before_step
    );

    frames
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::playback::{ChannelSnapshot, PlayPosition};

    /// Scripted source: fixed samples per frame, one row every `frames_per_row`.
    pub(crate) struct ScriptedSource {
        pub notes: Vec<Vec<Note>>,
        pub samples_per_frame: u64,
        pub frames_per_row: u32,
        pub rows_per_pattern: u32,
        pub frame: usize,
        pub started: bool,
    }

    impl ScriptedSource {
        pub(crate) fn new(notes: Vec<Vec<Note>>) -> Self {
            Self {
                notes,
                samples_per_frame: 735,
                frames_per_row: 4,
                rows_per_pattern: 16,
                frame: 0,
                started: false,
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn begin(&mut self) -> bool {
            self.started = !self.notes.is_empty();
            self.frame = 0;
            self.started
        }

        fn advance(&mut self) -> bool {
            if self.frame + 1 >= self.notes.len() {
                return false;
            }
            self.frame += 1;
            true
        }

        fn position(&self) -> PlayPosition {
            let row = self.frame as u32 / self.frames_per_row;
            PlayPosition {
                pattern: (row / self.rows_per_pattern) as usize,
                row: row % self.rows_per_pattern,
            }
        }

        fn channel_count(&self) -> usize {
            self.notes.first().map_or(0, |n| n.len())
        }

        fn channel_state(&self, channel: usize) -> ChannelSnapshot {
            ChannelSnapshot {
                note: self.notes[self.frame][channel].clone(),
                volume: 15,
            }
        }

        fn sample_count(&self) -> u64 {
            self.frame as u64 * self.samples_per_frame
        }
    }

    fn silent(frames: usize, channels: usize) -> Vec<Vec<Note>> {
        vec![vec![Note::Rest; channels]; frames]
    }

    #[test]
    fn first_frame_starts_at_zero_samples() {
        let mut source = ScriptedSource::new(silent(10, 2));
        let frames = generate_metadata(&mut source, None);
        assert_eq!(frames.len(), 10);
        assert_eq!(frames[0].audio_sample_offset, 0);
        assert_eq!(frames[1].audio_sample_offset, 0);
        assert_eq!(frames[2].audio_sample_offset, 735);
        assert_eq!(frames[9].audio_sample_offset, 8 * 735);
        assert_eq!(frames[0].channel_scroll, vec![0.0, 0.0]);
    }

    #[test]
    fn duration_cap_stops_stepping() {
        let mut source = ScriptedSource::new(silent(100, 1));
        let frames = generate_metadata(&mut source, Some(735 * 10));
        // Steps 1..=9 stay below the cap, step 10 reaches it.
        assert_eq!(frames.len(), 10);
    }

    #[test]
    fn captures_position_and_notes() {
        let mut notes = silent(8, 1);
        notes[5][0] = Note::musical(40);
        let mut source = ScriptedSource::new(notes);
        let frames = generate_metadata(&mut source, None);
        assert_eq!(frames[5].channel_notes[0], Note::musical(40));
        assert_eq!(frames[5].row_position, 1.0);
        assert_eq!(frames[5].pattern_index, 0);
        assert_eq!(frames[5].channel_volumes[0], 15);
    }

    #[test]
    fn unplayable_source_yields_nothing() {
        let mut source = ScriptedSource::new(Vec::new());
        assert!(generate_metadata(&mut source, None).is_empty());
    }
}
