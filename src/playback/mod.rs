pub mod decode;
pub mod metadata;
pub mod tempo;
pub mod trace;

use crate::error::ExportResult;
use crate::song::{Note, Region, Song};

/// Pattern/row location of the playback cursor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayPosition {
    pub pattern: usize,
    pub row: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelSnapshot {
    pub note: Note,
    pub volume: u8,
}

/// A playback simulator stepped one engine frame at a time.
pub trait FrameSource {
    /// Initialise playback. Returns false if the song cannot be played.
    fn begin(&mut self) -> bool;

    /// Play one frame, generating its audio. Returns false once the song has ended.
    fn advance(&mut self) -> bool;

    fn position(&self) -> PlayPosition;

    fn channel_count(&self) -> usize;

    fn channel_state(&self, channel: usize) -> ChannelSnapshot;

    /// Cumulative number of audio samples generated since `begin`.
    fn sample_count(&self) -> u64;
}

/// Audio engine able to simulate and render a song.
pub trait PlaybackEngine {
    fn sample_rate(&self) -> u32;

    fn frame_source(&self, song: &Song, region: Region) -> ExportResult<Box<dyn FrameSource + '_>>;

    /// Render the channels selected by `channel_mask` into one mono buffer.
    ///
    /// `max_samples` caps the rendered length when set.
    fn render_waveform(
        &self,
        song: &Song,
        region: Region,
        channel_mask: u64,
        max_samples: Option<u64>,
    ) -> ExportResult<Vec<i16>>;
}
