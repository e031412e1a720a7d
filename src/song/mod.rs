pub mod note;

use serde::Deserialize;

pub use note::{MusicalNote, Note};

/// Lowest and highest note values the piano roll can represent (C0..B7).
pub const MUSICAL_NOTE_MIN: i32 = 1;
pub const MUSICAL_NOTE_MAX: i32 = 96;

/// Concert middle C.
pub const NOTE_C4: i32 = 49;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Square1,
    Square2,
    Triangle,
    Noise,
    Dpcm,
}

impl ChannelKind {
    pub fn default_name(self) -> &'static str {
        match self {
            ChannelKind::Square1 => "Square 1",
            ChannelKind::Square2 => "Square 2",
            ChannelKind::Triangle => "Triangle",
            ChannelKind::Noise => "Noise",
            ChannelKind::Dpcm => "DPCM",
        }
    }

    /// Tint used for the generated icon tile when no icon image is supplied.
    pub fn icon_tint(self) -> [u8; 3] {
        match self {
            ChannelKind::Square1 | ChannelKind::Square2 => [94, 178, 255],
            ChannelKind::Triangle => [255, 170, 72],
            ChannelKind::Noise => [200, 200, 200],
            ChannelKind::Dpcm => [170, 120, 255],
        }
    }
}

#[derive(Clone, Debug)]
pub struct Channel {
    pub name: String,
    pub kind: ChannelKind,
    pub icon: Option<std::path::PathBuf>,
}

/// How the tempo engine advances rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempoMode {
    /// One row every fixed number of frames.
    #[default]
    Fixed,
    /// Speed/tempo driven; several frames may share a row unevenly.
    Variable,
}

/// Regional timing family; selects the engine frame rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    #[default]
    Ntsc,
    Pal,
}

impl Region {
    /// Exact engine frame rate as a rational `(numerator, denominator)`.
    pub fn frame_rate(self) -> (u64, u64) {
        match self {
            Region::Ntsc => (6_009_883, 100_000),
            Region::Pal => (5_000_773, 100_000),
        }
    }

    /// Frame rate formatted the way the encoder takes it on the command line.
    pub fn frame_rate_arg(self) -> String {
        let (num, den) = self.frame_rate();
        format!("{}/{}", num, den)
    }

    pub fn samples_per_frame(self, sample_rate: u32) -> f64 {
        let (num, den) = self.frame_rate();
        sample_rate as f64 * den as f64 / num as f64
    }
}

#[derive(Clone, Debug)]
pub struct Song {
    pub name: String,
    pub channels: Vec<Channel>,
    pub tempo_mode: TempoMode,
    pub region: Region,
}

impl Song {
    pub fn uses_variable_tempo(&self) -> bool {
        self.tempo_mode == TempoMode::Variable
    }

    /// Indices of the song channels selected by `mask`, in channel order.
    pub fn selected_channels(&self, mask: u64) -> Vec<usize> {
        (0..self.channels.len().min(64))
            .filter(|&i| mask & (1u64 << i) != 0)
            .collect()
    }
}
