use serde::Deserialize;

use super::{MUSICAL_NOTE_MAX, MUSICAL_NOTE_MIN};

/// Chord offsets cycled by an arpeggio, relative to the base note.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Arpeggio {
    pub offsets: Vec<i32>,
}

impl Arpeggio {
    /// Smallest and largest offset reached by the chord, including the root.
    pub fn min_max_offset(&self) -> Option<(i32, i32)> {
        if self.offsets.is_empty() {
            return None;
        }
        let min = self.offsets.iter().copied().fold(0, i32::min);
        let max = self.offsets.iter().copied().fold(0, i32::max);
        Some((min, max))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MusicalNote {
    pub value: i32,
    #[serde(default)]
    pub slide_target: Option<i32>,
    #[serde(default)]
    pub arpeggio: Option<Arpeggio>,
    #[serde(default)]
    pub instrument_color: Option<[u8; 3]>,
}

#[cfg(test)]
impl MusicalNote {
    pub fn new(value: i32) -> Self {
        Self {
            value,
            slide_target: None,
            arpeggio: None,
            instrument_color: None,
        }
    }

    pub fn with_slide(mut self, target: i32) -> Self {
        self.slide_target = Some(target);
        self
    }

    pub fn with_arpeggio(mut self, offsets: &[i32]) -> Self {
        self.arpeggio = Some(Arpeggio {
            offsets: offsets.to_vec(),
        });
        self
    }
}

/// State of a channel's current note at one engine frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Note {
    #[default]
    Rest,
    Stop,
    Release,
    Musical(MusicalNote),
}

impl Note {
    #[cfg(test)]
    pub fn musical(value: i32) -> Self {
        Note::Musical(MusicalNote::new(value))
    }

    /// The note if it is a real pitched note within the representable range.
    pub fn as_musical(&self) -> Option<&MusicalNote> {
        match self {
            Note::Musical(n) if (MUSICAL_NOTE_MIN..=MUSICAL_NOTE_MAX).contains(&n.value) => Some(n),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_musical(&self) -> bool {
        self.as_musical().is_some()
    }
}
