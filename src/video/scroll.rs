//! Camera scroll for the per-channel piano rolls.
//!
//! Each channel's frames are split into segments within which every sounding
//! note fits in the view. Segments that are too short get absorbed by a
//! neighbour, each segment scrolls to the middle of its note range, and the
//! last frames of a segment ease into the next one.

use crate::playback::metadata::FrameMetadata;
use crate::song::{MusicalNote, MUSICAL_NOTE_MAX, MUSICAL_NOTE_MIN, NOTE_C4};

pub const SEGMENT_TRANSITION_FRAMES: usize = 16;
pub const MIN_SEGMENT_FRAMES: usize = SEGMENT_TRANSITION_FRAMES * 2;
/// A segment this old is split at the next pattern start, roughly 10 seconds.
pub const STALE_SEGMENT_FRAMES: usize = 600;

#[derive(Clone, Debug, PartialEq)]
pub struct ScrollSegment {
    pub start_frame: usize,
    pub end_frame: usize,
    pub min_note: i32,
    pub max_note: i32,
    pub scroll: f32,
}

impl ScrollSegment {
    pub fn num_frames(&self) -> usize {
        self.end_frame - self.start_frame
    }
}

/// Note range a sounding note needs to stay visible.
///
/// Slides and arpeggios only widen the range when they span less than half
/// the view, large ones are left to go off screen.
pub fn note_span(note: &MusicalNote, num_visible_notes: i32) -> (i32, i32) {
    let value = note.value;
    let mut span = (value - 1, value + 1);

    if let Some(target) = note.slide_target {
        if (target - value).abs() < num_visible_notes / 2 {
            span = (value.min(target) - 1, value.max(target) + 1);
        }
    }

    if let Some((min_arp, max_arp)) = note.arpeggio.as_ref().and_then(|a| a.min_max_offset()) {
        if max_arp - min_arp < num_visible_notes / 2 {
            span = (value + min_arp, value + max_arp);
        }
    }

    span
}

struct OpenSegment {
    start_frame: usize,
    span: Option<(i32, i32)>,
}

/// Split one channel's frames into segments whose notes fit in the view.
pub fn build_segments(
    frames: &[FrameMetadata],
    channel: usize,
    num_visible_notes: usize,
) -> Vec<ScrollSegment> {
    let visible = num_visible_notes as i32;
    let mut segments = Vec::new();
    let mut current = OpenSegment {
        start_frame: 0,
        span: None,
    };

    for (f, frame) in frames.iter().enumerate() {
        let Some(note) = frame.channel_notes.get(channel).and_then(|n| n.as_musical()) else {
            continue;
        };

        let (lo, hi) = note_span(note, visible);

        let Some((min, max)) = current.span else {
            current.span = Some((lo, hi));
            continue;
        };

        let pattern_start = frame.row_position == 0.0;
        let stale = pattern_start && f - current.start_frame >= STALE_SEGMENT_FRAMES;
        let new_min = min.min(lo);
        let new_max = max.max(hi);

        if stale || new_max - new_min + 1 > visible {
            segments.push(ScrollSegment {
                start_frame: current.start_frame,
                end_frame: f,
                min_note: min,
                max_note: max,
                scroll: 0.0,
            });
            current = OpenSegment {
                start_frame: f,
                span: Some((lo, hi)),
            };
        } else {
            current.span = Some((new_min, new_max));
        }
    }

    // A channel with no notes at all sits on middle C.
    let (min_note, max_note) = current.span.unwrap_or((NOTE_C4, NOTE_C4));
    segments.push(ScrollSegment {
        start_frame: current.start_frame,
        end_frame: frames.len(),
        min_note,
        max_note,
        scroll: 0.0,
    });

    segments
}

/// Absorb segments shorter than [`MIN_SEGMENT_FRAMES`] into their longer neighbour.
///
/// Only the frame range of the neighbour grows; its note range is kept.
pub fn merge_short_segments(segments: &mut Vec<ScrollSegment>) {
    while segments.len() > 1 {
        let Some((idx, shortest)) = segments
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| s.num_frames())
            .map(|(i, s)| (i, s.num_frames()))
        else {
            break;
        };

        if shortest >= MIN_SEGMENT_FRAMES {
            break;
        }

        let target = if idx == 0 {
            1
        } else if idx + 1 < segments.len()
            && segments[idx + 1].num_frames() > segments[idx - 1].num_frames()
        {
            idx + 1
        } else {
            idx - 1
        };

        let absorbed = segments.remove(idx);
        let target = if target > idx { target - 1 } else { target };
        let seg = &mut segments[target];
        seg.start_frame = seg.start_frame.min(absorbed.start_frame);
        seg.end_frame = seg.end_frame.max(absorbed.end_frame);
    }
}

/// Centre each segment on its note range, keeping the view inside the playable notes.
pub fn resolve_scroll(segments: &mut [ScrollSegment], num_visible_notes: usize) {
    let half_view = num_visible_notes as f32 * 0.5;
    let mut min_scroll = (MUSICAL_NOTE_MIN as f32 + half_view).ceil();
    let mut max_scroll = (MUSICAL_NOTE_MAX as f32 - half_view).floor();

    if max_scroll < min_scroll {
        // View is taller than the whole note range.
        let mid = (MUSICAL_NOTE_MIN + MUSICAL_NOTE_MAX) as f32 * 0.5;
        min_scroll = mid;
        max_scroll = mid;
    }

    for segment in segments.iter_mut() {
        let mid = segment.min_note as f32 + (segment.max_note - segment.min_note) as f32 * 0.5;
        segment.scroll = mid.clamp(min_scroll, max_scroll);
    }
}

fn smooth_step(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Write per-frame scroll values for `channel`, easing over the last frames of each segment.
pub fn write_scroll(frames: &mut [FrameMetadata], channel: usize, segments: &[ScrollSegment]) {
    let num_channels = frames.first().map_or(0, |f| f.channel_notes.len());

    for frame in frames.iter_mut() {
        if frame.channel_scroll.len() < num_channels.max(channel + 1) {
            frame.channel_scroll.resize(num_channels.max(channel + 1), 0.0);
        }
    }

    for (s, segment) in segments.iter().enumerate() {
        let next = segments.get(s + 1);
        let hold_end = match next {
            Some(_) => segment
                .end_frame
                .saturating_sub(SEGMENT_TRANSITION_FRAMES)
                .max(segment.start_frame),
            None => segment.end_frame,
        };

        for frame in &mut frames[segment.start_frame..hold_end] {
            frame.channel_scroll[channel] = segment.scroll;
        }

        if let Some(next) = next {
            let window_start = segment.end_frame - SEGMENT_TRANSITION_FRAMES.min(segment.end_frame);
            for f in window_start.max(segment.start_frame)..segment.end_frame {
                let t = (f - window_start) as f32 / SEGMENT_TRANSITION_FRAMES as f32;
                let eased = smooth_step(t);
                frames[f].channel_scroll[channel] = segment.scroll + (next.scroll - segment.scroll) * eased;
            }
        }
    }
}

/// Compute `channel_scroll` for every channel selected by `channel_mask`.
pub fn compute_channels_scroll(frames: &mut [FrameMetadata], channel_mask: u64, num_visible_notes: usize) {
    let Some(first) = frames.first() else {
        return;
    };
    let num_channels = first.channel_notes.len();

    for channel in 0..num_channels.min(64) {
        if channel_mask & (1u64 << channel) == 0 {
            continue;
        }

        let mut segments = build_segments(frames, channel, num_visible_notes);
        let before = segments.len();
        merge_short_segments(&mut segments);
        resolve_scroll(&mut segments, num_visible_notes);
        write_scroll(frames, channel, &segments);

        log::debug!(
            "Channel {}: {} scroll segments ({} before merging)",
            channel,
            segments.len(),
            before
        );
    }
}
