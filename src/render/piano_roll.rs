use super::{Canvas, Rgba};
use crate::song::{MUSICAL_NOTE_MAX, MUSICAL_NOTE_MIN};

/// Renders one channel's piano roll for a video frame.
///
/// The image is laid out with time along X and pitch along Y (higher notes
/// towards smaller Y). The compositor rotates it into its video column.
pub trait PianoRollRenderer {
    /// Height of one note lane in pixels.
    fn note_size_y(&self) -> u32;

    #[allow(clippy::too_many_arguments)]
    fn render_frame(
        &mut self,
        canvas: &mut dyn Canvas,
        channel: usize,
        pattern: usize,
        row: f32,
        scroll: f32,
        highlight_note: Option<i32>,
        highlight_color: Rgba,
    );
}

const BASE_NOTE_SIZE_Y: u32 = 12;
const BASE_ROW_WIDTH: f32 = 16.0;
const ROWS_PER_BEAT: u32 = 4;

const LANE_WHITE: Rgba = [46, 46, 50, 255];
const LANE_BLACK: Rgba = [34, 34, 38, 255];
const GRID_ROW: Rgba = [60, 60, 66, 255];
const GRID_BEAT: Rgba = [88, 88, 96, 255];
const PLAYHEAD: Rgba = [230, 230, 230, 255];

fn is_black_key(note: i32) -> bool {
    matches!((note - MUSICAL_NOTE_MIN).rem_euclid(12), 1 | 3 | 6 | 8 | 10)
}

/// Key lanes centred on the scroll note, a scrolling row grid and the current note lit up.
pub struct LanePianoRoll {
    note_size_y: u32,
    row_width: f32,
    thin_notes: bool,
}

impl LanePianoRoll {
    /// `zoom` doubles (or halves) lane height and row width per step, clamped to -2..=2.
    pub fn new(zoom: i32, thin_notes: bool) -> Self {
        let scale = 2f32.powi(zoom.clamp(-2, 2));
        Self {
            note_size_y: ((BASE_NOTE_SIZE_Y as f32 * scale).round() as u32).max(3),
            row_width: BASE_ROW_WIDTH * scale,
            thin_notes,
        }
    }

    fn lane_center_y(&self, note: i32, scroll: f32, height: f32) -> f32 {
        height * 0.5 - (note as f32 - scroll) * self.note_size_y as f32
    }
}

impl PianoRollRenderer for LanePianoRoll {
    fn note_size_y(&self) -> u32 {
        self.note_size_y
    }

    fn render_frame(
        &mut self,
        canvas: &mut dyn Canvas,
        _channel: usize,
        _pattern: usize,
        row: f32,
        scroll: f32,
        highlight_note: Option<i32>,
        highlight_color: Rgba,
    ) {
        let width = canvas.width() as f32;
        let height = canvas.height() as f32;
        let lane = self.note_size_y as f32;
        let playhead_x = (width / 8.0).round();

        canvas.clear(LANE_WHITE);

        let half_visible = (height / lane / 2.0).ceil() as i32 + 1;
        let center = scroll.round() as i32;
        let lo = (center - half_visible).max(MUSICAL_NOTE_MIN);
        let hi = (center + half_visible).min(MUSICAL_NOTE_MAX);
        for note in lo..=hi {
            if is_black_key(note) {
                let y = self.lane_center_y(note, scroll, height);
                canvas.fill_rect(0.0, y - lane * 0.5, width, y + lane * 0.5, LANE_BLACK);
            }
        }

        let first_row = (row - playhead_x / self.row_width).floor() as i64;
        let last_row = (row + (width - playhead_x) / self.row_width).ceil() as i64;
        for r in first_row..=last_row {
            let x = playhead_x + (r as f32 - row) * self.row_width;
            let color = if r.rem_euclid(ROWS_PER_BEAT as i64) == 0 {
                GRID_BEAT
            } else {
                GRID_ROW
            };
            canvas.draw_line(x, 0.0, x, height, 1.0, color);
        }

        if let Some(note) = highlight_note {
            let y = self.lane_center_y(note, scroll, height);
            let thickness = if self.thin_notes { lane * 0.5 } else { lane };
            canvas.fill_rect(
                0.0,
                y - thickness * 0.5,
                playhead_x + self.row_width,
                y + thickness * 0.5,
                highlight_color,
            );
        }

        canvas.draw_line(playhead_x, 0.0, playhead_x, height, 2.0, PLAYHEAD);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::canvas::CpuCanvas;

    #[test]
    fn zoom_scales_note_size() {
        assert_eq!(LanePianoRoll::new(0, false).note_size_y(), 12);
        assert_eq!(LanePianoRoll::new(2, false).note_size_y(), 48);
        assert_eq!(LanePianoRoll::new(-1, false).note_size_y(), 6);
        assert_eq!(LanePianoRoll::new(9, false).note_size_y(), 48);
    }

    #[test]
    fn black_keys_follow_the_octave() {
        // Note 1 is C.
        let black: Vec<i32> = (1..=12).filter(|&n| is_black_key(n)).collect();
        assert_eq!(black, vec![2, 4, 7, 9, 11]);
    }

    #[test]
    fn highlighted_note_is_drawn_at_the_scroll_centre() {
        let mut roll = LanePianoRoll::new(0, false);
        let mut canvas = CpuCanvas::new(160, 120);
        let color = [255, 0, 0, 255];
        roll.render_frame(&mut canvas, 0, 0, 3.5, 40.0, Some(40), color);

        let at = |x: u32, y: u32| {
            let idx = ((y * 160 + x) * 4) as usize;
            [canvas.pixels()[idx], canvas.pixels()[idx + 1], canvas.pixels()[idx + 2], canvas.pixels()[idx + 3]]
        };
        assert_eq!(at(5, 60), color);
        // Lanes are opaque everywhere.
        assert_eq!(at(150, 5)[3], 255);
    }
}
