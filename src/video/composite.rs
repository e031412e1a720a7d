//! CPU compositing of the overlay and the per-channel piano rolls into the
//! ARGB frames the encoder consumes.
//!
//! Channel images are rendered with time along X, so they are `video_height`
//! wide and one column wide in Y. They are rotated into their column here.

use crate::error::{ExportError, ExportResult};
use crate::render::AlphaMode;

/// Splits the video width into equal, rounded channel columns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnLayout {
    pub video_width: u32,
    pub video_height: u32,
    pub num_columns: usize,
    column_width_f: f32,
    column_width: u32,
}

impl ColumnLayout {
    pub fn new(video_width: u32, video_height: u32, num_columns: usize) -> Self {
        let column_width_f = video_width as f32 / num_columns.max(1) as f32;
        Self {
            video_width,
            video_height,
            num_columns,
            column_width_f,
            column_width: column_width_f as u32,
        }
    }

    /// First pixel column of `column`. `column == num_columns` gives the right edge.
    pub fn column_start(&self, column: usize) -> u32 {
        ((column as f32 * self.column_width_f).round_ties_even() as u32).min(self.video_width)
    }

    /// One past the last pixel column `column` covers.
    pub fn column_end(&self, column: usize) -> u32 {
        (self.column_start(column) + self.column_width).min(self.video_width)
    }

    pub fn column_width(&self) -> u32 {
        self.column_width
    }

    /// `(width, height)` of a channel image before rotation.
    pub fn channel_image_size(&self) -> (u32, u32) {
        (self.video_height, self.column_width)
    }

    pub fn frame_bytes(&self) -> usize {
        self.video_width as usize * self.video_height as usize * 4
    }
}

#[inline]
fn blend(channel: u8, overlay: u8, alpha: u8, mode: AlphaMode) -> u8 {
    let c = channel as u32;
    let o = overlay as u32;
    let a = alpha as u32;
    let v = match mode {
        AlphaMode::Straight => (c * (255 - a) + o * a) >> 8,
        AlphaMode::Premultiplied => (c * (255 - a) + o * 255) >> 8,
    };
    v.min(255) as u8
}

pub struct FrameCompositor {
    layout: ColumnLayout,
    alpha_mode: AlphaMode,
    output: Vec<u8>,
    covered: Vec<bool>,
}

impl FrameCompositor {
    pub fn new(layout: ColumnLayout, alpha_mode: AlphaMode) -> Self {
        Self {
            layout,
            alpha_mode,
            output: vec![0; layout.frame_bytes()],
            covered: vec![false; layout.video_width as usize],
        }
    }

    /// Start a new frame: no column has been blended yet.
    pub fn begin_frame(&mut self) {
        self.covered.iter_mut().for_each(|c| *c = false);
    }

    /// Blend one rotated channel image under the overlay into its column.
    pub fn composite_channel(&mut self, overlay: &[u8], column: usize, image: &[u8]) -> ExportResult<()> {
        let layout = self.layout;
        if overlay.len() != layout.frame_bytes() {
            return Err(ExportError::render(format!(
                "overlay is {} bytes, expected {}",
                overlay.len(),
                layout.frame_bytes()
            )));
        }
        let (image_w, image_h) = layout.channel_image_size();
        let image_w = image_w as usize;
        let image_h = image_h as usize;
        if image.len() != image_w * image_h * 4 {
            return Err(ExportError::render(format!(
                "channel image is {} bytes, expected {}",
                image.len(),
                image_w * image_h * 4
            )));
        }
        if column >= layout.num_columns {
            return Err(ExportError::render(format!("column {column} out of range")));
        }

        let start = layout.column_start(column) as usize;
        let end = layout.column_end(column) as usize;
        let video_w = layout.video_width as usize;

        for row in 0..image_w {
            for local_x in 0..end - start {
                let dst = (row * video_w + start + local_x) * 4;
                let src = ((image_h - local_x - 1) * image_w + (image_w - row - 1)) * 4;

                let alpha = overlay[dst + 3];
                let mut rgb = [image[src], image[src + 1], image[src + 2]];
                if alpha != 0 {
                    for c in 0..3 {
                        rgb[c] = blend(rgb[c], overlay[dst + c], alpha, self.alpha_mode);
                    }
                }

                self.output[dst..dst + 4].copy_from_slice(&[255, rgb[0], rgb[1], rgb[2]]);
            }
        }

        self.covered[start..end].iter_mut().for_each(|c| *c = true);
        Ok(())
    }

    /// Fill pixel columns that no rounded column region reached with their
    /// nearest blended neighbour, left first.
    pub fn fix_seams(&mut self) {
        let video_w = self.layout.video_width as usize;
        for x in 0..video_w {
            if self.covered[x] {
                continue;
            }
            let source = (0..x)
                .rev()
                .find(|&i| self.covered[i])
                .or_else(|| (x + 1..video_w).find(|&i| self.covered[i]));
            let Some(source) = source else {
                continue;
            };
            log::trace!("Filling seam column {x} from column {source}");
            for row in 0..self.layout.video_height as usize {
                let base = row * video_w * 4;
                self.output
                    .copy_within(base + source * 4..base + source * 4 + 4, base + x * 4);
            }
        }
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }
}
