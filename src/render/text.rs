use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};
use std::path::Path;

pub struct TextRenderer {
    font: Font,
    font_size: f32,
}

impl TextRenderer {
    pub fn from_file(path: &Path, font_size: f32) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read font: {}", path.display()))?;
        Self::from_bytes(&bytes, font_size)
    }

    pub fn from_bytes(bytes: &[u8], font_size: f32) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| anyhow::anyhow!("Failed to parse font: {}", e))?;
        Ok(Self { font, font_size })
    }

    /// Rasterize `text` with its top-left at `(x, y)`, calling `plot(px, py, coverage)` per covered pixel.
    pub fn rasterize(&self, text: &str, x: i32, y: i32, mut plot: impl FnMut(i32, i32, u8)) {
        let mut cursor_x = x as f32;
        for ch in text.chars() {
            let (metrics, bitmap) = self.font.rasterize(ch, self.font_size);
            let glyph_x = cursor_x.round() as i32 + metrics.xmin;
            let glyph_y = y + self.font_size as i32 - metrics.height as i32 - metrics.ymin;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage == 0 {
                        continue;
                    }
                    plot(glyph_x + gx as i32, glyph_y + gy as i32, coverage);
                }
            }

            cursor_x += metrics.advance_width;
        }
    }

    /// Measure the width of rendered text in pixels.
    pub fn measure_width(&self, text: &str) -> f32 {
        text.chars()
            .map(|ch| self.font.metrics(ch, self.font_size).advance_width)
            .sum::<f32>()
            .ceil()
    }
}
