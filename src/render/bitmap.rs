use anyhow::{Context, Result};
use std::path::Path;

/// Straight-alpha RGBA8 image.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Bitmap {
    pub fn load(path: &Path) -> Result<Self> {
        let img = image::open(path)
            .with_context(|| format!("Failed to load image: {}", path.display()))?
            .to_rgba8();
        Ok(Self {
            width: img.width(),
            height: img.height(),
            pixels: img.into_raw(),
        })
    }

    /// Rounded tile with a darker border, used when a channel has no icon image.
    pub fn tile(size: u32, tint: [u8; 3]) -> Self {
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        let border = (size / 8).max(1);
        for y in 0..size {
            for x in 0..size {
                let corner = (x < border || x >= size - border) && (y < border || y >= size - border);
                let edge = x < border || y < border || x >= size - border || y >= size - border;
                let [r, g, b] = if edge {
                    tint.map(|c| c / 2)
                } else {
                    tint
                };
                pixels.extend_from_slice(&[r, g, b, if corner { 0 } else { 255 }]);
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_has_transparent_corners_and_opaque_centre() {
        let tile = Bitmap::tile(32, [100, 200, 50]);
        assert_eq!(tile.pixels.len(), 32 * 32 * 4);
        assert_eq!(tile.pixel(0, 0)[3], 0);
        assert_eq!(tile.pixel(16, 16), [100, 200, 50, 255]);
        assert_eq!(tile.pixel(0, 16), [50, 100, 25, 255]);
    }
}
