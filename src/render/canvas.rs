use super::text::TextRenderer;
use super::{AlphaMode, Bitmap, Canvas, Rgba};

/// Software RGBA8 surface. Keeps straight alpha and composites with source-over.
pub struct CpuCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    text: Option<TextRenderer>,
}

impl CpuCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
            text: None,
        }
    }

    pub fn with_text(mut self, text: TextRenderer) -> Self {
        self.text = Some(text);
        self
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let src_a = color[3] as f32 / 255.0 * coverage.clamp(0.0, 1.0);
        if src_a <= 0.0 {
            return;
        }

        let idx = ((y as u32 * self.width + x as u32) * 4) as usize;
        let dst = &mut self.pixels[idx..idx + 4];

        if src_a >= 1.0 {
            dst.copy_from_slice(&[color[0], color[1], color[2], 255]);
            return;
        }

        let dst_a = dst[3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        for c in 0..3 {
            let blended = (color[c] as f32 * src_a + dst[c] as f32 * dst_a * (1.0 - src_a)) / out_a;
            dst[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = (out_a * 255.0).round() as u8;
    }

    fn pixel_span(&self, v0: f32, v1: f32, limit: u32) -> (i32, i32) {
        let a = v0.min(v1).round().max(0.0) as i32;
        let b = v0.max(v1).round().min(limit as f32) as i32;
        (a, b)
    }

    /// Wu-style line: two pixels per step, coverage split across the minor axis.
    fn draw_thin_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba) {
        let dx = x1 - x0;
        let dy = y1 - y0;
        let steep = dy.abs() > dx.abs();
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i32;

        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = x0 + dx * t;
            let y = y0 + dy * t;
            if steep {
                let fx = x.floor();
                let frac = x - fx;
                self.blend_pixel(fx as i32, y.round() as i32, color, 1.0 - frac);
                self.blend_pixel(fx as i32 + 1, y.round() as i32, color, frac);
            } else {
                let fy = y.floor();
                let frac = y - fy;
                self.blend_pixel(x.round() as i32, fy as i32, color, 1.0 - frac);
                self.blend_pixel(x.round() as i32, fy as i32 + 1, color, frac);
            }
        }
    }
}

impl Canvas for CpuCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self, color: Rgba) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    fn fill_rect(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba) {
        let (xa, xb) = self.pixel_span(x0, x1, self.width);
        let (ya, yb) = self.pixel_span(y0, y1, self.height);
        if color[3] == 255 {
            for y in ya..yb {
                let row = (y as u32 * self.width) as usize * 4;
                for x in xa..xb {
                    let idx = row + x as usize * 4;
                    self.pixels[idx..idx + 4].copy_from_slice(&color);
                }
            }
            return;
        }
        for y in ya..yb {
            for x in xa..xb {
                self.blend_pixel(x, y, color, 1.0);
            }
        }
    }

    fn fill_vertical_gradient(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, top: Rgba, bottom: Rgba) {
        let (xa, xb) = self.pixel_span(x0, x1, self.width);
        let (ya, yb) = self.pixel_span(y0, y1, self.height);
        let span = (y1 - y0).abs().max(1.0);
        for y in ya..yb {
            let t = ((y as f32 + 0.5 - y0.min(y1)) / span).clamp(0.0, 1.0);
            let color: Rgba = std::array::from_fn(|c| {
                (top[c] as f32 + (bottom[c] as f32 - top[c] as f32) * t).round() as u8
            });
            for x in xa..xb {
                self.blend_pixel(x, y, color, 1.0);
            }
        }
    }

    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, width: f32, color: Rgba) {
        if width <= 1.5 {
            self.draw_thin_line(x0, y0, x1, y1, color);
            return;
        }
        let half = width * 0.5;
        if x0 == x1 {
            self.fill_rect(x0 - half, y0, x0 + half, y1, color);
        } else if y0 == y1 {
            self.fill_rect(x0, y0 - half, x1, y0 + half, color);
        } else {
            let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil() as i32;
            for i in 0..=steps {
                let t = i as f32 / steps.max(1) as f32;
                let x = x0 + (x1 - x0) * t;
                let y = y0 + (y1 - y0) * t;
                self.fill_rect(x - half, y - half, x + half, y + half, color);
            }
        }
    }

    fn draw_polyline(&mut self, points: &[[f32; 2]], color: Rgba) {
        for seg in points.windows(2) {
            self.draw_thin_line(seg[0][0], seg[0][1], seg[1][0], seg[1][1], color);
        }
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, x: f32, y: f32) {
        let ox = x.round() as i32;
        let oy = y.round() as i32;
        for by in 0..bitmap.height {
            for bx in 0..bitmap.width {
                let px = bitmap.pixel(bx, by);
                self.blend_pixel(ox + bx as i32, oy + by as i32, px, 1.0);
            }
        }
    }

    fn measure_text(&self, text: &str) -> f32 {
        self.text.as_ref().map_or(0.0, |t| t.measure_width(text))
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, color: Rgba) {
        let Some(renderer) = self.text.take() else {
            return;
        };
        renderer.rasterize(text, x.round() as i32, y.round() as i32, |px, py, coverage| {
            self.blend_pixel(px, py, color, coverage as f32 / 255.0);
        });
        self.text = Some(renderer);
    }

    fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn alpha_mode(&self) -> AlphaMode {
        AlphaMode::Straight
    }
}
