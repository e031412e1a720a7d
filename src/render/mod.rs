pub mod bitmap;
pub mod canvas;
pub mod overlay;
pub mod piano_roll;
pub mod text;

pub use bitmap::Bitmap;

/// Straight RGBA colour.
pub type Rgba = [u8; 4];

pub const TRANSPARENT: Rgba = [0, 0, 0, 0];
pub const BLACK: Rgba = [0, 0, 0, 255];
pub const LIGHT_GREY: Rgba = [222, 222, 222, 255];
pub const MEDIUM_GREY: [u8; 3] = [160, 160, 160];
pub const DARK_GREY: [u8; 3] = [70, 70, 70];

/// How colour channels of a rendered image relate to its alpha.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AlphaMode {
    /// Colour is independent of alpha.
    #[default]
    Straight,
    /// Colour is already multiplied by alpha.
    Premultiplied,
}

/// 2D drawing surface producing RGBA8 pixels.
pub trait Canvas {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn clear(&mut self, color: Rgba);

    fn fill_rect(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba);

    fn fill_vertical_gradient(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, top: Rgba, bottom: Rgba);

    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, width: f32, color: Rgba);

    /// Anti-aliased one pixel wide polyline.
    fn draw_polyline(&mut self, points: &[[f32; 2]], color: Rgba);

    fn draw_bitmap(&mut self, bitmap: &Bitmap, x: f32, y: f32);

    fn measure_text(&self, text: &str) -> f32;

    /// Draw `text` with its top-left corner at `(x, y)`.
    fn draw_text(&mut self, text: &str, x: f32, y: f32, color: Rgba);

    /// Row-major RGBA8 pixels.
    fn pixels(&self) -> &[u8];

    fn alpha_mode(&self) -> AlphaMode;
}
