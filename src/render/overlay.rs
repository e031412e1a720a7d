//! Full-screen overlay drawn above the piano rolls: header gradient, channel
//! labels, column dividers and oscilloscopes.

use super::{Bitmap, Canvas, BLACK, LIGHT_GREY, TRANSPARENT};
use crate::video::composite::ColumnLayout;
use crate::video::oscilloscope::ScopeRect;

pub const GRADIENT_HEIGHT: f32 = 300.0;
pub const ICON_TEXT_SPACING: f32 = 8.0;
pub const ICON_POS_Y: f32 = 26.0;
pub const TEXT_POS_Y: f32 = 30.0;
pub const DIVIDER_WIDTH: f32 = 5.0;
pub const SCOPE_TOP: f32 = 60.0;
pub const SCOPE_BOTTOM: f32 = 160.0;
pub const SCOPE_PADDING_X: f32 = 10.0;

pub struct OverlayLabel<'a> {
    pub column: usize,
    pub name: &'a str,
    pub icon: &'a Bitmap,
    /// Oscilloscope polyline in screen coordinates.
    pub scope: &'a [[f32; 2]],
}

/// Rectangle the oscilloscope of `column` is drawn into.
pub fn scope_rect(layout: &ColumnLayout, column: usize) -> ScopeRect {
    ScopeRect {
        min_x: layout.column_start(column) as f32 + SCOPE_PADDING_X,
        min_y: SCOPE_TOP,
        max_x: layout.column_start(column + 1) as f32 - SCOPE_PADDING_X,
        max_y: SCOPE_BOTTOM,
    }
}

/// Paint one overlay frame.
pub fn paint_overlay(canvas: &mut dyn Canvas, layout: &ColumnLayout, labels: &[OverlayLabel<'_>]) {
    let width = canvas.width() as f32;
    let height = canvas.height() as f32;

    canvas.clear(TRANSPARENT);
    canvas.fill_vertical_gradient(0.0, 0.0, width, GRADIENT_HEIGHT, BLACK, TRANSPARENT);

    for label in labels {
        let x0 = layout.column_start(label.column) as f32;
        let icon_w = label.icon.width as f32;
        let icon_h = label.icon.height as f32;

        let text_w = canvas.measure_text(label.name);
        let icon_x = (x0 + layout.column_width() as f32 / 2.0 - (text_w + icon_w + ICON_TEXT_SPACING) / 2.0).round();

        canvas.fill_rect(icon_x, ICON_POS_Y, icon_x + icon_w, ICON_POS_Y + icon_h, LIGHT_GREY);
        canvas.draw_bitmap(label.icon, icon_x, ICON_POS_Y);
        canvas.draw_text(label.name, icon_x + icon_w + ICON_TEXT_SPACING, TEXT_POS_Y, LIGHT_GREY);

        if label.column > 0 {
            canvas.draw_line(x0, 0.0, x0, height, DIVIDER_WIDTH, BLACK);
        }

        canvas.draw_polyline(label.scope, LIGHT_GREY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::canvas::CpuCanvas;

    #[test]
    fn scope_rect_is_padded_inside_its_column() {
        let layout = ColumnLayout::new(1920, 1080, 2);
        let rect = scope_rect(&layout, 1);
        assert_eq!(rect.min_x, 970.0);
        assert_eq!(rect.max_x, 1910.0);
        assert_eq!((rect.min_y, rect.max_y), (SCOPE_TOP, SCOPE_BOTTOM));
    }

    #[test]
    fn overlay_is_transparent_below_the_header() {
        let layout = ColumnLayout::new(200, 400, 2);
        let mut canvas = CpuCanvas::new(200, 400);
        let icon = Bitmap::tile(16, [255, 0, 0]);
        let left = [[10.0, 110.0], [90.0, 110.0]];
        let right = [[110.0, 110.0], [190.0, 110.0]];
        let labels = [
            OverlayLabel { column: 0, name: "A", icon: &icon, scope: &left },
            OverlayLabel { column: 1, name: "B", icon: &icon, scope: &right },
        ];
        paint_overlay(&mut canvas, &layout, &labels);

        let alpha = |x: u32, y: u32| canvas.pixels()[((y * 200 + x) * 4 + 3) as usize];
        assert_eq!(alpha(50, 350), 0);
        // Divider at the start of the second column.
        assert_eq!(alpha(100, 350), 255);
        // Oscilloscope line.
        assert_eq!(alpha(50, 110), 255);
        // Header gradient.
        assert!(alpha(50, 5) > 200);
    }
}
