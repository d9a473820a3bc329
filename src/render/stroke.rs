//! Stroke rasterization using tiny-skia
//!
//! Strokes are drawn straight onto the overlay pixmap; nothing about a
//! stroke is kept beyond the pixels it leaves behind.

use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::domain::{Brush, Point};

/// Build the path for a single segment between two canvas points
fn build_segment_path(from: Point, to: Point) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(from.x, from.y);
    pb.line_to(to.x, to.y);
    pb.finish()
}

/// Draw a round-capped line segment from `from` to `to` onto `pixmap`
pub fn draw_segment(pixmap: &mut Pixmap, from: Point, to: Point, brush: &Brush) {
    let Some(path) = build_segment_path(from, to) else {
        return;
    };

    let [r, g, b, a] = brush.color.to_rgba_u8();
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;

    let stroke = Stroke {
        width: brush.size,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha_at(pixmap: &Pixmap, x: u32, y: u32) -> u8 {
        pixmap
            .pixel(x, y)
            .map(|p| p.alpha())
            .unwrap_or_default()
    }

    #[test]
    fn test_horizontal_segment_covers_its_path() {
        let mut pixmap = Pixmap::new(100, 100).unwrap();
        let brush = Brush::new(10.0, Default::default());
        draw_segment(
            &mut pixmap,
            Point::new(10.0, 10.0),
            Point::new(50.0, 10.0),
            &brush,
        );

        for x in 10..=50 {
            assert!(alpha_at(&pixmap, x, 10) > 0, "pixel ({x}, 10) not painted");
        }
        assert_eq!(alpha_at(&pixmap, 30, 40), 0);
        assert_eq!(alpha_at(&pixmap, 80, 10), 0);
    }

    #[test]
    fn test_round_cap_extends_past_endpoint() {
        let mut pixmap = Pixmap::new(100, 100).unwrap();
        let brush = Brush::new(10.0, Default::default());
        draw_segment(
            &mut pixmap,
            Point::new(20.0, 20.0),
            Point::new(40.0, 20.0),
            &brush,
        );

        // Cap radius is half the brush size
        assert!(alpha_at(&pixmap, 43, 20) > 0);
        assert_eq!(alpha_at(&pixmap, 48, 20), 0);
    }

    #[test]
    fn test_segment_uses_opaque_brush_color() {
        let mut pixmap = Pixmap::new(40, 40).unwrap();
        let brush = Brush::new(10.0, Default::default());
        draw_segment(
            &mut pixmap,
            Point::new(5.0, 20.0),
            Point::new(35.0, 20.0),
            &brush,
        );

        let px = pixmap.pixel(20, 20).unwrap();
        assert_eq!(px.alpha(), 255);
        assert_eq!((px.red(), px.green(), px.blue()), (0x32, 0xfb, 0x2c));
    }
}
