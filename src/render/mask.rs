//! Mask derivation from the overlay layer
//!
//! Both outputs are computed from the overlay's alpha channel only, so the
//! brush color never leaks into the exported artifacts.

use image::{Rgba, RgbaImage};
use tiny_skia::Pixmap;

const STENCIL_PAINTED: Rgba<u8> = Rgba([255, 255, 255, 255]);
const STENCIL_CLEAR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Background with painted regions erased (destination-out compositing)
///
/// Output alpha is `bg_alpha * (255 - overlay_alpha) / 255`; color channels
/// are kept as-is. Both inputs must have the same dimensions.
pub fn cutout(background: &RgbaImage, overlay: &Pixmap) -> RgbaImage {
    debug_assert_eq!(background.dimensions(), (overlay.width(), overlay.height()));

    let mut out = background.clone();
    for (pixel, src) in out.pixels_mut().zip(overlay.pixels()) {
        let erase = u32::from(src.alpha());
        if erase == 0 {
            continue;
        }
        let keep = 255 - erase;
        pixel[3] = ((u32::from(pixel[3]) * keep + 127) / 255) as u8;
    }
    out
}

/// Black/white stencil: white wherever the overlay has any alpha
pub fn stencil(overlay: &Pixmap) -> RgbaImage {
    let width = overlay.width();
    let mut out = RgbaImage::from_pixel(width, overlay.height(), STENCIL_CLEAR);
    for (pixel, src) in out.pixels_mut().zip(overlay.pixels()) {
        if src.alpha() > 0 {
            *pixel = STENCIL_PAINTED;
        }
    }
    out
}

/// Convert a premultiplied pixmap into a straight-alpha image
pub fn pixmap_to_rgba(pixmap: &Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (pixel, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *pixel = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

/// Background with the overlay drawn on top, as shown on screen
pub fn composite(background: &RgbaImage, overlay: &Pixmap) -> RgbaImage {
    let mut out = background.clone();
    image::imageops::overlay(&mut out, &pixmap_to_rgba(overlay), 0, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::{Paint, Rect, Transform};

    fn painted_overlay(w: u32, h: u32, rect: Rect, alpha: u8) -> Pixmap {
        let mut pixmap = Pixmap::new(w, h).unwrap();
        let mut paint = Paint::default();
        paint.set_color_rgba8(0x32, 0xfb, 0x2c, alpha);
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        pixmap
    }

    fn gradient_background(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 10) as u8, (y * 10) as u8, 128, 255]))
    }

    #[test]
    fn test_empty_overlay_gives_black_stencil_and_untouched_cutout() {
        let background = gradient_background(8, 6);
        let overlay = Pixmap::new(8, 6).unwrap();

        assert_eq!(cutout(&background, &overlay), background);
        assert!(stencil(&overlay).pixels().all(|p| *p == STENCIL_CLEAR));
    }

    #[test]
    fn test_opaque_paint_erases_background() {
        let background = gradient_background(8, 6);
        let rect = Rect::from_xywh(2.0, 2.0, 3.0, 2.0).unwrap();
        let overlay = painted_overlay(8, 6, rect, 255);

        let out = cutout(&background, &overlay);
        assert_eq!(out.get_pixel(3, 3)[3], 0);
        assert_eq!(out.get_pixel(3, 3)[0], background.get_pixel(3, 3)[0]);
        assert_eq!(out.get_pixel(0, 0), background.get_pixel(0, 0));

        let mask = stencil(&overlay);
        assert_eq!(*mask.get_pixel(3, 3), STENCIL_PAINTED);
        assert_eq!(*mask.get_pixel(0, 0), STENCIL_CLEAR);
    }

    #[test]
    fn test_partial_alpha_is_binarized_to_white() {
        let rect = Rect::from_xywh(0.0, 0.0, 2.0, 2.0).unwrap();
        let overlay = painted_overlay(4, 4, rect, 10);

        let mask = stencil(&overlay);
        assert_eq!(*mask.get_pixel(1, 1), STENCIL_PAINTED);
        assert_eq!(*mask.get_pixel(3, 3), STENCIL_CLEAR);

        // Partial erase leaves most of the background alpha
        let out = cutout(&gradient_background(4, 4), &overlay);
        let alpha = out.get_pixel(1, 1)[3];
        assert!((240..255).contains(&alpha), "alpha was {alpha}");
    }

    #[test]
    fn test_composite_shows_brush_over_background() {
        let background = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let rect = Rect::from_xywh(0.0, 0.0, 1.0, 1.0).unwrap();
        let overlay = painted_overlay(4, 4, rect, 255);

        let out = composite(&background, &overlay);
        assert_eq!(*out.get_pixel(0, 0), Rgba([0x32, 0xfb, 0x2c, 255]));
        assert_eq!(*out.get_pixel(2, 2), Rgba([0, 0, 0, 255]));
    }
}
