use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::bbox::BoundingBox;

pub const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const OUTLINE_WIDTH: i64 = 3;

#[derive(Debug, Clone)]
pub struct Overlay {
    pub image: RgbImage,
    /// False when any part of the box falls outside the frame.
    pub within_bounds: bool,
}

/// Draws the box on a copy of `original`; the original is left untouched.
///
/// Corners are inclusive and the outline grows inward. Inverted corners are
/// swapped; pixels outside the frame are skipped, never clamped onto the edge.
pub fn draw_bounding_box(original: &RgbImage, bbox: &BoundingBox) -> Overlay {
    let mut image = original.clone();
    let within_bounds = fits_within(&image, bbox);
    if !within_bounds {
        tracing::warn!(
            "Bounding box {} extends outside the {}x{} image",
            bbox,
            image.width(),
            image.height()
        );
    }

    draw_outline_mut(&mut image, bbox, OUTLINE_WIDTH, OUTLINE_COLOR);
    Overlay { image, within_bounds }
}

pub fn fits_within(image: &RgbImage, bbox: &BoundingBox) -> bool {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let (left, top, right, bottom) = normalized(bbox);
    left >= 0 && top >= 0 && right < w && bottom < h
}

pub fn draw_outline_mut(image: &mut RgbImage, bbox: &BoundingBox, width: i64, color: Rgb<u8>) {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let (left, top, right, bottom) = normalized(bbox);

    for inset in 0..width.max(1) {
        let (l, t, r, b) = (left + inset, top + inset, right - inset, bottom - inset);
        if l > r || t > b {
            break;
        }
        if r < 0 || b < 0 || l >= w || t >= h {
            continue;
        }

        // off-frame edges stay one pixel outside the frame, never on the border
        let (l, t) = (l.max(-1), t.max(-1));
        let (r, b) = (r.min(w), b.min(h));
        let rect = Rect::at(l as i32, t as i32).of_size((r - l + 1) as u32, (b - t + 1) as u32);
        draw_hollow_rect_mut(image, rect, color);
    }
}

// i64 keeps the inset arithmetic from overflowing at i32 extremes.
fn normalized(bbox: &BoundingBox) -> (i64, i64, i64, i64) {
    let (x1, y1, x2, y2) = (bbox.x1 as i64, bbox.y1 as i64, bbox.x2 as i64, bbox.y2 as i64);
    (x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKGROUND: Rgb<u8> = Rgb([0, 128, 0]);

    fn canvas(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, BACKGROUND)
    }

    #[test]
    fn test_outline_at_border_midpoints() {
        let original = canvas(100, 100);
        let overlay = draw_bounding_box(&original, &BoundingBox::new(10, 10, 50, 50));
        let img = &overlay.image;

        assert!(overlay.within_bounds);
        for (x, y) in [(30, 10), (30, 50), (10, 30), (50, 30)] {
            assert_eq!(*img.get_pixel(x, y), OUTLINE_COLOR, "border pixel ({}, {})", x, y);
        }
        // outline is three pixels thick, inward
        assert_eq!(*img.get_pixel(30, 12), OUTLINE_COLOR);
        assert_eq!(*img.get_pixel(30, 13), BACKGROUND);
        assert_eq!(*img.get_pixel(48, 30), OUTLINE_COLOR);
        assert_eq!(*img.get_pixel(47, 30), BACKGROUND);
        // interior and exterior untouched
        assert_eq!(*img.get_pixel(30, 30), BACKGROUND);
        assert_eq!(*img.get_pixel(9, 30), BACKGROUND);
        assert_eq!(*img.get_pixel(51, 30), BACKGROUND);
    }

    #[test]
    fn test_original_is_not_modified() {
        let original = canvas(20, 20);
        let _ = draw_bounding_box(&original, &BoundingBox::new(2, 2, 10, 10));
        assert!(original.pixels().all(|p| *p == BACKGROUND));
    }

    #[test]
    fn test_inverted_corners_draw_same_box() {
        let original = canvas(60, 60);
        let forward = draw_bounding_box(&original, &BoundingBox::new(10, 10, 50, 50));
        let inverted = draw_bounding_box(&original, &BoundingBox::new(50, 50, 10, 10));
        assert_eq!(forward.image, inverted.image);
    }

    #[test]
    fn test_partially_outside_box_is_clipped() {
        let original = canvas(40, 40);
        let overlay = draw_bounding_box(&original, &BoundingBox::new(20, 20, 500, 500));

        assert!(!overlay.within_bounds);
        assert_eq!(*overlay.image.get_pixel(30, 20), OUTLINE_COLOR);
        assert_eq!(*overlay.image.get_pixel(20, 30), OUTLINE_COLOR);
        // the far edges lie off-image and are not pulled onto the border
        assert_eq!(*overlay.image.get_pixel(39, 30), BACKGROUND);
        assert_eq!(*overlay.image.get_pixel(30, 39), BACKGROUND);
    }

    #[test]
    fn test_huge_partially_visible_box() {
        let original = canvas(40, 40);
        let overlay = draw_bounding_box(&original, &BoundingBox::new(5, 5, i32::MAX, i32::MAX));

        assert!(!overlay.within_bounds);
        assert_eq!(*overlay.image.get_pixel(20, 5), OUTLINE_COLOR);
        assert_eq!(*overlay.image.get_pixel(5, 39), OUTLINE_COLOR);
        assert_eq!(*overlay.image.get_pixel(39, 20), BACKGROUND);
        assert_eq!(*overlay.image.get_pixel(20, 39), BACKGROUND);
    }

    #[test]
    fn test_fully_outside_box_leaves_image_unchanged() {
        let original = canvas(40, 40);
        let overlay = draw_bounding_box(&original, &BoundingBox::new(100, 100, 200, 200));
        assert!(!overlay.within_bounds);
        assert_eq!(overlay.image, original);

        let extreme = BoundingBox::new(i32::MAX, 0, i32::MAX, i32::MAX);
        assert_eq!(draw_bounding_box(&original, &extreme).image, original);
    }

    #[test]
    fn test_degenerate_box_draws_a_line() {
        let original = canvas(20, 20);
        let overlay = draw_bounding_box(&original, &BoundingBox::new(5, 8, 15, 8));
        assert_eq!(*overlay.image.get_pixel(10, 8), OUTLINE_COLOR);
        assert_eq!(*overlay.image.get_pixel(10, 9), BACKGROUND);
    }
}
