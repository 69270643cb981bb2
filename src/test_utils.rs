//! Test utilities for imageops-matte
//!
//! Synthetic frames with a known background layout. Only compiled for tests.

use image::Rgba;
use imageproc::definitions::Image;

pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
/// Default key color #00FD21, opaque
pub const CHROMA_GREEN: Rgba<u8> = Rgba([0, 253, 33, 255]);

/// Creates a frame whose outer `ring_width` pixels are `outer` and whose
/// interior is `inner`.
///
/// A ring wider than half the frame fills it completely with `outer`.
pub fn create_ring_image(
    width: u32,
    height: u32,
    ring_width: u32,
    outer: Rgba<u8>,
    inner: Rgba<u8>,
) -> Image<Rgba<u8>> {
    Image::from_fn(width, height, |x, y| {
        let in_ring = x < ring_width
            || y < ring_width
            || x + ring_width >= width
            || y + ring_width >= height;
        if in_ring {
            outer
        } else {
            inner
        }
    })
}

/// Creates a key-colored frame: `border` pixels of `key` around a solid
/// `subject` rectangle.
pub fn create_key_frame(
    width: u32,
    height: u32,
    border: u32,
    key: Rgba<u8>,
    subject: Rgba<u8>,
) -> Image<Rgba<u8>> {
    create_ring_image(width, height, border, key, subject)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_image_has_expected_layout() {
        let image = create_ring_image(5, 4, 1, BLACK, WHITE);
        assert_eq!(image.dimensions(), (5, 4));
        assert_eq!(image.get_pixel(0, 0), &BLACK);
        assert_eq!(image.get_pixel(4, 3), &BLACK);
        assert_eq!(image.get_pixel(1, 1), &WHITE);
        assert_eq!(image.get_pixel(3, 2), &WHITE);
        assert_eq!(image.pixels().filter(|p| **p == WHITE).count(), 6);
    }

    #[test]
    fn wide_ring_fills_frame() {
        let image = create_ring_image(4, 4, 2, BLACK, WHITE);
        assert!(image.pixels().all(|p| *p == BLACK));
    }

    #[test]
    fn key_frame_border_uses_key_color() {
        let image = create_key_frame(8, 8, 2, CHROMA_GREEN, WHITE);
        assert_eq!(image.get_pixel(1, 4), &CHROMA_GREEN);
        assert_eq!(image.get_pixel(4, 4), &WHITE);
    }
}
