use image::Luma;
use imageproc::map::map_colors;

use crate::matte::pixel_buffer::Mask;

/// Inspection and inversion helpers for alpha masks
pub trait MaskStats {
    /// Number of fully transparent (0) entries
    fn transparent_count(&self) -> usize;

    /// Number of fully opaque (255) entries
    fn opaque_count(&self) -> usize;

    /// Whether every entry is either 0 or 255
    fn is_binary(&self) -> bool;

    /// Returns `255 - value` for every entry
    fn inverted(&self) -> Mask;
}

impl MaskStats for Mask {
    fn transparent_count(&self) -> usize {
        self.pixels().filter(|Luma([alpha])| *alpha == 0).count()
    }

    fn opaque_count(&self) -> usize {
        self.pixels().filter(|Luma([alpha])| *alpha == u8::MAX).count()
    }

    fn is_binary(&self) -> bool {
        self.pixels()
            .all(|Luma([alpha])| *alpha == 0 || *alpha == u8::MAX)
    }

    fn inverted(&self) -> Mask {
        map_colors(self, |Luma([alpha])| Luma([u8::MAX - alpha]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::gray_image;

    #[test]
    fn counts_transparent_and_opaque_entries() {
        let mask = gray_image!(
            0, 255, 128;
            0, 0, 255);
        assert_eq!(mask.transparent_count(), 3);
        assert_eq!(mask.opaque_count(), 2);
        assert!(!mask.is_binary());
    }

    #[test]
    fn inverted_swaps_transparent_and_opaque() {
        let mask = gray_image!(0, 255, 100);
        let inverted = mask.inverted();
        assert_eq!(inverted, gray_image!(255, 0, 155));
        assert!(gray_image!(0, 255).is_binary());
    }
}
