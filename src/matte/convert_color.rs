//! RGB to HSV conversion in the 8-bit convention used for keying.
//!
//! Hue is stored halved so it fits a byte (`0..180`), saturation and value
//! span the full `0..=255` range.

use image::{Pixel, Rgb};
use imageproc::definitions::Image;
use imageproc::map::map_colors;

/// Largest hue value in the 8-bit convention
pub const HUE_MAX: u8 = 179;

/// A color in 8-bit HSV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hsv {
    /// Hue in degrees divided by two (`0..=179`)
    pub hue: u8,
    /// Saturation (`0..=255`)
    pub saturation: u8,
    /// Value (`0..=255`)
    pub value: u8,
}

impl Hsv {
    /// Converts one RGB color.
    pub fn from_rgb(Rgb([red, green, blue]): Rgb<u8>) -> Self {
        let value = red.max(green).max(blue);
        let min = red.min(green).min(blue);
        let delta = f32::from(value - min);

        let saturation = if value == 0 {
            0
        } else {
            (delta * 255.0 / f32::from(value)).round() as u8
        };

        let hue_degrees = if delta == 0.0 {
            0.0
        } else {
            let (r, g, b) = (f32::from(red), f32::from(green), f32::from(blue));
            let hue = if value == red {
                60.0 * (g - b) / delta
            } else if value == green {
                120.0 + 60.0 * (b - r) / delta
            } else {
                240.0 + 60.0 * (r - g) / delta
            };
            if hue < 0.0 {
                hue + 360.0
            } else {
                hue
            }
        };

        // 359.x degrees rounds to 180, which wraps back to red.
        let hue = match (hue_degrees / 2.0).round() as u8 {
            h if h > HUE_MAX => 0,
            h => h,
        };

        Self {
            hue,
            saturation,
            value,
        }
    }

    /// Packs the components as an `Rgb` pixel (H, S, V order)
    #[inline]
    pub const fn to_pixel(self) -> Rgb<u8> {
        Rgb([self.hue, self.saturation, self.value])
    }
}

/// Trait for converting images into HSV space
pub trait ConvertColor {
    /// Converts every pixel to 8-bit HSV, packed as (H, S, V) channels
    ///
    /// Alpha, when present, is dropped.
    fn to_hsv(&self) -> Image<Rgb<u8>>;
}

impl<P> ConvertColor for Image<P>
where
    P: Pixel<Subpixel = u8>,
{
    fn to_hsv(&self) -> Image<Rgb<u8>> {
        map_colors(self, |pixel| Hsv::from_rgb(pixel.to_rgb()).to_pixel())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn hsv(hue: u8, saturation: u8, value: u8) -> Hsv {
        Hsv {
            hue,
            saturation,
            value,
        }
    }

    #[test]
    fn primaries_convert_to_expected_hues() {
        assert_eq!(Hsv::from_rgb(Rgb([255, 0, 0])), hsv(0, 255, 255));
        assert_eq!(Hsv::from_rgb(Rgb([0, 255, 0])), hsv(60, 255, 255));
        assert_eq!(Hsv::from_rgb(Rgb([0, 0, 255])), hsv(120, 255, 255));
    }

    #[test]
    fn grays_have_zero_hue_and_saturation() {
        assert_eq!(Hsv::from_rgb(Rgb([0, 0, 0])), hsv(0, 0, 0));
        assert_eq!(Hsv::from_rgb(Rgb([128, 128, 128])), hsv(0, 0, 128));
        assert_eq!(Hsv::from_rgb(Rgb([255, 255, 255])), hsv(0, 0, 255));
    }

    #[test]
    fn chroma_green_converts() {
        // #00FD21
        let converted = Hsv::from_rgb(Rgb([0, 253, 33]));
        assert_eq!(converted.value, 253);
        assert_eq!(converted.saturation, 255);
        // 120 + 60 * 33 / 253 = 127.8 degrees
        assert_eq!(converted.hue, 64);
    }

    #[test]
    fn hue_never_exceeds_maximum() {
        let converted = Hsv::from_rgb(Rgb([255, 0, 1]));
        assert!(converted.hue <= HUE_MAX);
    }

    #[test]
    fn to_hsv_converts_every_pixel_and_drops_alpha() {
        let mut image: Image<Rgba<u8>> = Image::new(2, 1);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 10]));
        image.put_pixel(1, 0, Rgba([0, 0, 255, 200]));

        let converted = image.to_hsv();
        assert_eq!(converted.get_pixel(0, 0), &Rgb([0, 255, 255]));
        assert_eq!(converted.get_pixel(1, 0), &Rgb([120, 255, 255]));
    }
}
