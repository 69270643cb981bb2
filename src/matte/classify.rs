use image::{Pixel, Rgb};
use imageproc::definitions::Image;

use crate::error::MatteError;
use crate::matte::color_key::ColorKey;
use crate::matte::convert_color::{Hsv, HUE_MAX};
use crate::matte::pixel_buffer::{validate_frame, Mask};
use crate::utils::fill_rows;

/// Upper bound on the hue tolerance, in 8-bit hue units
pub const MAX_HUE_TOLERANCE: u8 = 30;

/// Trait classifying pixels as chroma-key background candidates
pub trait ColorDistanceClassifier {
    /// Produces a binary pre-mask of background candidates
    ///
    /// A pixel is a candidate when it lies inside the key's HSV window or
    /// within the key threshold by Euclidean RGB distance. The result holds
    /// 255 for candidates and 0 otherwise; it is an intermediate artifact for
    /// [`MaskMorphology`](crate::MaskMorphology), not a final alpha mask.
    ///
    /// # Errors
    ///
    /// * `MatteError::InvalidDimensions` - When the image has a zero dimension
    fn classify(&self, key: &ColorKey) -> Result<Mask, MatteError>;
}

impl<P> ColorDistanceClassifier for Image<P>
where
    P: Pixel<Subpixel = u8> + Sync,
{
    fn classify(&self, key: &ColorKey) -> Result<Mask, MatteError> {
        validate_frame(self)?;

        let window = HsvWindow::around(key);
        let threshold = f32::from(key.threshold());
        let (width, height) = self.dimensions();
        let mut mask = Mask::new(width, height);

        fill_rows(&mut mask, width, |y, row| {
            for (x, out) in (0..width).zip(row.iter_mut()) {
                let rgb = self.get_pixel(x, y).to_rgb();
                let candidate = window.contains(Hsv::from_rgb(rgb)) || key.distance(rgb) <= threshold;
                *out = if candidate { u8::MAX } else { 0 };
            }
        });

        tracing::trace!(width, height, "color distance classification complete");
        Ok(mask)
    }
}

/// Inclusive HSV bounds around the key color, clamped to valid component ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HsvWindow {
    lower: Rgb<u8>,
    upper: Rgb<u8>,
}

impl HsvWindow {
    pub(crate) fn around(key: &ColorKey) -> Self {
        let Hsv {
            hue,
            saturation,
            value,
        } = key.hsv();
        let threshold = i16::from(key.threshold());
        let hue_tolerance = i16::from((key.threshold() / 2).min(MAX_HUE_TOLERANCE));

        let bound = |center: u8, delta: i16, max: u8| {
            (i16::from(center) + delta).clamp(0, i16::from(max)) as u8
        };

        Self {
            lower: Rgb([
                bound(hue, -hue_tolerance, HUE_MAX),
                bound(saturation, -threshold, u8::MAX),
                bound(value, -threshold, u8::MAX),
            ]),
            upper: Rgb([
                bound(hue, hue_tolerance, HUE_MAX),
                bound(saturation, threshold, u8::MAX),
                bound(value, threshold, u8::MAX),
            ]),
        }
    }

    #[inline]
    pub(crate) fn contains(&self, hsv: Hsv) -> bool {
        let Rgb(components) = hsv.to_pixel();
        components
            .iter()
            .zip(self.lower.0.iter().zip(self.upper.0.iter()))
            .all(|(value, (lower, upper))| (lower..=upper).contains(&value))
    }
}
