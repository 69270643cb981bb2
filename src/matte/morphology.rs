//! Morphological refinement of chroma-key candidate masks.
//!
//! The stages run in a fixed order so results are reproducible:
//!
//! 1. closing, filling small holes in the candidate region
//! 2. opening, removing small spurious candidate islands
//! 3. erosion followed by a smaller dilation, shrinking the region inward
//! 4. Gaussian blur, softening the boundary
//!
//! Every stage before the blur keeps the mask strictly binary. Stage 3 gives
//! up a thin rim of true background so that color-contaminated foreground
//! pixels near the boundary are not removed; those are repaired by despill.

use image::Luma;
use imageproc::definitions::Image;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, dilate, erode, open};

use crate::error::MatteError;
use crate::matte::pixel_buffer::{validate_frame, Mask};
use crate::utils::truncate_to_u8;

/// Largest accepted Gaussian kernel half-width
pub const MAX_BLUR_RADIUS: u32 = 64;

/// Tuning for [`MaskMorphology::refine`]
///
/// Iteration counts are in units of a 3x3 square structuring element.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MorphologyConfig {
    /// Closing iterations (dilate then erode)
    pub close_iterations: u8,
    /// Opening iterations (erode then dilate)
    pub open_iterations: u8,
    /// Erosion iterations of the inward shrink
    pub erode_iterations: u8,
    /// Dilation iterations following the shrink; must be smaller than `erode_iterations`
    pub dilate_iterations: u8,
    /// Half-width of the Gaussian kernel
    pub blur_radius: u32,
    /// Standard deviation of the Gaussian kernel
    pub blur_sigma: f32,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            close_iterations: 3,
            open_iterations: 3,
            erode_iterations: 2,
            dilate_iterations: 1,
            blur_radius: 2,
            blur_sigma: 1.1,
        }
    }
}

impl MorphologyConfig {
    /// Checks the configuration invariants
    ///
    /// # Errors
    ///
    /// * `MatteError::InvalidParameter` - erosion does not exceed dilation, the
    ///   blur radius exceeds [`MAX_BLUR_RADIUS`], or the blur sigma is not a
    ///   positive finite number
    pub fn validate(&self) -> Result<(), MatteError> {
        if self.erode_iterations <= self.dilate_iterations {
            return Err(MatteError::InvalidParameter(format!(
                "erode_iterations ({}) must exceed dilate_iterations ({})",
                self.erode_iterations, self.dilate_iterations
            )));
        }
        if self.blur_radius > MAX_BLUR_RADIUS {
            return Err(MatteError::InvalidParameter(format!(
                "blur_radius must be at most {MAX_BLUR_RADIUS}, got {}",
                self.blur_radius
            )));
        }
        if !(self.blur_sigma.is_finite() && self.blur_sigma > 0.0) {
            return Err(MatteError::InvalidParameter(format!(
                "blur_sigma must be positive, got {}",
                self.blur_sigma
            )));
        }
        Ok(())
    }
}

/// Trait refining a binary candidate mask
pub trait MaskMorphology {
    /// Runs close, open, shrink and blur in that order
    ///
    /// # Errors
    ///
    /// * `MatteError::InvalidDimensions` - When the mask has a zero dimension
    /// * `MatteError::InvalidParameter` - When `config` fails validation
    fn refine(&self, config: &MorphologyConfig) -> Result<Mask, MatteError>;

    /// Runs every stage except the final blur
    ///
    /// The result is strictly binary.
    fn refine_binary(&self, config: &MorphologyConfig) -> Result<Mask, MatteError>;
}

impl MaskMorphology for Mask {
    fn refine(&self, config: &MorphologyConfig) -> Result<Mask, MatteError> {
        let binary = self.refine_binary(config)?;
        Ok(gaussian_blur(&binary, config.blur_radius, config.blur_sigma))
    }

    fn refine_binary(&self, config: &MorphologyConfig) -> Result<Mask, MatteError> {
        validate_frame(self)?;
        config.validate()?;

        let mask = close(self, Norm::LInf, config.close_iterations);
        let mask = open(&mask, Norm::LInf, config.open_iterations);
        let mask = erode(&mask, Norm::LInf, config.erode_iterations);
        let mask = dilate(&mask, Norm::LInf, config.dilate_iterations);

        tracing::trace!(
            close = config.close_iterations,
            open = config.open_iterations,
            erode = config.erode_iterations,
            dilate = config.dilate_iterations,
            "mask morphology complete"
        );
        Ok(mask)
    }
}

fn gaussian_kernel(radius: u32, sigma: f32) -> Vec<f32> {
    let radius = i64::from(radius);
    let denominator = 2.0 * sigma * sigma;
    let weights: Vec<f32> = (-radius..=radius)
        .map(|offset| (-((offset * offset) as f32) / denominator).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|weight| weight / sum).collect()
}

/// Separable Gaussian blur with edge replication, rounded back to `u8`
///
/// Rounding (rather than truncating) keeps constant regions at their exact
/// value, so fully opaque and fully transparent areas stay at 255 and 0.
pub(crate) fn gaussian_blur(mask: &Mask, radius: u32, sigma: f32) -> Mask {
    let (width, height) = mask.dimensions();
    if radius == 0 {
        return mask.clone();
    }

    let kernel = gaussian_kernel(radius, sigma);
    let radius = radius as i64;
    let sample = |value: i64, len: u32| value.clamp(0, i64::from(len) - 1) as u32;

    let horizontal: Image<Luma<f32>> = Image::from_fn(width, height, |x, y| {
        let sum = kernel
            .iter()
            .enumerate()
            .map(|(k, weight)| {
                let sx = sample(i64::from(x) + k as i64 - radius, width);
                weight * f32::from(mask.get_pixel(sx, y)[0])
            })
            .sum::<f32>();
        Luma([sum])
    });

    Mask::from_fn(width, height, |x, y| {
        let sum = kernel
            .iter()
            .enumerate()
            .map(|(k, weight)| {
                let sy = sample(i64::from(y) + k as i64 - radius, height);
                weight * horizontal.get_pixel(x, sy)[0]
            })
            .sum::<f32>();
        Luma([truncate_to_u8(sum.round())])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matte::mask::MaskStats;

    fn square_mask(size: u32, from: u32, to: u32) -> Mask {
        Mask::from_fn(size, size, |x, y| {
            if (from..to).contains(&x) && (from..to).contains(&y) {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn default_config_is_valid() {
        assert!(MorphologyConfig::default().validate().is_ok());
    }

    #[test]
    fn shrink_must_be_erosion_biased() {
        let config = MorphologyConfig {
            erode_iterations: 1,
            dilate_iterations: 1,
            ..MorphologyConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MatteError::InvalidParameter(_))
        ));
    }

    #[test]
    fn non_positive_sigma_is_rejected() {
        let config = MorphologyConfig {
            blur_sigma: 0.0,
            ..MorphologyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_blur_radius_is_rejected() {
        let at_limit = MorphologyConfig {
            blur_radius: MAX_BLUR_RADIUS,
            ..MorphologyConfig::default()
        };
        assert!(at_limit.validate().is_ok());

        for blur_radius in [MAX_BLUR_RADIUS + 1, u32::MAX] {
            let config = MorphologyConfig {
                blur_radius,
                ..MorphologyConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(MatteError::InvalidParameter(_))
            ));
            let mask = square_mask(8, 2, 6);
            assert!(mask.refine(&config).is_err());
        }
    }

    #[test]
    fn binary_stages_keep_mask_binary() {
        let mask = square_mask(32, 4, 28);
        let refined = mask.refine_binary(&MorphologyConfig::default()).unwrap();
        assert!(refined.is_binary());
    }

    #[test]
    fn small_islands_are_removed() {
        let mut mask = Mask::new(32, 32);
        mask.put_pixel(16, 16, Luma([255]));
        mask.put_pixel(17, 16, Luma([255]));

        let refined = mask.refine_binary(&MorphologyConfig::default()).unwrap();
        assert_eq!(refined.opaque_count(), 0);
    }

    #[test]
    fn small_holes_are_filled() {
        let mut mask = Mask::from_pixel(32, 32, Luma([255]));
        mask.put_pixel(16, 16, Luma([0]));

        let refined = mask.refine_binary(&MorphologyConfig::default()).unwrap();
        assert_eq!(refined.get_pixel(16, 16), &Luma([255]));
    }

    #[test]
    fn candidate_region_shrinks_inward() {
        let mask = square_mask(40, 10, 30);
        let refined = mask.refine_binary(&MorphologyConfig::default()).unwrap();

        // Net erosion of one pixel on each side.
        assert_eq!(refined.get_pixel(10, 20), &Luma([0]));
        assert_eq!(refined.get_pixel(11, 20), &Luma([255]));
        assert_eq!(refined.get_pixel(29, 20), &Luma([0]));
        assert_eq!(refined.get_pixel(28, 20), &Luma([255]));
        assert_eq!(refined.opaque_count(), 18 * 18);
    }

    #[test]
    fn blur_softens_only_the_boundary() {
        let mask = square_mask(40, 10, 30);
        let refined = mask.refine(&MorphologyConfig::default()).unwrap();

        assert_eq!(refined.get_pixel(20, 20), &Luma([255]));
        assert_eq!(refined.get_pixel(0, 0), &Luma([0]));
        assert!(!refined.is_binary());
    }

    #[test]
    fn blur_preserves_constant_masks() {
        let opaque = Mask::from_pixel(6, 4, Luma([255]));
        assert_eq!(gaussian_blur(&opaque, 2, 1.1), opaque);
        let clear = Mask::new(6, 4);
        assert_eq!(gaussian_blur(&clear, 2, 1.1), clear);
    }

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(2, 1.1);
        assert_eq!(kernel.len(), 5);
        assert!((kernel.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!((kernel[0] - kernel[4]).abs() < 1e-7);
        assert!(kernel[2] > kernel[1]);

        let widest = gaussian_kernel(MAX_BLUR_RADIUS, 1.1);
        assert_eq!(widest.len(), 2 * MAX_BLUR_RADIUS as usize + 1);
        assert!(widest.iter().all(|weight| weight.is_finite()));
    }
}
