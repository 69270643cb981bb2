//! Edge despill and alpha attenuation for chroma-key mattes.
//!
//! Light reflected from a colored backdrop contaminates foreground edges. The
//! corrector works on the refined alpha mask and the original frame:
//!
//! 1. **Edge band**: Canny edges of the alpha mask, dilated into a band.
//! 2. **Edge pass**: band pixels close to the key lose alpha in proportion to
//!    `1 - distance / edge_threshold` and have their color corrected.
//! 3. **Spill pass**: frame-wide, pixels within a looser bound are color
//!    corrected and, past a cutoff, lose more alpha.
//! 4. **Edge purge**: pixels on luminance edges of the corrected image that
//!    are still near the key become fully transparent.
//! 5. **Dark cleanup**: sufficiently dark pixels become fully transparent.
//!    It runs last so no earlier stage can bring them back. The luminance
//!    floor looks at the original frame, the other floors at the corrected one.
//!
//! Distances are always measured against the original, uncorrected frame.

use image::imageops::grayscale;
use image::{Luma, Pixel, Rgb, Rgba};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::morphology::dilate;
use itertools::izip;

use crate::error::MatteError;
use crate::matte::color_key::ColorKey;
use crate::matte::pixel_buffer::{validate_frame, Mask, PixelBuffer};
use crate::utils::{truncate_to_u8, validate_matching_dimensions};

/// Default multiplier applied to the key threshold inside the edge band
pub const DEFAULT_EDGE_THRESHOLD_MULTIPLIER: f32 = 2.5;

/// Smallest side length for which edge detection is attempted
const MIN_EDGE_DETECTION_SIZE: u32 = 3;

/// Absolute darkness bounds below which a pixel is treated as background
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DarkCleanup {
    /// Pixels whose corrected mean RGB is below this become transparent
    pub mean_floor: u8,
    /// Pixels whose corrected R, G and B are all below this become transparent
    pub channel_floor: u8,
    /// Pixels whose original luminance is below this become transparent
    ///
    /// Catches saturated dark colors such as deep blue, whose channel mean
    /// stays above `mean_floor`.
    pub luma_floor: Option<u8>,
}

impl Default for DarkCleanup {
    fn default() -> Self {
        Self {
            mean_floor: 50,
            channel_floor: 30,
            luma_floor: Some(50),
        }
    }
}

impl DarkCleanup {
    #[inline]
    fn is_dark(&self, Rgb([red, green, blue]): Rgb<u8>, Luma([luma]): Luma<u8>) -> bool {
        let mean = (f32::from(red) + f32::from(green) + f32::from(blue)) / 3.0;
        let floor = self.channel_floor;
        mean < f32::from(self.mean_floor)
            || (red < floor && green < floor && blue < floor)
            || self.luma_floor.is_some_and(|luma_floor| luma < luma_floor)
    }
}

/// Tuning for [`EdgeDespill::despill`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DespillConfig {
    /// Multiplier on the key threshold for the edge pass (at least 1.0)
    pub edge_threshold_multiplier: f32,
    /// Canny low hysteresis threshold
    pub canny_low: f32,
    /// Canny high hysteresis threshold
    pub canny_high: f32,
    /// Dilation radius turning mask edges into the edge band
    pub edge_band_radius: u8,
    /// Alpha removed from an edge pixel sitting exactly on the key color
    pub edge_alpha_reduction: f32,
    /// Multiplier on the key threshold for the frame-wide spill pass
    pub spill_distance_multiplier: f32,
    /// Spill fraction above which the spill pass also lowers alpha
    pub spill_alpha_cutoff: f32,
    /// Alpha removed by the spill pass at full spill
    pub spill_alpha_reduction: f32,
    /// Fraction of the key channel removed at full spill
    pub key_reduction: f32,
    /// Amount added to the two non-key channels (RGB order) at full spill
    pub compensation: [f32; 2],
    /// Multiplier on the key threshold for the edge purge; `None` skips it
    pub purge_multiplier: Option<f32>,
    /// Dilation radius of the luminance edges used by the purge
    pub purge_band_radius: u8,
    /// Final darkness cleanup; `None` skips it
    pub dark_cleanup: Option<DarkCleanup>,
}

impl Default for DespillConfig {
    fn default() -> Self {
        Self {
            edge_threshold_multiplier: DEFAULT_EDGE_THRESHOLD_MULTIPLIER,
            canny_low: 50.0,
            canny_high: 150.0,
            edge_band_radius: 5,
            edge_alpha_reduction: 100.0,
            spill_distance_multiplier: 2.5,
            spill_alpha_cutoff: 0.2,
            spill_alpha_reduction: 150.0,
            key_reduction: 0.8,
            compensation: [25.0, 20.0],
            purge_multiplier: Some(2.0),
            purge_band_radius: 4,
            dark_cleanup: Some(DarkCleanup::default()),
        }
    }
}

impl DespillConfig {
    /// Checks the configuration invariants
    ///
    /// # Errors
    ///
    /// * `MatteError::InvalidParameter` - When a multiplier, fraction or
    ///   amount is out of range or not finite
    pub fn validate(&self) -> Result<(), MatteError> {
        let invalid = |message: String| Err(MatteError::InvalidParameter(message));

        if !(self.edge_threshold_multiplier.is_finite() && self.edge_threshold_multiplier >= 1.0) {
            return invalid(format!(
                "edge_threshold_multiplier must be >= 1.0, got {}",
                self.edge_threshold_multiplier
            ));
        }
        if !(self.spill_distance_multiplier.is_finite() && self.spill_distance_multiplier > 0.0) {
            return invalid(format!(
                "spill_distance_multiplier must be positive, got {}",
                self.spill_distance_multiplier
            ));
        }
        if !(0.0..=1.0).contains(&self.spill_alpha_cutoff) {
            return invalid(format!(
                "spill_alpha_cutoff must lie in 0.0..=1.0, got {}",
                self.spill_alpha_cutoff
            ));
        }
        for (name, amount) in [
            ("edge_alpha_reduction", self.edge_alpha_reduction),
            ("spill_alpha_reduction", self.spill_alpha_reduction),
            ("compensation[0]", self.compensation[0]),
            ("compensation[1]", self.compensation[1]),
        ] {
            if !(amount.is_finite() && amount >= 0.0) {
                return invalid(format!("{name} must be non-negative, got {amount}"));
            }
        }
        if !(0.0..=1.0).contains(&self.key_reduction) {
            return invalid(format!(
                "key_reduction must lie in 0.0..=1.0, got {}",
                self.key_reduction
            ));
        }
        if !(self.canny_low >= 0.0
            && self.canny_low <= self.canny_high
            && self.canny_high.is_finite())
        {
            return invalid(format!(
                "canny thresholds must satisfy 0 <= low <= high, got {} and {}",
                self.canny_low, self.canny_high
            ));
        }
        if let Some(multiplier) = self.purge_multiplier {
            if !(multiplier.is_finite() && multiplier > 0.0) {
                return invalid(format!("purge_multiplier must be positive, got {multiplier}"));
            }
        }
        Ok(())
    }
}

/// Trait correcting key-color spill on a masked frame
pub trait EdgeDespill {
    /// Corrects spill and attenuates alpha near the key color
    ///
    /// `mask` is the refined alpha mask (255 keeps a pixel). The threshold is
    /// taken from `key`.
    ///
    /// # Returns
    ///
    /// The color-corrected frame and the final alpha mask, both with the
    /// input's dimensions. The frame's own alpha channel is left untouched.
    ///
    /// # Errors
    ///
    /// * `MatteError::InvalidDimensions` - When the frame has a zero dimension
    /// * `MatteError::DimensionMismatch` - When frame and mask sizes differ
    /// * `MatteError::InvalidParameter` - When `config` fails validation
    fn despill(
        &self,
        mask: &Mask,
        key: &ColorKey,
        config: &DespillConfig,
    ) -> Result<(PixelBuffer, Mask), MatteError>;
}

impl EdgeDespill for PixelBuffer {
    fn despill(
        &self,
        mask: &Mask,
        key: &ColorKey,
        config: &DespillConfig,
    ) -> Result<(PixelBuffer, Mask), MatteError> {
        validate_frame(self)?;
        validate_matching_dimensions(self.dimensions(), mask.dimensions())?;
        config.validate()?;

        let threshold = f32::from(key.threshold());
        let key_channel = key.dominant_channel();
        let distances: Vec<f32> = self
            .pixels()
            .map(|pixel| key.distance(pixel.to_rgb()))
            .collect();

        let mut image = self.clone();
        let mut alpha = mask.clone();
        let mut corrected = vec![false; distances.len()];

        // Edge pass
        let band = edge_band(mask, config.canny_low, config.canny_high, config.edge_band_radius);
        let edge_threshold = threshold * config.edge_threshold_multiplier;
        let mut edge_count = 0usize;
        for (pixel, Luma([a]), Luma([in_band]), distance, was_corrected) in izip!(
            image.pixels_mut(),
            alpha.pixels_mut(),
            band.pixels(),
            &distances,
            corrected.iter_mut(),
        ) {
            if *in_band == 0 || *distance >= edge_threshold {
                continue;
            }
            let spill = 1.0 - f64::from(*distance) / f64::from(edge_threshold);
            *a = a.saturating_sub(scaled_amount(config.edge_alpha_reduction, spill));
            suppress_spill(pixel, spill as f32, key_channel, config);
            *was_corrected = true;
            edge_count += 1;
        }

        // Spill pass
        let max_distance = threshold * config.spill_distance_multiplier;
        for (pixel, Luma([a]), distance, was_corrected) in izip!(
            image.pixels_mut(),
            alpha.pixels_mut(),
            &distances,
            &corrected,
        ) {
            if *distance >= max_distance {
                continue;
            }
            let spill = (1.0 - distance / max_distance).clamp(0.0, 1.0);
            if !*was_corrected {
                suppress_spill(pixel, spill, key_channel, config);
            }
            if spill > config.spill_alpha_cutoff {
                *a = truncate_to_u8(f32::from(*a) - spill * config.spill_alpha_reduction);
            }
        }

        // Edge purge
        if let Some(multiplier) = config.purge_multiplier {
            let luma = grayscale(&image);
            let purge_band = edge_band(
                &luma,
                config.canny_low,
                config.canny_high,
                config.purge_band_radius,
            );
            let purge_distance = threshold * multiplier;
            izip!(alpha.pixels_mut(), purge_band.pixels(), &distances)
                .filter(|(_, Luma([in_band]), distance)| *in_band != 0 && **distance < purge_distance)
                .for_each(|(Luma([a]), _, _)| *a = 0);
        }

        // Dark cleanup
        if let Some(cleanup) = config.dark_cleanup {
            let original_luma = grayscale(self);
            izip!(alpha.pixels_mut(), image.pixels(), original_luma.pixels())
                .filter(|(_, pixel, luma)| cleanup.is_dark(pixel.to_rgb(), **luma))
                .for_each(|(Luma([a]), _, _)| *a = 0);
        }

        tracing::trace!(
            edge_pixels = edge_count,
            threshold = key.threshold(),
            "despill complete"
        );

        Ok((image, alpha))
    }
}

/// Canny edges of `plane` dilated by `radius` in the L-infinity norm
///
/// Planes too small for edge detection produce an empty band.
fn edge_band(plane: &Mask, low: f32, high: f32, radius: u8) -> Mask {
    let (width, height) = plane.dimensions();
    if width < MIN_EDGE_DETECTION_SIZE || height < MIN_EDGE_DETECTION_SIZE {
        return Mask::new(width, height);
    }
    let edges = canny(plane, low, high);
    dilate(&edges, Norm::LInf, radius)
}

/// `amount × spill` truncated to `u8`
///
/// Computed in `f64`; in `f32`, products such as `100 × 0.4` truncate one
/// step low.
#[inline]
fn scaled_amount(amount: f32, spill: f64) -> u8 {
    (f64::from(amount) * spill).clamp(0.0, 255.0) as u8
}

/// Reduces the key channel and lifts the others by the spill fraction
#[inline]
fn suppress_spill(pixel: &mut Rgba<u8>, spill: f32, key_channel: usize, config: &DespillConfig) {
    let mut compensation = config.compensation.iter();
    for (channel, value) in pixel.0.iter_mut().take(3).enumerate() {
        let current = f32::from(*value);
        *value = if channel == key_channel {
            truncate_to_u8(current * spill.mul_add(-config.key_reduction, 1.0))
        } else {
            let boost = compensation.next().copied().unwrap_or(0.0);
            truncate_to_u8(spill.mul_add(boost, current))
        };
    }
}
