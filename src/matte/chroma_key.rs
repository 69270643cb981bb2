use crate::error::MatteError;
use crate::matte::classify::ColorDistanceClassifier;
use crate::matte::color_key::ColorKey;
use crate::matte::despill::{DespillConfig, EdgeDespill};
use crate::matte::mask::MaskStats;
use crate::matte::morphology::{MaskMorphology, MorphologyConfig};
use crate::matte::pixel_buffer::{validate_frame, PixelBuffer};
use crate::matte::Matte;

/// Color-distance matte with morphological cleanup and despill
///
/// Stages: classify against the key, refine the candidate mask, invert it
/// into alpha, then despill. The returned [`Matte`] carries the
/// color-corrected frame alongside the final mask.
#[derive(Debug, Clone, PartialEq)]
pub struct ChromaKey {
    key: ColorKey,
    morphology: MorphologyConfig,
    despill: DespillConfig,
}

impl ChromaKey {
    /// Creates a chroma-key matte after validating both configurations
    ///
    /// # Errors
    ///
    /// * `MatteError::InvalidParameter` - When either configuration is invalid
    pub fn new(
        key: ColorKey,
        morphology: MorphologyConfig,
        despill: DespillConfig,
    ) -> Result<Self, MatteError> {
        morphology.validate()?;
        despill.validate()?;
        Ok(Self {
            key,
            morphology,
            despill,
        })
    }

    /// Chroma key with default tuning for the given key
    pub fn with_key(key: ColorKey) -> Self {
        Self {
            key,
            morphology: MorphologyConfig::default(),
            despill: DespillConfig::default(),
        }
    }

    #[inline]
    pub const fn key(&self) -> &ColorKey {
        &self.key
    }

    #[inline]
    pub const fn morphology(&self) -> &MorphologyConfig {
        &self.morphology
    }

    #[inline]
    pub const fn despill(&self) -> &DespillConfig {
        &self.despill
    }

    /// Runs the full keying pipeline on one frame
    ///
    /// # Errors
    ///
    /// * `MatteError::InvalidDimensions` - When the frame has a zero dimension
    pub fn extract(&self, buffer: &PixelBuffer) -> Result<Matte, MatteError> {
        validate_frame(buffer)?;

        let candidates = buffer.classify(&self.key)?;
        let refined = candidates.refine(&self.morphology)?;
        let alpha = refined.inverted();
        let (image, mask) = buffer.despill(&alpha, &self.key, &self.despill)?;

        tracing::debug!(
            width = buffer.width(),
            height = buffer.height(),
            threshold = self.key.threshold(),
            transparent = mask.transparent_count(),
            "chroma key complete"
        );

        Ok(Matte { image, mask })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_key_frame, CHROMA_GREEN, WHITE};
    use image::{Luma, Rgb};

    #[test]
    fn removes_key_border_and_keeps_core() {
        let frame = create_key_frame(40, 40, 12, CHROMA_GREEN, WHITE);
        let chroma = ChromaKey::with_key(ColorKey::new(Rgb([0, 253, 33]), 40));

        let matte = chroma.extract(&frame).unwrap();

        assert_eq!(matte.mask.get_pixel(0, 0), &Luma([0]));
        assert_eq!(matte.mask.get_pixel(2, 20), &Luma([0]));
        assert_eq!(matte.mask.get_pixel(20, 20), &Luma([255]));
        assert_eq!(matte.image.dimensions(), (40, 40));
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let morphology = MorphologyConfig {
            erode_iterations: 0,
            dilate_iterations: 0,
            ..MorphologyConfig::default()
        };
        let result = ChromaKey::new(ColorKey::default(), morphology, DespillConfig::default());
        assert!(matches!(result, Err(MatteError::InvalidParameter(_))));
    }

    #[test]
    fn empty_frame_is_rejected() {
        let frame = PixelBuffer::new(0, 0);
        let chroma = ChromaKey::with_key(ColorKey::default());
        assert!(matches!(
            chroma.extract(&frame),
            Err(MatteError::InvalidDimensions { .. })
        ));
    }
}
