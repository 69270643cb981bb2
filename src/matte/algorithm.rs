use crate::error::MatteError;
use crate::matte::apply_alpha_mask::ModifyAlpha;
use crate::matte::border_flood_fill::{BorderFloodFillMatte, DEFAULT_BLACKNESS_THRESHOLD};
use crate::matte::chroma_key::ChromaKey;
use crate::matte::pixel_buffer::{Mask, PixelBuffer};

/// Result of a matte computation
///
/// `image` is the frame the mask belongs to. Border flood fill returns the
/// input unchanged; chroma key returns the despilled frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matte {
    /// Frame to composite
    pub image: PixelBuffer,
    /// Final alpha mask
    pub mask: Mask,
}

impl Matte {
    /// Applies the mask to the frame, zeroing color on transparent pixels
    ///
    /// # Errors
    ///
    /// * `MatteError::DimensionMismatch` - When image and mask dimensions differ
    pub fn composite(self) -> Result<PixelBuffer, MatteError> {
        self.image.replace_alpha(&self.mask)
    }
}

/// Capability shared by every matte extraction algorithm
pub trait ComputeMatte {
    /// Computes the matte of a single frame
    fn compute(&self, buffer: &PixelBuffer) -> Result<Matte, MatteError>;

    /// Computes the matte and composites it in one step
    fn compute_composited(&self, buffer: &PixelBuffer) -> Result<PixelBuffer, MatteError> {
        self.compute(buffer)?.composite()
    }
}

/// Border-connected dark background removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderFloodFill {
    /// Largest R, G and B value still considered background
    pub blackness_threshold: u8,
}

impl Default for BorderFloodFill {
    fn default() -> Self {
        Self {
            blackness_threshold: DEFAULT_BLACKNESS_THRESHOLD,
        }
    }
}

impl ComputeMatte for BorderFloodFill {
    fn compute(&self, buffer: &PixelBuffer) -> Result<Matte, MatteError> {
        let mask = buffer.border_flood_fill_matte(self.blackness_threshold)?;
        Ok(Matte {
            image: buffer.clone(),
            mask,
        })
    }
}

impl ComputeMatte for ChromaKey {
    fn compute(&self, buffer: &PixelBuffer) -> Result<Matte, MatteError> {
        self.extract(buffer)
    }
}

/// Matte algorithm selected by configuration
///
/// The two algorithms are peers; a frame goes through exactly one of them.
#[derive(Debug, Clone, PartialEq)]
pub enum MatteAlgorithm {
    /// Border-connected flood fill
    FloodFill(BorderFloodFill),
    /// Chroma key with despill
    ChromaKey(ChromaKey),
}

impl MatteAlgorithm {
    /// Short name used in logs
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FloodFill(_) => "flood_fill",
            Self::ChromaKey(_) => "chroma_key",
        }
    }
}

impl ComputeMatte for MatteAlgorithm {
    fn compute(&self, buffer: &PixelBuffer) -> Result<Matte, MatteError> {
        match self {
            Self::FloodFill(flood_fill) => flood_fill.compute(buffer),
            Self::ChromaKey(chroma_key) => chroma_key.compute(buffer),
        }
    }
}

impl From<BorderFloodFill> for MatteAlgorithm {
    fn from(value: BorderFloodFill) -> Self {
        Self::FloodFill(value)
    }
}

impl From<ChromaKey> for MatteAlgorithm {
    fn from(value: ChromaKey) -> Self {
        Self::ChromaKey(value)
    }
}
