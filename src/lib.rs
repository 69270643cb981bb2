//! Background matte extraction for RGBA frames.
//!
//! Two algorithms produce an alpha mask for a frame: a border-connected
//! flood fill of dark pixels, and a chroma key with morphological cleanup
//! and edge despill. The compositor then writes the mask into the frame.

mod config;
mod error;
mod frame;
mod matte;
#[cfg(test)]
mod test_utils;
mod utils;

use image::{ImageBuffer, Pixel};

pub use config::{AlgorithmKind, MatteConfig};
pub use error::{FrameFailure, MatteError};
pub use frame::{
    process_batch, process_frames, FrameMetadata, FrameSink, FrameSource, MemoryFrameSink,
    MemoryFrameSource, ProcessReport,
};
pub use matte::algorithm::{BorderFloodFill, ComputeMatte, Matte, MatteAlgorithm};
pub use matte::apply_alpha_mask::{ApplyAlphaMask, ModifyAlpha};
pub use matte::border_flood_fill::{BorderFloodFillMatte, DEFAULT_BLACKNESS_THRESHOLD};
pub use matte::chroma_key::ChromaKey;
pub use matte::classify::{ColorDistanceClassifier, MAX_HUE_TOLERANCE};
pub use matte::color_key::{ColorKey, KeyColor, DEFAULT_KEY_COLOR, DEFAULT_KEY_THRESHOLD};
pub use matte::convert_color::{ConvertColor, Hsv, HUE_MAX};
pub use matte::despill::{
    DarkCleanup, DespillConfig, EdgeDespill, DEFAULT_EDGE_THRESHOLD_MULTIPLIER,
};
pub use matte::mask::MaskStats;
pub use matte::morphology::{MaskMorphology, MorphologyConfig, MAX_BLUR_RADIUS};
pub use matte::pixel_buffer::{from_raw, from_rgb, Mask, PixelBuffer};

pub type Image<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;
