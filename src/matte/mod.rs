pub mod algorithm;
pub mod apply_alpha_mask;
pub mod border_flood_fill;
pub mod chroma_key;
pub mod classify;
pub mod color_key;
pub mod convert_color;
pub mod despill;
pub mod mask;
pub mod morphology;
pub mod pixel_buffer;

pub use algorithm::Matte;
