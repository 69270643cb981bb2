use image::{ImageBuffer, Luma, Pixel, Rgb, Rgba};
use imageproc::definitions::Image;
use imageproc::map::map_colors;

use crate::error::MatteError;
use crate::utils::validate_non_empty_image;

/// RGBA frame owned by whichever stage currently processes it
pub type PixelBuffer = Image<Rgba<u8>>;

/// Per-pixel alpha aligned 1:1 with a [`PixelBuffer`]
///
/// 0 is fully transparent, 255 fully opaque.
pub type Mask = Image<Luma<u8>>;

/// Builds a [`PixelBuffer`] from interleaved raw samples.
///
/// The compositor writes alpha in place, so the input must already carry
/// four channels. Three-channel data is rejected rather than silently given
/// an opaque alpha; use [`from_rgb`] for an explicit conversion.
///
/// # Errors
///
/// * `MatteError::InvalidDimensions` - width or height is zero
/// * `MatteError::UnsupportedPixelFormat` - `channels` is not 4
/// * `MatteError::InvalidParameter` - `data` length disagrees with the dimensions
pub fn from_raw(
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
) -> Result<PixelBuffer, MatteError> {
    validate_non_empty_image(width, height)?;

    if channels != Rgba::<u8>::CHANNEL_COUNT {
        return Err(MatteError::UnsupportedPixelFormat { channels });
    }

    let expected = width as usize * height as usize * usize::from(channels);
    let actual = data.len();
    ImageBuffer::from_raw(width, height, data).ok_or_else(|| {
        MatteError::InvalidParameter(format!(
            "expected {expected} samples for {width}x{height} RGBA, got {actual}"
        ))
    })
}

/// Converts an RGB image into a fully opaque [`PixelBuffer`].
///
/// # Errors
///
/// * `MatteError::InvalidDimensions` - width or height is zero
pub fn from_rgb(image: &Image<Rgb<u8>>) -> Result<PixelBuffer, MatteError> {
    validate_non_empty_image(image.width(), image.height())?;
    Ok(map_colors(image, |Rgb([red, green, blue])| {
        Rgba([red, green, blue, u8::MAX])
    }))
}

/// Rejects zero-sized frames before any pixel work begins.
#[inline]
pub fn validate_frame<P: Pixel>(image: &Image<P>) -> Result<(), MatteError> {
    validate_non_empty_image(image.width(), image.height())
}
