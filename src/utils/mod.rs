//! Internal utility functions for imageops-matte.
//!
//! This module contains validation and color math shared by the matte
//! operations.

use image::Rgb;

use crate::error::MatteError;

/// Validates that an image has non-zero dimensions.
///
/// # Arguments
///
/// * `width` - The width of the image
/// * `height` - The height of the image
///
/// # Returns
///
/// `Ok(())` if the dimensions are valid, otherwise `MatteError::InvalidDimensions`
#[inline]
pub fn validate_non_empty_image(width: u32, height: u32) -> Result<(), MatteError> {
    if width == 0 || height == 0 {
        Err(MatteError::InvalidDimensions { width, height })
    } else {
        Ok(())
    }
}

/// Validates that two images have matching dimensions.
///
/// `expected` is the reference image, `actual` the one being checked against it.
#[inline]
pub fn validate_matching_dimensions(
    expected: (u32, u32),
    actual: (u32, u32),
) -> Result<(), MatteError> {
    if expected == actual {
        Ok(())
    } else {
        Err(MatteError::DimensionMismatch { expected, actual })
    }
}

/// Narrows a caller-supplied threshold to the 0-255 channel range.
///
/// # Errors
///
/// `MatteError::ThresholdOutOfRange` carrying `name` when `value` does not fit.
pub fn validate_threshold(name: &'static str, value: i64) -> Result<u8, MatteError> {
    u8::try_from(value).map_err(|_| MatteError::ThresholdOutOfRange { name, value })
}

/// Euclidean distance between two RGB colors.
#[inline]
pub fn rgb_distance(a: Rgb<u8>, b: Rgb<u8>) -> f32 {
    let Rgb([r1, g1, b1]) = a;
    let Rgb([r2, g2, b2]) = b;
    let dr = f32::from(r1) - f32::from(r2);
    let dg = f32::from(g1) - f32::from(g2);
    let db = f32::from(b1) - f32::from(b2);
    dr.mul_add(dr, dg.mul_add(dg, db * db)).sqrt()
}

/// Clamps a floating-point channel value to `u8`, truncating the fraction.
#[inline]
pub fn truncate_to_u8(value: f32) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

/// Fills a single-channel `u8` plane row by row.
///
/// `fill` receives the row index and the row's samples. Rows are processed
/// in parallel when the `rayon` feature is enabled.
pub fn fill_rows<F>(plane: &mut [u8], width: u32, fill: F)
where
    F: Fn(u32, &mut [u8]) + Send + Sync,
{
    let row_len = (width as usize).max(1);

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        plane
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| fill(y as u32, row));
    }

    #[cfg(not(feature = "rayon"))]
    plane
        .chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| fill(y as u32, row));
}
