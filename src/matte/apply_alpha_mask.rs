use image::{GenericImageView, Luma, Pixel, Rgb, Rgba};
use imageproc::{definitions::Image, map::map_colors2};

use crate::error::MatteError;
use crate::matte::pixel_buffer::{Mask, PixelBuffer};
use crate::utils::validate_matching_dimensions;

/// Trait compositing a matte onto an RGB image
///
/// The mask becomes the alpha channel of a new RGBA image. This consumes the
/// original image.
///
/// Note: for frames that already carry alpha, use the `ModifyAlpha` trait.
pub trait ApplyAlphaMask {
    /// Applies the mask as alpha, zeroing color under fully transparent pixels
    ///
    /// # Arguments
    ///
    /// * `mask` - The alpha mask to apply
    ///
    /// # Returns
    ///
    /// RGBA image with the mask as alpha channel
    ///
    /// # Errors
    ///
    /// * `MatteError::DimensionMismatch` - When image and mask dimensions don't match
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use imageops_matte::{ApplyAlphaMask, Image};
    /// use image::{ImageBuffer, Rgb, Luma};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let rgb_image: Image<Rgb<u8>> = ImageBuffer::new(10, 10);
    /// let mask: Image<Luma<u8>> = ImageBuffer::new(10, 10);
    ///
    /// let rgba_image = rgb_image.apply_alpha_mask(&mask)?;
    /// # Ok(())
    /// # }
    /// ```
    fn apply_alpha_mask(self, mask: &Mask) -> Result<PixelBuffer, MatteError>;
}

/// Trait replacing the alpha channel of RGBA frames with a matte
///
/// Every pixel whose resulting alpha is 0 also has its R, G and B set to 0.
/// Encoders that drop alpha would otherwise reveal whatever color sat under
/// the transparent region as a dark fringe.
pub trait ModifyAlpha {
    /// Replaces the alpha channel with the provided mask
    ///
    /// This consumes the original image.
    ///
    /// # Errors
    ///
    /// * `MatteError::DimensionMismatch` - When image and mask dimensions don't match
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use imageops_matte::{Image, ModifyAlpha};
    /// use image::{ImageBuffer, Rgba, Luma};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let rgba_image: Image<Rgba<u8>> = ImageBuffer::new(10, 10);
    /// let new_mask: Image<Luma<u8>> = ImageBuffer::new(10, 10);
    ///
    /// let updated = rgba_image.replace_alpha(&new_mask)?;
    /// # Ok(())
    /// # }
    /// ```
    fn replace_alpha(self, mask: &Mask) -> Result<Self, MatteError>
    where
        Self: Sized;

    /// Replaces the alpha channel with the provided mask in-place
    ///
    /// # Errors
    ///
    /// * `MatteError::DimensionMismatch` - When image and mask dimensions don't match
    fn replace_alpha_mut(&mut self, mask: &Mask) -> Result<&mut Self, MatteError>;
}

impl ApplyAlphaMask for Image<Rgb<u8>> {
    fn apply_alpha_mask(self, mask: &Mask) -> Result<PixelBuffer, MatteError> {
        validate_dimensions(&self, mask)?;

        Ok(map_colors2(&self, mask, |Rgb([red, green, blue]), Luma([alpha])| {
            composite(Rgba([red, green, blue, alpha]))
        }))
    }
}

impl ModifyAlpha for PixelBuffer {
    fn replace_alpha(self, mask: &Mask) -> Result<Self, MatteError> {
        validate_dimensions(&self, mask)?;

        Ok(map_colors2(&self, mask, |Rgba([red, green, blue, _]), Luma([alpha])| {
            composite(Rgba([red, green, blue, alpha]))
        }))
    }

    fn replace_alpha_mut(&mut self, mask: &Mask) -> Result<&mut Self, MatteError> {
        validate_dimensions(self, mask)?;

        self.pixels_mut()
            .zip(mask.pixels())
            .for_each(|(pixel, Luma([alpha]))| {
                let Rgba([red, green, blue, _]) = *pixel;
                *pixel = composite(Rgba([red, green, blue, *alpha]));
            });

        Ok(self)
    }
}

#[inline]
const fn composite(pixel: Rgba<u8>) -> Rgba<u8> {
    match pixel {
        Rgba([_, _, _, 0]) => Rgba([0, 0, 0, 0]),
        opaque_or_partial => opaque_or_partial,
    }
}

/// Function to validate dimensions
#[inline]
fn validate_dimensions<I, P>(image: &I, mask: &Mask) -> Result<(), MatteError>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel,
{
    validate_matching_dimensions(image.dimensions(), mask.dimensions())
}
