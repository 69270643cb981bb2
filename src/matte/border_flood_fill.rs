//! Connectivity-based matte extraction.
//!
//! Background pixels are removed only when they are reachable from the image
//! border through a 4-connected path of matchable pixels. Matchable regions
//! enclosed by foreground (for example dark outlines inside a sticker) keep
//! full opacity because the traversal never crosses a non-matchable pixel.

use std::collections::VecDeque;

use image::{ImageBuffer, Luma, Pixel, Rgb};
use imageproc::definitions::Image;

use crate::error::MatteError;
use crate::matte::pixel_buffer::{validate_frame, Mask};

/// Default blackness threshold used when none is configured
pub const DEFAULT_BLACKNESS_THRESHOLD: u8 = 30;

/// Trait providing border-connected background removal
pub trait BorderFloodFillMatte {
    /// Computes a binary matte that removes border-connected dark pixels
    ///
    /// A pixel is matchable when each of its R, G and B channels is at most
    /// `blackness_threshold`. Alpha is ignored for the test and pixel colors
    /// are not modified.
    ///
    /// # Returns
    ///
    /// Mask with 0 for every removed pixel and 255 everywhere else
    ///
    /// # Errors
    ///
    /// * `MatteError::InvalidDimensions` - When the image has a zero dimension
    ///
    /// # Examples
    ///
    /// ```
    /// use image::Rgba;
    /// use imageops_matte::{BorderFloodFillMatte, Image};
    ///
    /// # fn example() -> Result<(), imageops_matte::MatteError> {
    /// let image: Image<Rgba<u8>> = Image::from_pixel(5, 5, Rgba([0, 0, 0, 255]));
    /// let mask = image.border_flood_fill_matte(30)?;
    /// assert!(mask.pixels().all(|p| p[0] == 0));
    /// # Ok(())
    /// # }
    /// # example().unwrap();
    /// ```
    fn border_flood_fill_matte(&self, blackness_threshold: u8) -> Result<Mask, MatteError>;
}

impl<P> BorderFloodFillMatte for Image<P>
where
    P: Pixel<Subpixel = u8>,
{
    fn border_flood_fill_matte(&self, blackness_threshold: u8) -> Result<Mask, MatteError> {
        validate_frame(self)?;

        let removed = flood_fill_from_borders(self, blackness_threshold);
        let (width, height) = self.dimensions();
        let mask = ImageBuffer::from_fn(width, height, |x, y| {
            if removed.contains(x, y) {
                Luma([0])
            } else {
                Luma([u8::MAX])
            }
        });

        tracing::debug!(
            width,
            height,
            blackness_threshold,
            removed = removed.count(),
            "border flood fill complete"
        );

        Ok(mask)
    }
}

/// Dense visited/removed bitmap indexed by pixel coordinate
struct Bitmap {
    width: usize,
    bits: Vec<bool>,
    count: usize,
}

impl Bitmap {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as usize,
            bits: vec![false; width as usize * height as usize],
            count: 0,
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width + x as usize
    }

    #[inline]
    fn contains(&self, x: u32, y: u32) -> bool {
        self.bits[self.index(x, y)]
    }

    /// Marks the coordinate, returning `false` when it was already set.
    #[inline]
    fn insert(&mut self, x: u32, y: u32) -> bool {
        let index = self.index(x, y);
        if self.bits[index] {
            return false;
        }
        self.bits[index] = true;
        self.count += 1;
        true
    }

    #[inline]
    const fn count(&self) -> usize {
        self.count
    }
}

#[inline]
fn is_matchable<P>(pixel: &P, blackness_threshold: u8) -> bool
where
    P: Pixel<Subpixel = u8>,
{
    let Rgb([red, green, blue]) = pixel.to_rgb();
    red <= blackness_threshold && green <= blackness_threshold && blue <= blackness_threshold
}

/// Enumerates every border coordinate exactly once.
///
/// Top and bottom rows come first, followed by the left and right columns
/// without their corners. Single-row and single-column images yield each
/// pixel once.
pub(crate) fn border_coordinates(width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    let rows = (0..width).flat_map(move |x| {
        let bottom = (height > 1).then_some((x, height - 1));
        std::iter::once((x, 0)).chain(bottom)
    });
    let columns = (1..height.saturating_sub(1)).flat_map(move |y| {
        let right = (width > 1).then_some((width - 1, y));
        std::iter::once((0, y)).chain(right)
    });
    rows.chain(columns)
}

fn flood_fill_from_borders<P>(image: &Image<P>, blackness_threshold: u8) -> Bitmap
where
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = image.dimensions();
    // Only matchable pixels are ever visited, so the visited set doubles as
    // the removed set.
    let mut visited = Bitmap::new(width, height);
    let mut frontier = VecDeque::new();

    for (seed_x, seed_y) in border_coordinates(width, height) {
        if visited.contains(seed_x, seed_y)
            || !is_matchable(image.get_pixel(seed_x, seed_y), blackness_threshold)
        {
            continue;
        }

        visited.insert(seed_x, seed_y);
        frontier.push_back((seed_x, seed_y));

        while let Some((x, y)) = frontier.pop_front() {
            let neighbors = [
                x.checked_sub(1).map(|nx| (nx, y)),
                (x + 1 < width).then_some((x + 1, y)),
                y.checked_sub(1).map(|ny| (x, ny)),
                (y + 1 < height).then_some((x, y + 1)),
            ];

            for (nx, ny) in neighbors.into_iter().flatten() {
                if !visited.contains(nx, ny)
                    && is_matchable(image.get_pixel(nx, ny), blackness_threshold)
                {
                    visited.insert(nx, ny);
                    frontier.push_back((nx, ny));
                }
            }
        }
    }

    visited
}
