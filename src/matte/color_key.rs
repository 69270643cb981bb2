use std::fmt;
use std::str::FromStr;

use image::Rgb;

use crate::error::MatteError;
use crate::matte::convert_color::Hsv;
use crate::utils::rgb_distance;

/// Default chroma green removed by the chroma-key matte (`#00FD21`)
pub const DEFAULT_KEY_COLOR: Rgb<u8> = Rgb([0x00, 0xFD, 0x21]);

/// Default color tolerance for chroma keying
pub const DEFAULT_KEY_THRESHOLD: u8 = 40;

/// Target background color plus match tolerance
///
/// Immutable once constructed; one key is shared by every frame of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorKey {
    color: Rgb<u8>,
    threshold: u8,
    hsv: Hsv,
}

impl ColorKey {
    /// Creates a key for `color` with the given tolerance
    pub fn new(color: Rgb<u8>, threshold: u8) -> Self {
        Self {
            color,
            threshold,
            hsv: Hsv::from_rgb(color),
        }
    }

    /// Key color in RGB
    #[inline]
    pub const fn color(&self) -> Rgb<u8> {
        self.color
    }

    /// Key color in 8-bit HSV
    #[inline]
    pub const fn hsv(&self) -> Hsv {
        self.hsv
    }

    /// Match tolerance (0-255)
    #[inline]
    pub const fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Channel that carries the key's spill (largest component, first on ties)
    pub fn dominant_channel(&self) -> usize {
        let Rgb(channels) = self.color;
        channels
            .iter()
            .enumerate()
            .fold(0, |best, (index, value)| {
                if *value > channels[best] {
                    index
                } else {
                    best
                }
            })
    }

    /// Euclidean RGB distance from a pixel color to the key color
    #[inline]
    pub fn distance(&self, pixel: Rgb<u8>) -> f32 {
        rgb_distance(pixel, self.color)
    }
}

impl Default for ColorKey {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_COLOR, DEFAULT_KEY_THRESHOLD)
    }
}

/// An RGB color parsed from `#RRGGBB`, `RRGGBB` or `0xRRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct KeyColor(pub Rgb<u8>);

impl FromStr for KeyColor {
    type Err = MatteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(MatteError::InvalidParameter(format!(
                "key color must be six hex digits, got `{s}`"
            )));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|e| MatteError::InvalidParameter(format!("key color `{s}`: {e}")))
        };

        Ok(Self(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?])))
    }
}

impl fmt::Display for KeyColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Rgb([red, green, blue]) = self.0;
        write!(f, "#{red:02X}{green:02X}{blue:02X}")
    }
}

impl TryFrom<String> for KeyColor {
    type Error = MatteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyColor> for String {
    fn from(value: KeyColor) -> Self {
        value.to_string()
    }
}

impl Default for KeyColor {
    fn default() -> Self {
        Self(DEFAULT_KEY_COLOR)
    }
}
