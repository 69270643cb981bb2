//! Run configuration consumed by the matte algorithms.
//!
//! A [`MatteConfig`] is validated once by [`MatteConfig::build`] and then
//! shared read-only by every frame of a run.

use std::fmt;
use std::str::FromStr;

use crate::error::MatteError;
use crate::matte::algorithm::{BorderFloodFill, MatteAlgorithm};
use crate::matte::border_flood_fill::DEFAULT_BLACKNESS_THRESHOLD;
use crate::matte::chroma_key::ChromaKey;
use crate::matte::color_key::{ColorKey, KeyColor, DEFAULT_KEY_THRESHOLD};
use crate::matte::despill::{DespillConfig, DEFAULT_EDGE_THRESHOLD_MULTIPLIER};
use crate::matte::morphology::MorphologyConfig;
use crate::utils::validate_threshold;

/// Which matte algorithm a run uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AlgorithmKind {
    /// Border-connected flood fill of dark pixels
    #[default]
    FloodFill,
    /// Chroma key with morphology and despill
    ChromaKey,
}

impl AlgorithmKind {
    /// Threshold used when the configuration does not override it
    pub const fn default_threshold(self) -> u8 {
        match self {
            Self::FloodFill => DEFAULT_BLACKNESS_THRESHOLD,
            Self::ChromaKey => DEFAULT_KEY_THRESHOLD,
        }
    }
}

impl FromStr for AlgorithmKind {
    type Err = MatteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "flood_fill" => Ok(Self::FloodFill),
            "chroma_key" => Ok(Self::ChromaKey),
            other => Err(MatteError::InvalidParameter(format!(
                "unknown algorithm `{other}` (expected flood_fill or chroma_key)"
            ))),
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FloodFill => "flood_fill",
            Self::ChromaKey => "chroma_key",
        })
    }
}

/// Configuration surface of the matte core
///
/// `key_color`, `edge_threshold_multiplier`, `morphology` and `despill` only
/// matter for [`AlgorithmKind::ChromaKey`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatteConfig {
    pub algorithm: AlgorithmKind,
    /// Match tolerance, 0-255; `None` picks the algorithm's default
    pub threshold: Option<i64>,
    pub key_color: KeyColor,
    /// Widening of the threshold inside the edge band (at least 1.0)
    pub edge_threshold_multiplier: f32,
    pub morphology: MorphologyConfig,
    pub despill: DespillConfig,
}

impl Default for MatteConfig {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmKind::default(),
            threshold: None,
            key_color: KeyColor::default(),
            edge_threshold_multiplier: DEFAULT_EDGE_THRESHOLD_MULTIPLIER,
            morphology: MorphologyConfig::default(),
            despill: DespillConfig::default(),
        }
    }
}

impl MatteConfig {
    /// Border flood fill with the given blackness threshold
    pub fn flood_fill(threshold: i64) -> Self {
        Self {
            algorithm: AlgorithmKind::FloodFill,
            threshold: Some(threshold),
            ..Self::default()
        }
    }

    /// Chroma key for `key_color` with the given tolerance
    pub fn chroma_key(key_color: KeyColor, threshold: i64) -> Self {
        Self {
            algorithm: AlgorithmKind::ChromaKey,
            threshold: Some(threshold),
            key_color,
            ..Self::default()
        }
    }

    /// Effective threshold after validation
    ///
    /// # Errors
    ///
    /// * `MatteError::ThresholdOutOfRange` - When the threshold is outside 0-255
    pub fn effective_threshold(&self) -> Result<u8, MatteError> {
        self.threshold.map_or_else(
            || Ok(self.algorithm.default_threshold()),
            |value| validate_threshold("threshold", value),
        )
    }

    /// Validates the configuration and builds the selected algorithm
    ///
    /// # Errors
    ///
    /// * `MatteError::ThresholdOutOfRange` - When the threshold is outside 0-255
    /// * `MatteError::InvalidParameter` - When a chroma-key parameter is invalid
    pub fn build(&self) -> Result<MatteAlgorithm, MatteError> {
        let threshold = self.effective_threshold()?;

        let algorithm = match self.algorithm {
            AlgorithmKind::FloodFill => MatteAlgorithm::FloodFill(BorderFloodFill {
                blackness_threshold: threshold,
            }),
            AlgorithmKind::ChromaKey => {
                let despill = DespillConfig {
                    edge_threshold_multiplier: self.edge_threshold_multiplier,
                    ..self.despill
                };
                let key = ColorKey::new(self.key_color.0, threshold);
                MatteAlgorithm::ChromaKey(ChromaKey::new(key, self.morphology, despill)?)
            }
        };

        tracing::debug!(
            algorithm = algorithm.name(),
            threshold,
            key_color = %self.key_color,
            "matte configuration built"
        );
        Ok(algorithm)
    }
}
