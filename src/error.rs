use thiserror::Error;

/// Error type for matte extraction and compositing
///
/// Every operation in this crate works on a single frame and reports
/// failures through this type. No variant leaves partial output behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatteError {
    /// Width or height of the buffer is zero
    ///
    /// Fatal for the frame being processed; no pixel work is attempted.
    #[error("Invalid image dimensions {width}x{height}: width and height must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// A threshold argument lies outside the 0-255 channel range
    ///
    /// Thresholds are checked before any pixel is touched.
    #[error("Threshold `{name}` is out of range: {value} (expected 0..=255)")]
    ThresholdOutOfRange {
        /// Name of the offending parameter
        name: &'static str,
        /// Rejected value
        value: i64,
    },

    /// The input does not carry an alpha channel where one is required
    #[error("Unsupported pixel format: expected 4 channels (RGBA), got {channels}")]
    UnsupportedPixelFormat {
        /// Number of interleaved channels found in the input
        channels: u8,
    },

    /// Image and mask dimensions do not match
    #[error("Image and mask dimensions do not match: expected {expected:?}, actual {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height)
        expected: (u32, u32),
        /// Actual dimensions (width, height)
        actual: (u32, u32),
    },

    /// Invalid parameter provided to the operation
    ///
    /// Covers configuration values other than thresholds, such as a
    /// multiplier below 1.0 or a malformed key color.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// A frame that failed inside a multi-frame run
///
/// The failure is isolated to the frame at `index`; frames before and
/// after it are processed normally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Frame {index} failed: {error}")]
pub struct FrameFailure {
    /// Zero-based position of the frame in the source sequence
    pub index: usize,
    /// Underlying per-frame error
    #[source]
    pub error: MatteError,
}
