//! Frame source and sink boundaries plus a multi-frame driver.
//!
//! Decoding and encoding live outside the crate; sources and sinks only
//! exchange [`PixelBuffer`]s. Each frame is processed independently, so a
//! failure on one frame is recorded with its index and the run continues.

use std::collections::VecDeque;
use std::convert::Infallible;

use crate::error::{FrameFailure, MatteError};
use crate::matte::algorithm::ComputeMatte;
use crate::matte::pixel_buffer::PixelBuffer;

/// Properties shared by every frame of a source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMetadata {
    pub width: u32,
    pub height: u32,
    /// Nominal frames per second, when the source is a video
    pub frame_rate: Option<f64>,
}

/// Lazy, finite sequence of frames
///
/// Restarting means constructing the source again.
pub trait FrameSource {
    fn metadata(&self) -> FrameMetadata;

    /// Next frame, or `None` once the sequence is exhausted
    fn next_frame(&mut self) -> Option<PixelBuffer>;
}

/// Consumer of processed frames, in production order
pub trait FrameSink {
    type Error;

    fn push_frame(&mut self, frame: PixelBuffer) -> Result<(), Self::Error>;
}

/// Frames held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryFrameSource {
    frames: VecDeque<PixelBuffer>,
    frame_rate: Option<f64>,
}

impl MemoryFrameSource {
    pub fn new(frames: impl IntoIterator<Item = PixelBuffer>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            frame_rate: None,
        }
    }

    #[must_use]
    pub const fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = Some(frame_rate);
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for MemoryFrameSource {
    fn metadata(&self) -> FrameMetadata {
        let (width, height) = self
            .frames
            .front()
            .map_or((0, 0), |frame| frame.dimensions());
        FrameMetadata {
            width,
            height,
            frame_rate: self.frame_rate,
        }
    }

    fn next_frame(&mut self) -> Option<PixelBuffer> {
        self.frames.pop_front()
    }
}

/// Collects processed frames in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryFrameSink {
    frames: Vec<PixelBuffer>,
}

impl MemoryFrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[PixelBuffer] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<PixelBuffer> {
        self.frames
    }
}

impl FrameSink for MemoryFrameSink {
    type Error = Infallible;

    fn push_frame(&mut self, frame: PixelBuffer) -> Result<(), Self::Error> {
        self.frames.push(frame);
        Ok(())
    }
}

/// Outcome of [`process_frames`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Frames successfully handed to the sink
    pub processed: usize,
    /// Frames that failed, in index order
    pub failures: Vec<FrameFailure>,
}

impl ProcessReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Computes and composites every frame of a batch, preserving order
///
/// Frames are processed in parallel when the `rayon` feature is enabled.
pub fn process_batch<A>(frames: &[PixelBuffer], algorithm: &A) -> Vec<Result<PixelBuffer, MatteError>>
where
    A: ComputeMatte + Sync,
{
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        frames
            .par_iter()
            .map(|frame| algorithm.compute_composited(frame))
            .collect()
    }

    #[cfg(not(feature = "rayon"))]
    {
        frames
            .iter()
            .map(|frame| algorithm.compute_composited(frame))
            .collect()
    }
}

/// Pulls frames from `source`, mattes them and pushes the results to `sink`
///
/// Frames are read in batches of `batch_size` (at least one). A frame that
/// fails is reported in the returned [`ProcessReport`] and skipped; it is
/// never pushed to the sink.
///
/// # Errors
///
/// Returns the sink's error if pushing a frame fails. Frames already pushed
/// stay pushed.
pub fn process_frames<S, A, K>(
    source: &mut S,
    algorithm: &A,
    sink: &mut K,
    batch_size: usize,
) -> Result<ProcessReport, K::Error>
where
    S: FrameSource + ?Sized,
    A: ComputeMatte + Sync,
    K: FrameSink + ?Sized,
{
    let batch_size = batch_size.max(1);
    let metadata = source.metadata();
    tracing::debug!(
        width = metadata.width,
        height = metadata.height,
        frame_rate = ?metadata.frame_rate,
        batch_size,
        "processing frame sequence"
    );

    let mut report = ProcessReport::default();
    let mut next_index = 0usize;

    loop {
        let batch: Vec<PixelBuffer> = std::iter::from_fn(|| source.next_frame())
            .take(batch_size)
            .collect();
        if batch.is_empty() {
            break;
        }

        for (offset, result) in process_batch(&batch, algorithm).into_iter().enumerate() {
            let index = next_index + offset;
            match result {
                Ok(frame) => {
                    sink.push_frame(frame)?;
                    report.processed += 1;
                }
                Err(error) => {
                    tracing::warn!(index, %error, "frame failed");
                    report.failures.push(FrameFailure { index, error });
                }
            }
        }
        next_index += batch.len();
    }

    tracing::debug!(
        processed = report.processed,
        failed = report.failures.len(),
        "frame sequence complete"
    );
    Ok(report)
}
