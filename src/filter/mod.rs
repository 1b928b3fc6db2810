//! Video frame filters

pub mod stabilize;

pub use stabilize::{StabilizeFilter, StabilizeOptions, Transform};

use crate::error::Result;
use crate::frame::VideoFrame;

/// Filter trait for processing frames
pub trait Filter {
    /// Process an input frame and produce output frame(s)
    fn filter(&mut self, input: VideoFrame) -> Result<Vec<VideoFrame>>;

    /// Flush any buffered frames
    fn flush(&mut self) -> Result<Vec<VideoFrame>>;
}
