//! Frame positions within a stream

use std::fmt;

/// Position of a frame, counted in frames from the start of its stream
///
/// Frames built in memory carry no position until a reader assigns one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(Option<u64>);

impl Timestamp {
    pub fn new(frame: u64) -> Self {
        Timestamp(Some(frame))
    }

    pub fn unknown() -> Self {
        Timestamp(None)
    }

    pub fn frame(&self) -> Option<u64> {
        self.0
    }

    /// Seconds from the stream start at `framerate` (numerator, denominator)
    pub fn seconds(&self, framerate: (usize, usize)) -> Option<f64> {
        let (num, den) = framerate;
        if num == 0 {
            return None;
        }
        self.0.map(|frame| frame as f64 * den as f64 / num as f64)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(frame) => write!(f, "{}", frame),
            None => write!(f, "-"),
        }
    }
}
