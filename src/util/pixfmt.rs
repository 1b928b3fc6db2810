//! Pixel format definitions

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Pixel format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGB24 - 8 bits per component, packed
    RGB24,
    /// YUV420P - Planar YUV 4:2:0
    YUV420P,
    /// YUV422P - Planar YUV 4:2:2
    YUV422P,
    /// GRAY8 - 8-bit grayscale
    GRAY8,
    /// Unknown format
    Unknown,
}

impl PixelFormat {
    /// Bytes per pixel of the plane motion is measured on, if the format is
    /// one the stabilizer can analyse.
    ///
    /// Planar YUV is analysed on its luma plane (1 byte per pixel), packed
    /// RGB on its only plane with all three channels interleaved.
    pub fn analysis_bytes_per_pixel(&self) -> Option<usize> {
        match self {
            PixelFormat::YUV420P | PixelFormat::YUV422P => Some(1),
            PixelFormat::RGB24 => Some(3),
            PixelFormat::GRAY8 | PixelFormat::Unknown => None,
        }
    }

    /// Plane dimensions `(width, height)` in samples for plane `index`
    pub fn plane_size(&self, index: usize, width: usize, height: usize) -> Option<(usize, usize)> {
        match (self, index) {
            (PixelFormat::RGB24, 0) => Some((width * 3, height)),
            (PixelFormat::GRAY8, 0) => Some((width, height)),
            (PixelFormat::YUV420P, 0) | (PixelFormat::YUV422P, 0) => Some((width, height)),
            (PixelFormat::YUV420P, 1 | 2) => Some((width.div_ceil(2), height.div_ceil(2))),
            (PixelFormat::YUV422P, 1 | 2) => Some((width.div_ceil(2), height)),
            _ => None,
        }
    }

    /// Number of planes stored for this format
    pub fn num_planes(&self) -> usize {
        match self {
            PixelFormat::YUV420P | PixelFormat::YUV422P => 3,
            PixelFormat::RGB24 | PixelFormat::GRAY8 => 1,
            PixelFormat::Unknown => 0,
        }
    }

    /// Size in bytes of one tightly packed frame
    pub fn frame_size(&self, width: usize, height: usize) -> usize {
        (0..self.num_planes())
            .filter_map(|plane| self.plane_size(plane, width, height))
            .map(|(w, h)| w * h)
            .sum()
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::RGB24 => "rgb24",
            PixelFormat::YUV420P => "yuv420p",
            PixelFormat::YUV422P => "yuv422p",
            PixelFormat::GRAY8 => "gray8",
            PixelFormat::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for PixelFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb24" | "rgb" => Ok(PixelFormat::RGB24),
            "yuv420p" | "i420" => Ok(PixelFormat::YUV420P),
            "yuv422p" => Ok(PixelFormat::YUV422P),
            "gray8" | "gray" => Ok(PixelFormat::GRAY8),
            other => Err(Error::unsupported(format!("pixel format '{}'", other))),
        }
    }
}

impl Default for PixelFormat {
    fn default() -> Self {
        PixelFormat::Unknown
    }
}
