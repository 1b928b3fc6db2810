//! Uncompressed frame input and output
//!
//! Frames come either from YUV4MPEG2 streams or from headerless raw files
//! whose geometry is given on the command line.

pub mod raw;
pub mod y4m;

pub use self::raw::RawReader;
pub use self::y4m::{Y4mReader, Y4mWriter};

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{Error, Result};
use crate::frame::VideoFrame;
use crate::util::PixelFormat;

/// Sequential source of decoded frames
pub trait FrameReader {
    /// Width, height and pixel format of every frame
    fn geometry(&self) -> (u32, u32, PixelFormat);

    /// Read the next frame, `Error::EndOfStream` once exhausted
    fn read_frame(&mut self) -> Result<VideoFrame>;

    /// Frame rate as `(numerator, denominator)`
    fn framerate(&self) -> (usize, usize) {
        (25, 1)
    }
}

/// Input container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Y4m,
    Raw(PixelFormat),
}

impl InputFormat {
    /// Parse a `--format` value
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "y4m" => Ok(InputFormat::Y4m),
            other => {
                let format: PixelFormat = other.parse()?;
                if format.analysis_bytes_per_pixel().is_none() {
                    return Err(Error::unsupported(format!("raw input format {}", format)));
                }
                Ok(InputFormat::Raw(format))
            }
        }
    }
}

/// Detect the input format from the file extension
pub fn detect_format_from_extension(path: &Path) -> Option<InputFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "y4m" => Some(InputFormat::Y4m),
        "rgb" => Some(InputFormat::Raw(PixelFormat::RGB24)),
        "yuv" => Some(InputFormat::Raw(PixelFormat::YUV420P)),
        _ => None,
    }
}

/// Open `path` as a frame source
///
/// Raw input needs `size`; Y4M carries its own geometry.
pub fn open_input(
    path: &Path,
    format: Option<InputFormat>,
    size: Option<(u32, u32)>,
) -> Result<Box<dyn FrameReader>> {
    let format = format
        .or_else(|| detect_format_from_extension(path))
        .ok_or_else(|| Error::format(format!("cannot tell the format of {}", path.display())))?;

    let file = File::open(path)
        .map_err(|e| Error::format(format!("Failed to open {}: {}", path.display(), e)))?;
    let reader = BufReader::new(file);

    match format {
        InputFormat::Y4m => Ok(Box::new(Y4mReader::new(reader)?)),
        InputFormat::Raw(pixel_format) => {
            let (width, height) = size.ok_or_else(|| {
                Error::invalid_input(format!("raw {} input needs a frame size", pixel_format))
            })?;
            Ok(Box::new(RawReader::new(reader, width, height, pixel_format)?))
        }
    }
}

/// Parse a `WxH` frame size
pub fn parse_size(s: &str) -> Result<(u32, u32)> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| Error::invalid_input(format!("frame size '{}' is not WxH", s)))?;
    let width = w
        .trim()
        .parse()
        .map_err(|_| Error::invalid_input(format!("bad width in '{}'", s)))?;
    let height = h
        .trim()
        .parse()
        .map_err(|_| Error::invalid_input(format!("bad height in '{}'", s)))?;
    if width == 0 || height == 0 {
        return Err(Error::invalid_input(format!("frame size '{}' is empty", s)));
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(
            detect_format_from_extension(Path::new("clip.Y4M")),
            Some(InputFormat::Y4m)
        );
        assert_eq!(
            detect_format_from_extension(Path::new("clip.rgb")),
            Some(InputFormat::Raw(PixelFormat::RGB24))
        );
        assert_eq!(detect_format_from_extension(Path::new("clip.mp4")), None);
    }

    #[test]
    fn test_format_names() {
        assert_eq!(InputFormat::from_name("y4m").unwrap(), InputFormat::Y4m);
        assert_eq!(
            InputFormat::from_name("yuv422p").unwrap(),
            InputFormat::Raw(PixelFormat::YUV422P)
        );
        assert!(InputFormat::from_name("gray8").is_err());
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("320x240").unwrap(), (320, 240));
        assert_eq!(parse_size("64X48").unwrap(), (64, 48));
        assert!(parse_size("320").is_err());
        assert!(parse_size("0x10").is_err());
    }
}
