//! YUV4MPEG2 reading and writing

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use super::FrameReader;
use crate::error::{Error, Result};
use crate::frame::VideoFrame;
use crate::util::{PixelFormat, Timestamp};

/// Reads 8-bit 4:2:0 and 4:2:2 Y4M streams
pub struct Y4mReader<R: Read> {
    decoder: y4m::Decoder<R>,
    width: u32,
    height: u32,
    format: PixelFormat,
    framerate: (usize, usize),
    frame_number: u64,
}

impl Y4mReader<BufReader<File>> {
    /// Open a Y4M file
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::format(format!("Failed to open file: {}", e)))?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read> Y4mReader<R> {
    /// Parse the stream header
    pub fn new(reader: R) -> Result<Self> {
        let decoder =
            y4m::decode(reader).map_err(|e| Error::format(format!("Failed to decode Y4M header: {}", e)))?;

        let format = Self::colorspace_to_pixel_format(decoder.get_colorspace())?;
        let framerate = decoder.get_framerate();

        Ok(Y4mReader {
            width: decoder.get_width() as u32,
            height: decoder.get_height() as u32,
            format,
            framerate: (framerate.num, framerate.den),
            decoder,
            frame_number: 0,
        })
    }

    fn colorspace_to_pixel_format(colorspace: y4m::Colorspace) -> Result<PixelFormat> {
        match colorspace {
            y4m::Colorspace::C420 | y4m::Colorspace::C420jpeg | y4m::Colorspace::C420paldv => {
                Ok(PixelFormat::YUV420P)
            }
            y4m::Colorspace::C422 => Ok(PixelFormat::YUV422P),
            other => Err(Error::unsupported(format!("Y4M colorspace {:?}", other))),
        }
    }
}

impl<R: Read> FrameReader for Y4mReader<R> {
    fn geometry(&self) -> (u32, u32, PixelFormat) {
        (self.width, self.height, self.format)
    }

    fn framerate(&self) -> (usize, usize) {
        self.framerate
    }

    fn read_frame(&mut self) -> Result<VideoFrame> {
        let frame = self.decoder.read_frame().map_err(|e| match e {
            y4m::Error::EOF => Error::EndOfStream,
            _ => Error::format(format!("Failed to read frame: {}", e)),
        })?;

        let planes = vec![
            frame.get_y_plane().to_vec(),
            frame.get_u_plane().to_vec(),
            frame.get_v_plane().to_vec(),
        ];
        let mut video = VideoFrame::from_planes(self.width, self.height, self.format, planes);
        video.pts = Timestamp::new(self.frame_number);
        self.frame_number += 1;
        Ok(video)
    }
}

/// Writes planar 4:2:0 or 4:2:2 frames as Y4M
pub struct Y4mWriter<W: Write> {
    encoder: y4m::Encoder<W>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl Y4mWriter<BufWriter<File>> {
    /// Create a Y4M file
    pub fn create(path: &Path, width: u32, height: u32, format: PixelFormat, framerate: (usize, usize)) -> Result<Self> {
        let file = File::create(path).map_err(|e| Error::format(format!("Failed to create file: {}", e)))?;
        Self::new(BufWriter::new(file), width, height, format, framerate)
    }
}

impl<W: Write> Y4mWriter<W> {
    /// Write the stream header
    pub fn new(writer: W, width: u32, height: u32, format: PixelFormat, framerate: (usize, usize)) -> Result<Self> {
        let colorspace = match format {
            PixelFormat::YUV420P => y4m::Colorspace::C420,
            PixelFormat::YUV422P => y4m::Colorspace::C422,
            other => return Err(Error::unsupported(format!("Y4M output of {}", other))),
        };
        let encoder = y4m::encode(
            width as usize,
            height as usize,
            y4m::Ratio::new(framerate.0, framerate.1),
        )
        .with_colorspace(colorspace)
        .write_header(writer)
        .map_err(|e| Error::format(format!("Failed to write Y4M header: {}", e)))?;

        Ok(Y4mWriter {
            encoder,
            width,
            height,
            format,
        })
    }

    /// Append one frame, which must match the stream geometry
    pub fn write_frame(&mut self, frame: &VideoFrame) -> Result<()> {
        if (frame.width, frame.height, frame.format) != (self.width, self.height, self.format) {
            return Err(Error::invalid_input(format!(
                "frame {}x{} {} does not match stream {}x{} {}",
                frame.width, frame.height, frame.format, self.width, self.height, self.format
            )));
        }
        let plane = |index: usize| {
            frame
                .plane(index)
                .map(|p| p.as_slice())
                .ok_or_else(|| Error::invalid_input(format!("frame has no plane {}", index)))
        };
        let y4m_frame = y4m::Frame::new([plane(0)?, plane(1)?, plane(2)?], None);
        self.encoder
            .write_frame(&y4m_frame)
            .map_err(|e| Error::format(format!("Failed to write frame: {}", e)))?;
        Ok(())
    }
}
