//! Headerless raw frame input

use std::io::{ErrorKind, Read};

use super::FrameReader;
use crate::error::{Error, Result};
use crate::frame::VideoFrame;
use crate::util::{BufferMut, PixelFormat, Timestamp};

/// Reads back-to-back frames of a fixed geometry
pub struct RawReader<R: Read> {
    reader: R,
    width: u32,
    height: u32,
    format: PixelFormat,
    frame_size: usize,
    frame_number: u64,
}

impl<R: Read> RawReader<R> {
    pub fn new(reader: R, width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        if format.analysis_bytes_per_pixel().is_none() {
            return Err(Error::unsupported(format!("raw input format {}", format)));
        }
        let frame_size = format.frame_size(width as usize, height as usize);
        if frame_size == 0 {
            return Err(Error::invalid_input(format!("empty frame size {}x{}", width, height)));
        }
        Ok(RawReader {
            reader,
            width,
            height,
            format,
            frame_size,
            frame_number: 0,
        })
    }

    /// Fill `buf`, returning how many bytes were read before end of input
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> FrameReader for RawReader<R> {
    fn geometry(&self) -> (u32, u32, PixelFormat) {
        (self.width, self.height, self.format)
    }

    fn read_frame(&mut self) -> Result<VideoFrame> {
        let mut data = BufferMut::zeroed(self.frame_size);
        let filled = self.fill(data.as_mut())?;
        if filled == 0 {
            return Err(Error::EndOfStream);
        }
        if filled < self.frame_size {
            return Err(Error::format(format!(
                "truncated frame {}: {} of {} bytes",
                self.frame_number, filled, self.frame_size
            )));
        }

        let data = data.freeze();
        let (width, height) = (self.width as usize, self.height as usize);
        let mut frame = VideoFrame::new(self.width, self.height, self.format);
        let mut offset = 0;
        for index in 0..self.format.num_planes() {
            if let Some((row, rows)) = self.format.plane_size(index, width, height) {
                frame.data.push(data.slice(offset..offset + row * rows));
                frame.linesize.push(row);
                offset += row * rows;
            }
        }
        frame.pts = Timestamp::new(self.frame_number);
        self.frame_number += 1;
        Ok(frame)
    }
}
