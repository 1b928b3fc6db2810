//! Uncompressed video frames and the plane view the estimator reads

use crate::error::{Error, Result};
use crate::util::{Buffer, PixelFormat, Timestamp};

/// A decoded video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Frame data (one buffer per plane)
    pub data: Vec<Buffer>,

    /// Line sizes for each plane, in bytes
    pub linesize: Vec<usize>,

    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Pixel format
    pub format: PixelFormat,

    /// Presentation timestamp
    pub pts: Timestamp,
}

impl VideoFrame {
    /// Create a new video frame without planes
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        VideoFrame {
            data: Vec::new(),
            linesize: Vec::new(),
            width,
            height,
            format,
            pts: Timestamp::unknown(),
        }
    }

    /// Create a frame from tightly packed planes
    pub fn from_planes(width: u32, height: u32, format: PixelFormat, planes: Vec<Vec<u8>>) -> Self {
        let mut frame = VideoFrame::new(width, height, format);
        for (index, plane) in planes.into_iter().enumerate() {
            let stride = format
                .plane_size(index, width as usize, height as usize)
                .map(|(w, _)| w)
                .unwrap_or(0);
            frame.linesize.push(stride);
            frame.data.push(Buffer::from_vec(plane));
        }
        frame
    }

    /// Get the number of planes
    pub fn num_planes(&self) -> usize {
        self.data.len()
    }

    /// Get a plane by index
    pub fn plane(&self, index: usize) -> Option<&Buffer> {
        self.data.get(index)
    }

    /// Borrow the plane motion is measured on (luma, or packed RGB)
    pub fn analysis_plane(&self) -> Result<PlaneView<'_>> {
        let bytes_per_pixel = self
            .format
            .analysis_bytes_per_pixel()
            .ok_or_else(|| Error::unsupported(format!("pixel format {}", self.format)))?;
        let data = self
            .plane(0)
            .ok_or_else(|| Error::invalid_input("frame has no planes"))?;
        let stride = self
            .linesize
            .first()
            .copied()
            .unwrap_or(self.width as usize * bytes_per_pixel);

        PlaneView::new(
            data.as_slice(),
            self.width as usize,
            self.height as usize,
            stride,
            bytes_per_pixel,
        )
    }
}

/// A borrowed, read-only view of one 8-bit plane
///
/// Samples of a pixel are interleaved (`bytes_per_pixel` of them); rows are
/// `stride` bytes apart.
#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
    bytes_per_pixel: usize,
}

impl<'a> PlaneView<'a> {
    /// Create a view, checking that `data` covers every row
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
        bytes_per_pixel: usize,
    ) -> Result<Self> {
        if bytes_per_pixel == 0 || stride < width * bytes_per_pixel {
            return Err(Error::invalid_input(format!(
                "stride {} too small for width {} x {} bytes",
                stride, width, bytes_per_pixel
            )));
        }
        let needed = match height {
            0 => 0,
            h => (h - 1) * stride + width * bytes_per_pixel,
        };
        if data.len() < needed {
            return Err(Error::invalid_input(format!(
                "plane holds {} bytes, {}x{} needs {}",
                data.len(),
                width,
                height,
                needed
            )));
        }
        Ok(PlaneView {
            data,
            width,
            height,
            stride,
            bytes_per_pixel,
        })
    }

    /// View over a tightly packed buffer
    pub fn packed(data: &'a [u8], width: usize, height: usize, bytes_per_pixel: usize) -> Result<Self> {
        Self::new(data, width, height, width * bytes_per_pixel, bytes_per_pixel)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    /// The underlying bytes, including row padding
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// `len` pixels of row `y` starting at pixel column `x`, all channels
    #[inline]
    pub fn row_span(&self, x: usize, y: usize, len: usize) -> &'a [u8] {
        let start = y * self.stride + x * self.bytes_per_pixel;
        &self.data[start..start + len * self.bytes_per_pixel]
    }

    /// Copy the visible samples into `dst`, tightly packed, reusing its
    /// allocation.
    pub fn copy_packed_into(&self, dst: &mut Vec<u8>) {
        let row_bytes = self.width * self.bytes_per_pixel;
        dst.clear();
        dst.reserve(row_bytes * self.height);
        for y in 0..self.height {
            dst.extend_from_slice(self.row_span(0, y, self.width));
        }
    }
}
