//! Common test utilities for stabilize integration tests
//!
//! Frames are cut from a larger smoothly textured canvas, so a crop at a
//! different offset is an exact translation of the content and a rotated
//! resampling is an exact rotation up to interpolation.

#![allow(dead_code)]

use stabilize_lib::frame::VideoFrame;
use stabilize_lib::util::PixelFormat;

// ============================================================================
// Texture generation
// ============================================================================

/// A grayscale texture larger than the frames cut from it
pub struct Canvas {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    /// Border around the nominal frame area
    pub margin: usize,
}

impl Canvas {
    /// Box-blurred noise for a `width` x `height` frame plus `margin` on
    /// every side, stretched to roughly 5..250
    pub fn new(width: usize, height: usize, margin: usize, seed: u32) -> Self {
        let cw = width + 2 * margin;
        let ch = height + 2 * margin;
        let noise: Vec<f64> = (0..cw * ch).map(|i| hash_noise(i as u32, seed)).collect();
        let blurred = box_blur(&box_blur_rows(&noise, cw, ch, 3), cw, ch, 3);

        let lo = blurred.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = blurred.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let scale = 245.0 / (hi - lo).max(1e-9);
        let data = blurred
            .iter()
            .map(|v| (5.0 + (v - lo) * scale).round().clamp(0.0, 255.0) as u8)
            .collect();

        Canvas {
            data,
            width: cw,
            height: ch,
            margin,
        }
    }

    /// `width` x `height` crop whose origin sits `(dx, dy)` away from the
    /// nominal frame origin
    ///
    /// For two crops, `curr(p) = prev(p + d)` with `d = offset_curr -
    /// offset_prev`.
    pub fn crop(&self, width: usize, height: usize, dx: isize, dy: isize) -> Vec<u8> {
        let x0 = (self.margin as isize + dx) as usize;
        let y0 = (self.margin as isize + dy) as usize;
        let mut out = Vec::with_capacity(width * height);
        for y in 0..height {
            let start = (y0 + y) * self.width + x0;
            out.extend_from_slice(&self.data[start..start + width]);
        }
        out
    }

    /// `width` x `height` frame of the content rotated by `theta` about the
    /// frame center: `curr(p) = prev(c + R(-theta)(p - c))`
    pub fn rotated(&self, width: usize, height: usize, theta: f64) -> Vec<u8> {
        let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
        let (sin, cos) = theta.sin_cos();
        let mut out = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let vx = x as f64 - cx;
                let vy = y as f64 - cy;
                let sx = cx + cos * vx + sin * vy + self.margin as f64;
                let sy = cy - sin * vx + cos * vy + self.margin as f64;
                out.push(self.sample(sx, sy));
            }
        }
        out
    }

    fn at(&self, x: usize, y: usize) -> f64 {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        f64::from(self.data[y * self.width + x])
    }

    fn sample(&self, x: f64, y: f64) -> u8 {
        let x = x.max(0.0);
        let y = y.max(0.0);
        let (x0, y0) = (x.floor() as usize, y.floor() as usize);
        let (fx, fy) = (x - x0 as f64, y - y0 as f64);
        let top = self.at(x0, y0) * (1.0 - fx) + self.at(x0 + 1, y0) * fx;
        let bottom = self.at(x0, y0 + 1) * (1.0 - fx) + self.at(x0 + 1, y0 + 1) * fx;
        (top * (1.0 - fy) + bottom * fy).round() as u8
    }
}

fn hash_noise(i: u32, seed: u32) -> f64 {
    let mut h = i.wrapping_mul(0x9E37_79B9) ^ seed.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7FEB_352D);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846C_A68B);
    h ^= h >> 16;
    f64::from(h >> 8) / f64::from(1u32 << 24)
}

fn box_blur_rows(src: &[f64], width: usize, height: usize, radius: usize) -> Vec<f64> {
    let mut out = vec![0.0; src.len()];
    for y in 0..height {
        for x in 0..width {
            let lo = x.saturating_sub(radius);
            let hi = (x + radius).min(width - 1);
            let sum: f64 = src[y * width + lo..=y * width + hi].iter().sum();
            out[y * width + x] = sum / (hi - lo + 1) as f64;
        }
    }
    out
}

fn box_blur(src: &[f64], width: usize, height: usize, radius: usize) -> Vec<f64> {
    let mut out = vec![0.0; src.len()];
    for y in 0..height {
        let lo = y.saturating_sub(radius);
        let hi = (y + radius).min(height - 1);
        for x in 0..width {
            let sum: f64 = (lo..=hi).map(|row| src[row * width + x]).sum();
            out[y * width + x] = sum / (hi - lo + 1) as f64;
        }
    }
    out
}

// ============================================================================
// Frame construction
// ============================================================================

/// YUV420P frame with the given luma and neutral chroma
pub fn yuv420_frame(luma: Vec<u8>, width: usize, height: usize) -> VideoFrame {
    let chroma = width.div_ceil(2) * height.div_ceil(2);
    VideoFrame::from_planes(
        width as u32,
        height as u32,
        PixelFormat::YUV420P,
        vec![luma, vec![128; chroma], vec![128; chroma]],
    )
}

/// YUV422P frame with the given luma and neutral chroma
pub fn yuv422_frame(luma: Vec<u8>, width: usize, height: usize) -> VideoFrame {
    let chroma = width.div_ceil(2) * height;
    VideoFrame::from_planes(
        width as u32,
        height as u32,
        PixelFormat::YUV422P,
        vec![luma, vec![128; chroma], vec![128; chroma]],
    )
}

/// RGB24 frame built from a gray texture, with each channel tinted so the
/// channels differ
pub fn rgb_frame(luma: &[u8], width: usize, height: usize) -> VideoFrame {
    let mut packed = Vec::with_capacity(luma.len() * 3);
    for &v in luma {
        packed.push(v);
        packed.push(v / 2 + 60);
        packed.push(255 - v);
    }
    VideoFrame::from_planes(width as u32, height as u32, PixelFormat::RGB24, vec![packed])
}

/// Raw yuv420p bytes for a sequence of luma planes
pub fn raw_yuv420(frames: &[Vec<u8>], width: usize, height: usize) -> Vec<u8> {
    let chroma = width.div_ceil(2) * height.div_ceil(2);
    let mut out = Vec::new();
    for luma in frames {
        out.extend_from_slice(luma);
        out.extend(std::iter::repeat(128u8).take(2 * chroma));
    }
    out
}

/// Offsets of a short camera shake, starting at rest
pub fn shake_path() -> Vec<(isize, isize)> {
    vec![(0, 0), (3, -2), (5, 1), (2, 4), (-1, 3), (-4, -1)]
}

/// Assert two transforms' translations agree within `tolerance`
pub fn assert_translation(t: &stabilize_lib::filter::Transform, x: f64, y: f64, tolerance: f64) {
    assert!(
        (t.x - x).abs() <= tolerance && (t.y - y).abs() <= tolerance,
        "expected ({}, {}), got ({}, {})",
        x,
        y,
        t.x,
        t.y
    );
}
