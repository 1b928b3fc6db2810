//! Displacement search for one field, or for the whole frame

use super::compare::{compare_frame, compare_region};
use super::field::Field;
use super::transform::Transform;
use crate::frame::PlaneView;

/// Coarse-to-fine block matcher
///
/// The coarse pass probes every `step_size` displacement inside
/// `[-max_shift, max_shift]` on both axes. Each refinement pass halves the
/// step and probes the neighborhood of the best match so far. The search
/// never reaches further than `max_shift + step_size - 1` from the origin.
#[derive(Debug, Clone, Copy)]
pub struct FieldMatcher {
    pub max_shift: usize,
    pub step_size: usize,
    /// Keep matches on the search boundary instead of discarding them
    pub allow_max: bool,
}

impl FieldMatcher {
    pub fn new(max_shift: usize, step_size: usize, allow_max: bool) -> Self {
        FieldMatcher {
            max_shift,
            step_size: step_size.max(1),
            allow_max,
        }
    }

    /// Farthest displacement the search may evaluate on either axis
    pub fn reach(&self) -> usize {
        self.max_shift + self.step_size - 1
    }

    /// Find the displacement of `field` between `curr` and `prev`
    ///
    /// Content at `p` in `curr` is best matched at `p + (x, y)` in `prev`.
    /// Ties keep the displacement found first, so a static field yields
    /// `(0, 0)`.
    pub fn match_field(&self, curr: &PlaneView<'_>, prev: &PlaneView<'_>, field: &Field) -> Transform {
        let max_shift = self.max_shift as isize;
        let step = self.step_size as isize;

        let mut best = compare_region(curr, prev, field, 0, 0, u64::MAX);
        let (mut tx, mut ty) = (0isize, 0isize);

        let probe = |dx: isize, dy: isize, best: &mut u64, tx: &mut isize, ty: &mut isize| {
            let error = compare_region(curr, prev, field, dx, dy, *best);
            if error < *best {
                *best = error;
                *tx = dx;
                *ty = dy;
            }
        };

        let mut dx = -max_shift;
        while dx <= max_shift {
            let mut dy = -max_shift;
            while dy <= max_shift {
                if dx != 0 || dy != 0 {
                    probe(dx, dy, &mut best, &mut tx, &mut ty);
                }
                dy += step;
            }
            dx += step;
        }

        let mut step = step;
        while step > 1 {
            let (cx, cy) = (tx, ty);
            let fine = step / 2;
            let r = step - fine;
            let mut dx = cx - r;
            while dx <= cx + r {
                let mut dy = cy - r;
                while dy <= cy + r {
                    if dx != cx || dy != cy {
                        probe(dx, dy, &mut best, &mut tx, &mut ty);
                    }
                    dy += fine;
                }
                dx += fine;
            }
            step /= 2;
        }

        if !self.allow_max {
            let limit = (self.max_shift + self.step_size) as isize;
            if tx.abs() >= limit {
                tx = 0;
            }
            if ty.abs() >= limit {
                ty = 0;
            }
        }

        Transform::from_translation(tx as f64, ty as f64)
    }

    /// Exhaustive whole-frame translation search at unit step
    ///
    /// Every displacement in `[-max_shift, max_shift]` is evaluated over the
    /// overlap of both frames; x is the outer loop and the first minimum
    /// wins. No rotation is estimated.
    pub fn match_frame(&self, curr: &PlaneView<'_>, prev: &PlaneView<'_>) -> Transform {
        let max_shift = self.max_shift as isize;
        let mut best = compare_frame(curr, prev, 0, 0, u64::MAX);
        let (mut tx, mut ty) = (0isize, 0isize);

        for dx in -max_shift..=max_shift {
            for dy in -max_shift..=max_shift {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let error = compare_frame(curr, prev, dx, dy, best);
                if error < best {
                    best = error;
                    tx = dx;
                    ty = dy;
                }
            }
        }

        Transform::from_translation(tx as f64, ty as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Box-blurred noise: neighboring displacements score close to each
    /// other, which the coarse pass relies on
    fn texture_rgb(width: usize, height: usize, channels: usize) -> Vec<u8> {
        let mut state = 0x2545_f491u32;
        let noise: Vec<u8> = (0..width * height * channels)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 24) as u8
            })
            .collect();

        let mut out = vec![0u8; noise.len()];
        for y in 0..height {
            for x in 0..width {
                for c in 0..channels {
                    let mut sum = 0u32;
                    for ky in -2isize..=2 {
                        for kx in -2isize..=2 {
                            let sx = (x as isize + kx).clamp(0, width as isize - 1) as usize;
                            let sy = (y as isize + ky).clamp(0, height as isize - 1) as usize;
                            sum += u32::from(noise[(sy * width + sx) * channels + c]);
                        }
                    }
                    out[(y * width + x) * channels + c] = (sum / 25) as u8;
                }
            }
        }
        out
    }

    fn texture(width: usize, height: usize) -> Vec<u8> {
        texture_rgb(width, height, 1)
    }

    /// `curr(x, y) = prev(x + dx, y + dy)`, edges clamped
    fn shifted(prev: &[u8], width: usize, height: usize, dx: isize, dy: isize) -> Vec<u8> {
        let mut out = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..width {
                let sx = (x as isize + dx).clamp(0, width as isize - 1) as usize;
                let sy = (y as isize + dy).clamp(0, height as isize - 1) as usize;
                out[y * width + x] = prev[sy * width + sx];
            }
        }
        out
    }

    #[test]
    fn test_static_field_is_zero() {
        let prev = texture(64, 64);
        let view = PlaneView::packed(&prev, 64, 64, 1).unwrap();
        let field = Field { x: 32, y: 32, size: 16 };
        let t = FieldMatcher::new(4, 2, false).match_field(&view, &view, &field);
        assert_eq!(t, Transform::identity());
    }

    #[test]
    fn test_recovers_small_shift() {
        let prev = texture(64, 64);
        let curr = shifted(&prev, 64, 64, 2, 1);
        let vp = PlaneView::packed(&prev, 64, 64, 1).unwrap();
        let vc = PlaneView::packed(&curr, 64, 64, 1).unwrap();
        let field = Field { x: 32, y: 32, size: 16 };

        let t = FieldMatcher::new(4, 2, false).match_field(&vc, &vp, &field);
        assert_eq!(t, Transform::from_translation(2.0, 1.0));
    }

    #[test]
    fn test_refinement_finds_odd_offsets() {
        let prev = texture(96, 96);
        let vp = PlaneView::packed(&prev, 96, 96, 1).unwrap();
        let field = Field { x: 48, y: 48, size: 24 };
        let matcher = FieldMatcher::new(8, 4, false);

        for (dx, dy) in [(-3, 5), (7, -1), (-8, -8), (1, 0)] {
            let curr = shifted(&prev, 96, 96, dx, dy);
            let vc = PlaneView::packed(&curr, 96, 96, 1).unwrap();
            let t = matcher.match_field(&vc, &vp, &field);
            assert_eq!((t.x, t.y), (dx as f64, dy as f64), "shift {dx},{dy}");
        }
    }

    #[test]
    fn test_search_bounded_by_reach() {
        let prev = texture(96, 96);
        let vp = PlaneView::packed(&prev, 96, 96, 1).unwrap();
        let field = Field { x: 48, y: 48, size: 24 };
        let matcher = FieldMatcher::new(4, 2, false);
        assert_eq!(matcher.reach(), 5);

        // one pixel past max_shift is still found by refinement
        let curr = shifted(&prev, 96, 96, 5, 2);
        let vc = PlaneView::packed(&curr, 96, 96, 1).unwrap();
        let t = matcher.match_field(&vc, &vp, &field);
        assert_eq!((t.x, t.y), (5.0, 2.0));

        let curr = shifted(&prev, 96, 96, 12, -12);
        let vc = PlaneView::packed(&curr, 96, 96, 1).unwrap();
        let t = matcher.match_field(&vc, &vp, &field);
        assert!(t.x.abs() <= 5.0 && t.y.abs() <= 5.0);
    }

    #[test]
    fn test_rgb_fields() {
        let (width, height) = (48, 48);
        let prev = texture_rgb(width, height, 3);
        let mut curr = vec![0u8; prev.len()];
        for y in 0..height {
            for x in 0..width {
                let sx = (x + 3).min(width - 1);
                let sy = y.saturating_sub(2);
                let src = (sy * width + sx) * 3;
                curr[(y * width + x) * 3..][..3].copy_from_slice(&prev[src..src + 3]);
            }
        }
        let vp = PlaneView::packed(&prev, width, height, 3).unwrap();
        let vc = PlaneView::packed(&curr, width, height, 3).unwrap();
        let field = Field { x: 24, y: 24, size: 12 };
        let t = FieldMatcher::new(6, 2, false).match_field(&vc, &vp, &field);
        assert_eq!((t.x, t.y), (3.0, -2.0));
    }

    #[test]
    fn test_match_frame() {
        let prev = texture(48, 40);
        let curr = shifted(&prev, 48, 40, -2, 3);
        let vp = PlaneView::packed(&prev, 48, 40, 1).unwrap();
        let vc = PlaneView::packed(&curr, 48, 40, 1).unwrap();
        let t = FieldMatcher::new(4, 1, false).match_frame(&vc, &vp);
        assert_eq!((t.x, t.y), (-2.0, 3.0));
        assert_eq!(t.alpha, 0.0);
    }
}
