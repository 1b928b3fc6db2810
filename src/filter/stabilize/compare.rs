//! Absolute-difference metrics between two frames
//!
//! Both metrics stop summing at the end of the first row after which the
//! running sum exceeds `threshold`. Any returned value above `threshold`
//! is only a lower bound of the full sum; values not above it are exact.
//! A caller that only accepts sums strictly below its best-so-far and
//! passes that best as `threshold` therefore picks the same minimum as a
//! full evaluation would.

use super::field::Field;
use crate::frame::PlaneView;

/// Sum of absolute differences over an equal-length pair of spans
#[inline]
fn sad_span(a: &[u8], b: &[u8]) -> u64 {
    a.iter()
        .zip(b)
        .map(|(&p, &q)| u64::from(p.abs_diff(q)))
        .sum()
}

/// Compare `field` in `curr` against the same region displaced by
/// `(dx, dy)` in `prev`, over every byte of every pixel.
///
/// The displaced region must lie inside `prev`; the field grid border
/// guarantees this for every displacement the matcher evaluates.
pub fn compare_region(
    curr: &PlaneView<'_>,
    prev: &PlaneView<'_>,
    field: &Field,
    dx: isize,
    dy: isize,
    threshold: u64,
) -> u64 {
    let (ox, oy) = field.origin();
    let px = (ox as isize + dx) as usize;
    let py = (oy as isize + dy) as usize;

    let mut sum = 0u64;
    for row in 0..field.size {
        let a = curr.row_span(ox, oy + row, field.size);
        let b = prev.row_span(px, py + row, field.size);
        sum += sad_span(a, b);
        if sum > threshold {
            break;
        }
    }
    sum
}

/// Compare the whole overlap of `curr` and `prev` when `prev` is displaced
/// by `(dx, dy)`; pixels without a counterpart are skipped.
pub fn compare_frame(
    curr: &PlaneView<'_>,
    prev: &PlaneView<'_>,
    dx: isize,
    dy: isize,
    threshold: u64,
) -> u64 {
    let width = curr.width().min(prev.width()) as isize;
    let height = curr.height().min(prev.height()) as isize;
    let span = width - dx.abs();
    if span <= 0 || dy.abs() >= height {
        return 0;
    }
    let cx = (-dx).max(0) as usize;
    let px = dx.max(0) as usize;

    let mut sum = 0u64;
    for y in (-dy).max(0)..(height - dy.max(0)) {
        let a = curr.row_span(cx, y as usize, span as usize);
        let b = prev.row_span(px, (y + dy) as usize, span as usize);
        sum += sad_span(a, b);
        if sum > threshold {
            break;
        }
    }
    sum
}
