//! Local contrast of a measurement field

use super::field::Field;
use crate::frame::PlaneView;

/// Added to the denominator so a black field yields 0 instead of NaN
const CONTRAST_EPSILON: f64 = 0.1;

/// Michelson contrast `(max - min) / (max + min + eps)` of `field`
///
/// Packed multi-channel planes are scored per channel and averaged.
pub fn michelson_contrast(plane: &PlaneView<'_>, field: &Field) -> f64 {
    let channels = plane.bytes_per_pixel();
    let (ox, oy) = field.origin();

    let mut mins = [u8::MAX; 4];
    let mut maxs = [u8::MIN; 4];
    let channels_tracked = channels.min(mins.len());

    for row in 0..field.size {
        let span = plane.row_span(ox, oy + row, field.size);
        for pixel in span.chunks_exact(channels) {
            for (c, &v) in pixel.iter().take(channels_tracked).enumerate() {
                mins[c] = mins[c].min(v);
                maxs[c] = maxs[c].max(v);
            }
        }
    }

    let total: f64 = (0..channels_tracked)
        .map(|c| {
            let (lo, hi) = (f64::from(mins[c]), f64::from(maxs[c]));
            (hi - lo) / (hi + lo + CONTRAST_EPSILON)
        })
        .sum();
    total / channels_tracked as f64
}
