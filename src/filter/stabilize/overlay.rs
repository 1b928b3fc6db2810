//! Debug drawing of fields and their measured displacements

use super::aggregate::MatchedField;

const SCAN_AREA_VALUE: u8 = 80;
const FIELD_VALUE: u8 = 40;
const CENTER_VALUE: u8 = 128;
const TARGET_VALUE: u8 = 250;

/// A writable 8-bit plane with interleaved samples
pub struct Canvas<'a> {
    data: &'a mut [u8],
    width: usize,
    height: usize,
    stride: usize,
    bytes_per_pixel: usize,
}

impl<'a> Canvas<'a> {
    pub fn new(data: &'a mut [u8], width: usize, height: usize, stride: usize, bytes_per_pixel: usize) -> Self {
        Canvas {
            data,
            width,
            height,
            stride,
            bytes_per_pixel,
        }
    }

    /// Fill a `size_x` x `size_y` box centered on `(x, y)` with `value` in
    /// every channel, clipped to the plane
    pub fn draw_box(&mut self, x: isize, y: isize, size_x: usize, size_y: usize, value: u8) {
        let x0 = (x - (size_x / 2) as isize).max(0);
        let y0 = (y - (size_y / 2) as isize).max(0);
        let x1 = (x - (size_x / 2) as isize + size_x as isize).min(self.width as isize);
        let y1 = (y - (size_y / 2) as isize + size_y as isize).min(self.height as isize);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let bpp = self.bytes_per_pixel;
        for row in y0 as usize..y1 as usize {
            let start = row * self.stride + x0 as usize * bpp;
            let end = row * self.stride + x1 as usize * bpp;
            if let Some(span) = self.data.get_mut(start..end) {
                span.fill(value);
            }
        }
    }
}

/// Draw the fields that took part in the estimate
///
/// Level 2 adds the search area of every field. Each pass covers all
/// fields before the next one starts, so later marks stay visible where
/// boxes overlap.
pub fn draw_overlay(canvas: &mut Canvas<'_>, matched: &[MatchedField], max_shift: usize, show: u32) {
    if show == 0 {
        return;
    }
    if show >= 2 {
        for m in matched {
            let side = m.field.size + 2 * max_shift;
            canvas.draw_box(m.field.x as isize, m.field.y as isize, side, side, SCAN_AREA_VALUE);
        }
    }
    for m in matched {
        canvas.draw_box(
            m.field.x as isize,
            m.field.y as isize,
            m.field.size,
            m.field.size,
            FIELD_VALUE,
        );
    }
    for m in matched {
        let (x, y) = (m.field.x as isize, m.field.y as isize);
        canvas.draw_box(x, y, 5, 5, CENTER_VALUE);
        canvas.draw_box(
            x + m.transform.x.round() as isize,
            y + m.transform.y.round() as isize,
            8,
            8,
            TARGET_VALUE,
        );
    }
}
