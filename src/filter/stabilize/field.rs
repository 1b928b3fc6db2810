//! Measurement fields laid out on a regular grid

use crate::error::{Error, Result};

/// A square measurement region, addressed by its center
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub x: usize,
    pub y: usize,
    pub size: usize,
}

impl Field {
    /// Top-left pixel of the region
    #[inline]
    pub fn origin(&self) -> (usize, usize) {
        (self.x - self.size / 2, self.y - self.size / 2)
    }

    /// Pixel rectangle `(x0, y0, x1, y1)`, exclusive end, covered by the
    /// region when displaced by up to `reach` pixels on each axis
    pub fn search_window(&self, reach: usize) -> (isize, isize, isize, isize) {
        let (ox, oy) = self.origin();
        let reach = reach as isize;
        (
            ox as isize - reach,
            oy as isize - reach,
            (ox + self.size) as isize + reach,
            (oy + self.size) as isize + reach,
        )
    }
}

/// The fields of one frame geometry
///
/// Centers keep `size/2 + max_shift + step_size` pixels away from every
/// edge, so a region displaced anywhere the matcher can reach stays inside
/// the frame.
#[derive(Debug, Clone)]
pub struct FieldGrid {
    fields: Vec<Field>,
    rows: usize,
    cols: usize,
    width: usize,
    height: usize,
}

impl FieldGrid {
    /// Lay out fields for a `width` x `height` frame
    pub fn new(
        width: usize,
        height: usize,
        max_shift: usize,
        step_size: usize,
        field_size: usize,
    ) -> Result<Self> {
        if field_size == 0 {
            return Err(Error::config("fieldsize", "field size must be positive"));
        }
        let rows = grid_count(height, max_shift, field_size);
        let cols = grid_count(width, max_shift, field_size);

        let border = field_size / 2 + max_shift + step_size;
        let span_x = width as isize - 2 * border as isize;
        let span_y = height as isize - 2 * border as isize;
        let step_x = span_x / (cols as isize - 1).max(1);
        let step_y = span_y / (rows as isize - 1).max(1);
        if step_x < 1 || step_y < 1 {
            return Err(Error::config(
                "shakiness",
                format!(
                    "frame {}x{} too small for a {}x{} field grid with border {} \
                     (field size {}, max shift {}, step size {})",
                    width, height, cols, rows, border, field_size, max_shift, step_size
                ),
            ));
        }

        let mut fields = Vec::with_capacity(rows * cols);
        for j in 0..rows {
            for i in 0..cols {
                fields.push(Field {
                    x: border + i * step_x as usize,
                    y: border + j * step_y as usize,
                    size: field_size,
                });
            }
        }

        Ok(FieldGrid {
            fields,
            rows,
            cols,
            width,
            height,
        })
    }

    /// Fields in row-major order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Frame dimensions the grid was built for
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

fn grid_count(extent: usize, max_shift: usize, field_size: usize) -> usize {
    let usable = extent as isize - 2 * max_shift as isize;
    (usable / field_size as isize - 1).max(3) as usize
}
