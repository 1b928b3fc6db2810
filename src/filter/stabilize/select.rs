//! Contrast-ranked, spatially spread field selection

use std::cmp::Ordering;

use super::field::Field;

/// A field's contrast score paired with its index in the grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastIndex {
    pub contrast: f64,
    pub index: usize,
}

/// Highest contrast first; equal scores keep grid order
fn by_contrast_desc(a: &ContrastIndex, b: &ContrastIndex) -> Ordering {
    b.contrast
        .partial_cmp(&a.contrast)
        .unwrap_or(Ordering::Equal)
        .then(a.index.cmp(&b.index))
}

/// Picks up to `max_fields` informative fields
///
/// The grid is cut into `rows + 1` contiguous segments and each segment
/// contributes its best fields first, so the selection is not dominated by
/// one textured corner. Leftover slots go to the best remaining fields of
/// the whole frame.
#[derive(Debug, Clone, Copy)]
pub struct FieldSelector {
    /// Contrast below this is treated as no information
    pub threshold: f64,
    pub max_fields: usize,
    /// Grid rows, which determine the segment count
    pub rows: usize,
}

impl FieldSelector {
    pub fn new(threshold: f64, max_fields: usize, rows: usize) -> Self {
        FieldSelector {
            threshold,
            max_fields,
            rows,
        }
    }

    /// Select fields, scoring each with `contrast`
    ///
    /// Every returned entry has a contrast of at least `threshold` and
    /// above zero. Segment picks come first, in segment order, followed by
    /// the backfill.
    pub fn select<F>(&self, fields: &[Field], mut contrast: F) -> Vec<ContrastIndex>
    where
        F: FnMut(&Field) -> f64,
    {
        let mut scores: Vec<ContrastIndex> = fields
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let c = contrast(field);
                ContrastIndex {
                    contrast: if c < self.threshold { 0.0 } else { c },
                    index,
                }
            })
            .collect();

        let segments = self.rows + 1;
        let segment_len = fields.len() / segments + 1;
        let per_segment = self.max_fields / segments;
        let mut selected = Vec::with_capacity(self.max_fields);

        for segment in 0..segments {
            let start = segment * segment_len;
            let end = ((segment + 1) * segment_len).min(fields.len());
            if start >= end {
                continue;
            }
            let mut ranked = scores[start..end].to_vec();
            ranked.sort_by(by_contrast_desc);
            for entry in ranked.iter().take(per_segment) {
                if entry.contrast <= 0.0 {
                    break;
                }
                selected.push(*entry);
                // taken; keep it out of the backfill
                scores[entry.index].contrast = 0.0;
            }
        }

        let remaining = self.max_fields.saturating_sub(selected.len());
        if remaining > 0 {
            scores.sort_by(by_contrast_desc);
            selected.extend(
                scores
                    .iter()
                    .take_while(|entry| entry.contrast > 0.0)
                    .take(remaining)
                    .copied(),
            );
        }
        selected
    }
}
