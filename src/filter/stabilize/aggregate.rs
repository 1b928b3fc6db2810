//! Robust combination of per-field displacements into one transform

use std::f64::consts::PI;

use tracing::info;

use super::field::Field;
use super::transform::Transform;

/// Below this many candidates no rotation is estimated
pub const MIN_ROTATION_CANDIDATES: usize = 6;

/// A selected field together with its measured displacement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedField {
    pub field: Field,
    pub transform: Transform,
}

/// Outlier-trimmed mean of `values`, sorting them in place
///
/// With three or more values, `max(1, n/5)` are dropped from each end.
/// Returns `(mean, min, max)` of the retained values, or `None` when
/// `values` is empty.
pub fn clean_mean(values: &mut [f64]) -> Option<(f64, f64, f64)> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let n = values.len();
    let cut = if n >= 3 { (n / 5).max(1) } else { 0 };
    let kept = &values[cut..n - cut];
    let mean = kept.iter().sum::<f64>() / kept.len() as f64;
    Some((mean, kept[0], kept[kept.len() - 1]))
}

/// Per-axis cleaned mean translation of `transforms`
pub fn clean_mean_xy(transforms: &[Transform]) -> Option<Transform> {
    let mut xs: Vec<f64> = transforms.iter().map(|t| t.x).collect();
    let mut ys: Vec<f64> = transforms.iter().map(|t| t.y).collect();
    let (x, _, _) = clean_mean(&mut xs)?;
    let (y, _, _) = clean_mean(&mut ys)?;
    Some(Transform::from_translation(x, y))
}

/// Bearing change, seen from `center`, of a field moved by `residual`,
/// normalized to `(-PI, PI]`
pub fn field_angle(field: &Field, residual: &Transform, center: (f64, f64)) -> f64 {
    let rx = field.x as f64 - center.0;
    let ry = field.y as f64 - center.1;
    let before = ry.atan2(rx);
    let after = (ry + residual.y).atan2(rx + residual.x);
    let diff = after - before;
    if diff > PI {
        diff - 2.0 * PI
    } else if diff <= -PI {
        diff + 2.0 * PI
    } else {
        diff
    }
}

/// Turns the matched fields of one frame into a similarity transform
#[derive(Debug, Clone, Copy)]
pub struct TransformAggregator {
    /// Fields closer than this (Manhattan) to the centroid do not vote on
    /// the angle
    pub max_shift: f64,
    /// Largest accepted spread of the retained angle votes, in radians
    pub max_angle_variation: f64,
    /// Pivot the reported rotation refers to
    pub frame_center: (f64, f64),
}

impl TransformAggregator {
    pub fn new(max_shift: usize, max_angle_variation: f64, width: usize, height: usize) -> Self {
        TransformAggregator {
            max_shift: max_shift as f64,
            max_angle_variation,
            frame_center: (width as f64 / 2.0, height as f64 / 2.0),
        }
    }

    /// Combine `matched` into one transform, `None` if there is nothing to
    /// combine
    pub fn aggregate(&self, matched: &[MatchedField]) -> Option<Transform> {
        if matched.is_empty() {
            return None;
        }

        let n = matched.len() as f64;
        let centroid = (
            matched.iter().map(|m| m.field.x as f64).sum::<f64>() / n,
            matched.iter().map(|m| m.field.y as f64).sum::<f64>() / n,
        );

        let transforms: Vec<Transform> = matched.iter().map(|m| m.transform).collect();
        let mut result = clean_mean_xy(&transforms)?;

        if matched.len() >= MIN_ROTATION_CANDIDATES {
            result.alpha = self.estimate_angle(matched, &result, centroid);
        }

        // rotation was measured about the centroid; re-pivot on the frame center
        let (sin, cos) = result.alpha.sin_cos();
        let px = centroid.0 - self.frame_center.0;
        let py = centroid.1 - self.frame_center.1;
        result.x += (cos - 1.0) * px - sin * py;
        result.y += sin * px + (cos - 1.0) * py;

        Some(result)
    }

    fn estimate_angle(&self, matched: &[MatchedField], mean: &Transform, centroid: (f64, f64)) -> f64 {
        let mut angles: Vec<f64> = matched
            .iter()
            .filter(|m| {
                let dist = (m.field.x as f64 - centroid.0).abs() + (m.field.y as f64 - centroid.1).abs();
                dist >= self.max_shift
            })
            .map(|m| field_angle(&m.field, &m.transform.sub(mean), centroid))
            .collect();

        let Some((angle, min, max)) = clean_mean(&mut angles) else {
            return 0.0;
        };
        if max - min > self.max_angle_variation {
            info!("too large variation in angle ({:.4})", max - min);
            return 0.0;
        }
        // a field's bearing turns opposite to the content rotation
        -angle
    }
}
