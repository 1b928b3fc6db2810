//! Similarity transform records emitted per frame

use serde::{Deserialize, Serialize};
use std::fmt;

/// Translation, rotation and scale between two consecutive frames
///
/// `x`/`y` follow the matcher's convention: the content of the current
/// frame at `p` is found at `p + (x, y)` in the previous frame. `alpha` is
/// in radians and pivots about the frame center. `zoom` is always 1 here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub alpha: f64,
    pub zoom: f64,
    /// Diagnostic/reserved value carried into the stream
    pub extra: i32,
}

impl Transform {
    /// The identity transform
    pub fn identity() -> Self {
        Transform {
            x: 0.0,
            y: 0.0,
            alpha: 0.0,
            zoom: 1.0,
            extra: 0,
        }
    }

    /// A pure translation
    pub fn from_translation(x: f64, y: f64) -> Self {
        Transform {
            x,
            y,
            ..Transform::identity()
        }
    }

    /// Component-wise difference of translation and rotation
    pub fn sub(&self, other: &Transform) -> Transform {
        Transform {
            x: self.x - other.x,
            y: self.y - other.y,
            alpha: self.alpha - other.alpha,
            zoom: self.zoom,
            extra: self.extra,
        }
    }

    /// Whether this is the identity (no motion)
    pub fn is_identity(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.alpha == 0.0 && self.zoom == 1.0
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::identity()
    }
}

/// The text record body: `x y alpha zoom extra`
impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:6.4} {:6.4} {:8.5} {:6.4} {}",
            self.x, self.y, self.alpha, self.zoom, self.extra
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let t = Transform::identity();
        assert!(t.is_identity());
        assert_eq!(t.zoom, 1.0);
        assert_eq!(t.extra, 0);
    }

    #[test]
    fn test_sub_keeps_zoom() {
        let a = Transform::from_translation(3.0, -2.0);
        let b = Transform::from_translation(1.0, 1.0);
        let d = a.sub(&b);
        assert_eq!((d.x, d.y, d.zoom), (2.0, -3.0, 1.0));
    }

    #[test]
    fn test_display_record_layout() {
        let t = Transform {
            x: 1.5,
            y: -2.0,
            alpha: 0.01234,
            zoom: 1.0,
            extra: 0,
        };
        assert_eq!(t.to_string(), "1.5000 -2.0000  0.01234 1.0000 0");
    }
}
