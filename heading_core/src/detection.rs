use std::time::Instant;

use heading_traits::RawMarker;

/// A per-frame candidate, possibly malformed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerCandidate {
    pub id: Option<i64>,
    pub distance_m: Option<f64>,
}

impl MarkerCandidate {
    pub const fn new(id: i64, distance_m: f64) -> Self {
        Self {
            id: Some(id),
            distance_m: Some(distance_m),
        }
    }

    /// Distance is the Euclidean norm of the pose translation (column 3).
    pub fn from_raw(raw: &RawMarker) -> Self {
        let distance_m = raw.pose.and_then(|m| {
            let [x, y, z, _] = m[3];
            let d = (x * x + y * y + z * z).sqrt();
            d.is_finite().then_some(d)
        });
        Self {
            id: raw.id,
            distance_m,
        }
    }

    /// `(id, distance)` when both are present and the distance is usable.
    pub fn usable(&self) -> Option<(i64, f64)> {
        match (self.id, self.distance_m) {
            (Some(id), Some(d)) if d.is_finite() && d >= 0.0 => Some((id, d)),
            _ => None,
        }
    }
}

/// The one marker accepted for an approach cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquiredMarker {
    pub id: i64,
    pub distance_m: f64,
    pub observed_at: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(x: f64, y: f64, z: f64) -> [[f64; 4]; 4] {
        [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [x, y, z, 1.0],
        ]
    }

    #[test]
    fn distance_is_translation_norm() {
        let c = MarkerCandidate::from_raw(&RawMarker {
            id: Some(3),
            pose: Some(pose(0.3, 0.0, 0.4)),
        });
        assert_eq!(c.id, Some(3));
        assert!((c.distance_m.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn missing_pose_is_unusable() {
        let c = MarkerCandidate::from_raw(&RawMarker {
            id: Some(1),
            pose: None,
        });
        assert_eq!(c.usable(), None);
        assert_eq!(MarkerCandidate::new(2, -0.1).usable(), None);
        assert_eq!(MarkerCandidate::new(2, f64::NAN).usable(), None);
    }
}
