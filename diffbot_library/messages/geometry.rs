use crate::algorithms::angles::normalize_angle;
use serde::{Deserialize, Serialize};

/// Planar robot pose
///
/// `heading` is in degrees, counter-clockwise positive, and is kept in
/// (-180, 180] by every constructor and by the pose estimator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: f64,       // m
    pub y: f64,       // m
    pub heading: f64, // deg
}

impl Pose {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self {
            x,
            y,
            heading: normalize_angle(heading),
        }
    }

    pub fn origin() -> Self {
        Self::default()
    }

    /// Euclidean distance to another pose (m)
    pub fn distance_to(&self, other: &Pose) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl std::fmt::Display for Pose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "x={:.3} m, y={:.3} m, heading={:.1}°",
            self.x, self.y, self.heading
        )
    }
}

/// Goal of a go-to run; fixed for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavigationTarget {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl NavigationTarget {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self {
            x,
            y,
            heading: normalize_angle(heading),
        }
    }
}
