use serde::{Deserialize, Serialize};

/// Wheel angular speeds in degrees per second
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WheelVelocityPair {
    pub left: f64,
    pub right: f64,
}

impl WheelVelocityPair {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }
}

/// Body-frame velocity of the robot
///
/// `angular` follows the wheel-difference convention: positive when the left
/// wheel turns faster than the right one, i.e. a clockwise turn seen from
/// above. [`MotionCommand::turn_rate`](super::MotionCommand) uses the same
/// convention.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyVelocity {
    pub linear: f64,  // m/s
    pub angular: f64, // deg/s
}

impl BodyVelocity {
    pub fn new(linear: f64, angular: f64) -> Self {
        Self { linear, angular }
    }

    /// Counter-clockwise yaw rate (deg/s), the rate at which pose heading grows
    pub fn heading_rate(&self) -> f64 {
        -self.angular
    }
}
