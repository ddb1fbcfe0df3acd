use serde::{Deserialize, Serialize};

/// Output of a controller for one tick
///
/// `speed_fraction` scales the configured base speed and is clamped to
/// [-1, 1] when applied; `turn_rate` is in degrees per second with the
/// wheel-difference sign convention (positive turns clockwise).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionCommand {
    pub speed_fraction: f64,
    pub turn_rate: f64,
}

impl MotionCommand {
    pub fn new(speed_fraction: f64, turn_rate: f64) -> Self {
        Self {
            speed_fraction,
            turn_rate,
        }
    }

    /// Hold position
    pub fn zero() -> Self {
        Self::default()
    }

    /// Rotate in place
    pub fn rotate(turn_rate: f64) -> Self {
        Self::new(0.0, turn_rate)
    }

    pub fn is_zero(&self) -> bool {
        self.speed_fraction == 0.0 && self.turn_rate == 0.0
    }

    /// Speed fraction limited to [-1, 1]
    pub fn clamped_fraction(&self) -> f64 {
        self.speed_fraction.clamp(-1.0, 1.0)
    }
}
