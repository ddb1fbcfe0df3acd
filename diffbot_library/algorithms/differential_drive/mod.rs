//! Differential Drive Kinematics
//!
//! Forward and inverse kinematics for a two-wheeled differential-drive robot
//! whose wheel telemetry and commands are expressed in degrees per second.
//!
//! # Conventions
//!
//! - Wheel speeds: deg/s, positive drives the robot forward
//! - Linear velocity: m/s
//! - Angular velocity: deg/s, positive when the left wheel is faster
//!   (clockwise seen from above)
//!
//! # Example
//!
//! ```rust
//! use diffbot_library::algorithms::differential_drive::KinematicsModel;
//!
//! let model = KinematicsModel::new(0.025, 0.118); // wheel_radius, track_width
//!
//! // Convert a body velocity to wheel speeds
//! let wheels = model.inverse(0.2, 30.0); // linear, angular
//!
//! // And back
//! let body = model.direct(wheels.left, wheels.right);
//! assert!((body.linear - 0.2).abs() < 1e-9);
//! ```

use crate::messages::{BodyVelocity, WheelVelocityPair};
use diffbot_core::params::KinematicsParams;

/// Differential drive kinematics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicsModel {
    wheel_radius: f64, // Wheel radius (m)
    track_width: f64,  // Distance between left and right wheels (m)
}

impl KinematicsModel {
    /// Create new differential drive kinematics
    ///
    /// # Arguments
    /// * `wheel_radius` - Radius of wheels (meters)
    /// * `track_width` - Distance between left and right wheels (meters)
    pub fn new(wheel_radius: f64, track_width: f64) -> Self {
        Self {
            wheel_radius,
            track_width,
        }
    }

    pub fn from_params(params: &KinematicsParams) -> Self {
        Self::new(params.wheel_radius, params.track_width)
    }

    /// Direct kinematics: wheel speeds (deg/s) to body velocity
    ///
    /// `linear = r * (wl + wr) / 2` with the wheel speeds taken in rad/s;
    /// `angular = (r / track) * (wl - wr)`, which stays in deg/s.
    pub fn direct(&self, left: f64, right: f64) -> BodyVelocity {
        let linear = self.wheel_radius * (left + right) / 2.0 * (std::f64::consts::PI / 180.0);
        let angular = (self.wheel_radius / self.track_width) * (left - right);
        BodyVelocity::new(linear, angular)
    }

    /// Inverse kinematics: body velocity to wheel speeds (deg/s)
    ///
    /// # Arguments
    /// * `linear` - Linear velocity (m/s)
    /// * `angular` - Angular velocity (deg/s), wheel-difference convention
    pub fn inverse(&self, linear: f64, angular: f64) -> WheelVelocityPair {
        let translation = linear.to_degrees();
        let rotation = angular * self.track_width / 2.0;
        WheelVelocityPair::new(
            (translation + rotation) / self.wheel_radius,
            (translation - rotation) / self.wheel_radius,
        )
    }

    /// Convert a wheel speed (deg/s) to rim speed (m/s)
    pub fn wheel_angular_to_linear(&self, angular_speed: f64) -> f64 {
        angular_speed.to_radians() * self.wheel_radius
    }

    /// Convert rim speed (m/s) to wheel speed (deg/s)
    pub fn wheel_linear_to_angular(&self, linear_speed: f64) -> f64 {
        (linear_speed / self.wheel_radius).to_degrees()
    }

    pub fn wheel_radius(&self) -> f64 {
        self.wheel_radius
    }

    pub fn track_width(&self) -> f64 {
        self.track_width
    }
}

impl Default for KinematicsModel {
    fn default() -> Self {
        Self::from_params(&KinematicsParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn model() -> KinematicsModel {
        KinematicsModel::new(0.025, 0.118)
    }

    #[test]
    fn test_forward_motion() {
        // Both wheels same speed = straight line
        let body = model().direct(360.0, 360.0);

        assert_relative_eq!(body.linear, 0.05 * std::f64::consts::PI, epsilon = 1e-12);
        assert_eq!(body.angular, 0.0);
    }

    #[test]
    fn test_rotation_in_place() {
        // Opposite wheel speeds = rotation
        let body = model().direct(100.0, -100.0);

        assert_eq!(body.linear, 0.0);
        assert!(body.angular > 0.0);
        assert!(body.heading_rate() < 0.0);
    }

    #[test]
    fn test_arc_motion() {
        let body = model().direct(200.0, 100.0);

        assert!(body.linear > 0.0);
        assert!(body.angular > 0.0);
    }

    #[test]
    fn test_inverse_kinematics() {
        let m = model();

        // Forward motion
        let wheels = m.inverse(0.1, 0.0);
        assert_relative_eq!(wheels.left, wheels.right);
        assert!(wheels.left > 0.0);

        // Positive angular speeds up the left wheel
        let wheels = m.inverse(0.0, 45.0);
        assert!(wheels.left > 0.0);
        assert!(wheels.right < 0.0);
        assert_relative_eq!(wheels.left, -wheels.right);
    }

    #[test]
    fn test_roundtrip() {
        let m = model();
        for &(linear, angular) in &[
            (0.0, 0.0),
            (0.2, 0.0),
            (0.0, 120.0),
            (0.37, -88.5),
            (-0.15, 33.3),
            (1.5, 720.0),
        ] {
            let wheels = m.inverse(linear, angular);
            let body = m.direct(wheels.left, wheels.right);
            assert_abs_diff_eq!(body.linear, linear, epsilon = 1e-9);
            assert_abs_diff_eq!(body.angular, angular, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_wheel_conversions() {
        let m = model();

        let angular = 360.0; // deg/s
        let linear = m.wheel_angular_to_linear(angular);
        assert_relative_eq!(linear, 2.0 * std::f64::consts::PI * 0.025, epsilon = 1e-12);
        assert_relative_eq!(m.wheel_linear_to_angular(linear), angular, epsilon = 1e-9);
    }

    #[test]
    fn test_from_params() {
        let m = KinematicsModel::from_params(&KinematicsParams {
            wheel_radius: 0.05,
            track_width: 0.3,
        });
        assert_eq!(m.wheel_radius(), 0.05);
        assert_eq!(m.track_width(), 0.3);
    }
}
