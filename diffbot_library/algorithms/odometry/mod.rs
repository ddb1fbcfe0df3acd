//! Dead-reckoning integration step
//!
//! One sample of (linear speed, yaw rate, Δt) advances the pose along a
//! short arc. The displacement is taken along the mid-point heading of the
//! interval, evaluated as the post-update heading minus half the heading
//! change; using the pre-update heading instead biases the estimate on
//! every curve.

use crate::algorithms::angles::normalize_angle;
use crate::messages::Pose;

/// Advance `pose` by one odometry sample
///
/// # Arguments
/// * `linear` - forward speed (m/s)
/// * `heading_rate` - counter-clockwise yaw rate (deg/s)
/// * `dt` - sample duration (s)
pub fn integrate(pose: Pose, linear: f64, heading_rate: f64, dt: f64) -> Pose {
    let dheading = heading_rate * dt;
    let heading = pose.heading + dheading;
    let mid = (heading - dheading / 2.0).to_radians();

    let distance = linear * dt;
    Pose {
        x: pose.x + distance * mid.cos(),
        y: pose.y + distance * mid.sin(),
        heading: normalize_angle(heading),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_zero_input_is_idempotent() {
        let start = Pose::new(1.5, -2.0, 135.0);
        for dt in [0.0, 0.01, 1.0, 60.0] {
            assert_eq!(integrate(start, 0.0, 0.0, dt), start);
        }
    }

    #[test]
    fn test_pure_rotation() {
        let start = Pose::new(0.3, 0.4, 170.0);
        let end = integrate(start, 0.0, 30.0, 1.0);
        assert_eq!(end.x, start.x);
        assert_eq!(end.y, start.y);
        assert_abs_diff_eq!(end.heading, -160.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pure_translation_at_heading_zero() {
        let end = integrate(Pose::origin(), 0.2, 0.0, 0.5);
        assert_abs_diff_eq!(end.x, 0.1, epsilon = 1e-12);
        assert_eq!(end.y, 0.0);
        assert_eq!(end.heading, 0.0);
    }

    #[test]
    fn test_translation_follows_heading() {
        let end = integrate(Pose::new(0.0, 0.0, 90.0), 1.0, 0.0, 1.0);
        assert_abs_diff_eq!(end.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(end.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_arc_uses_mid_heading() {
        // Quarter turn in one step: the chord leaves at 45 degrees
        let end = integrate(Pose::origin(), 1.0, 90.0, 1.0);
        let expected = std::f64::consts::FRAC_1_SQRT_2;
        assert_abs_diff_eq!(end.x, expected, epsilon = 1e-12);
        assert_abs_diff_eq!(end.y, expected, epsilon = 1e-12);
        assert_abs_diff_eq!(end.heading, 90.0, epsilon = 1e-12);
    }

    #[test]
    fn test_full_circle_closes() {
        // 360 steps of 1 degree each trace a closed polygon
        let mut pose = Pose::origin();
        for _ in 0..360 {
            pose = integrate(pose, 0.1, 36.0, 1.0 / 36.0);
        }
        assert_abs_diff_eq!(pose.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pose.y, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pose.heading.abs() % 360.0, 0.0, epsilon = 1e-6);
    }
}
