//! Angle helpers
//!
//! All headings in diffbot are degrees in (-180, 180]. Differences between
//! two headings must go through [`wrap_angle_distance`]; raw subtraction is
//! wrong across the ±180° seam.

/// Reduce an angle (deg) to (-180, 180]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Signed shortest rotation (deg) that takes heading `from` to heading `to`
///
/// The result is in (-180, 180]; a half-turn resolves to +180.
///
/// ```rust
/// use diffbot_library::algorithms::angles::wrap_angle_distance;
/// assert_eq!(wrap_angle_distance(170.0, -170.0), 20.0);
/// assert_eq!(wrap_angle_distance(0.0, 180.0), 180.0);
/// ```
pub fn wrap_angle_distance(from: f64, to: f64) -> f64 {
    normalize_angle(to - from)
}

/// Direction (deg) of the vector (x, y), measured from +x
///
/// Computed as `sign(y) * acos(x / |v|)`; the zero vector has direction 0.
pub fn vec_angle(x: f64, y: f64) -> f64 {
    let length = vec_length(x, y);
    if length == 0.0 {
        return 0.0;
    }
    let angle = (x / length).clamp(-1.0, 1.0).acos().to_degrees();
    if y < 0.0 {
        -angle
    } else {
        angle
    }
}

pub fn vec_length(x: f64, y: f64) -> f64 {
    (x * x + y * y).sqrt()
}

/// -1, 0 or 1; unlike `f64::signum`, zero maps to 0
pub fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize_range() {
        assert_relative_eq!(normalize_angle(0.0), 0.0);
        assert_relative_eq!(normalize_angle(180.0), 180.0);
        assert_relative_eq!(normalize_angle(-180.0), 180.0);
        assert_relative_eq!(normalize_angle(181.0), -179.0);
        assert_relative_eq!(normalize_angle(-540.0), 180.0);
        assert_relative_eq!(normalize_angle(725.0), 5.0);
        for raw in [-1000.0, -359.5, -0.1, 12.0, 359.9, 1000.0] {
            let a = normalize_angle(raw);
            assert!(a > -180.0 && a <= 180.0, "{} -> {}", raw, a);
        }
    }

    #[test]
    fn test_wrap_distance_across_seam() {
        assert_relative_eq!(wrap_angle_distance(170.0, -170.0), 20.0);
        assert_relative_eq!(wrap_angle_distance(-170.0, 170.0), -20.0);
        assert_relative_eq!(wrap_angle_distance(10.0, 30.0), 20.0);
    }

    #[test]
    fn test_wrap_distance_half_turn_is_positive() {
        assert_eq!(wrap_angle_distance(0.0, 180.0), 180.0);
        assert_eq!(wrap_angle_distance(180.0, 0.0), 180.0);
        assert_eq!(wrap_angle_distance(90.0, -90.0), 180.0);
    }

    #[test]
    fn test_wrap_distance_identity() {
        for a in [-179.9, -90.0, 0.0, 45.5, 180.0] {
            assert_eq!(wrap_angle_distance(a, a), 0.0);
        }
    }

    #[test]
    fn test_vec_angle_quadrants() {
        assert_relative_eq!(vec_angle(1.0, 0.0), 0.0);
        assert_relative_eq!(vec_angle(0.0, 2.0), 90.0);
        assert_relative_eq!(vec_angle(-1.0, 0.0), 180.0);
        assert_relative_eq!(vec_angle(0.0, -3.0), -90.0);
        assert_relative_eq!(vec_angle(1.0, 1.0), 45.0, epsilon = 1e-9);
        assert_relative_eq!(vec_angle(-1.0, -1.0), -135.0, epsilon = 1e-9);
        assert_eq!(vec_angle(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_sign() {
        assert_eq!(sign(3.2), 1.0);
        assert_eq!(sign(-0.1), -1.0);
        assert_eq!(sign(0.0), 0.0);
    }
}
