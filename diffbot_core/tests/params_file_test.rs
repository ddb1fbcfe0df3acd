// Loading robot parameters from disk
use approx::assert_relative_eq;
use diffbot_core::error::DiffbotError;
use diffbot_core::params::{ColorRange, RobotParams};
use std::io::Write;

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[kinematics]
wheel_radius = 0.03
track_width = 0.15

[odometry]
frequency_hz = 50.0

[line_follower]
theta_gain = 100.0
colors = [
    {{ name = "green", low = [40, 60, 60], high = [80, 255, 255] }},
]
"#
    )
    .unwrap();

    let params = RobotParams::load(file.path()).unwrap();
    assert_relative_eq!(params.kinematics.wheel_radius, 0.03);
    assert_relative_eq!(params.kinematics.track_width, 0.15);
    assert_relative_eq!(params.odometry.frequency_hz, 50.0);
    assert_relative_eq!(params.line_follower.theta_gain, 100.0);
    assert_eq!(params.line_follower.colors.len(), 1);
    assert_eq!(params.line_follower.colors[0].label(), "green");
    // untouched sections keep their defaults
    assert_eq!(params.line_follower.marker, ColorRange::brown());
    assert_relative_eq!(params.navigator.distance_threshold, 0.05);
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = RobotParams::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, DiffbotError::Config(_)));
}

#[test]
fn test_invalid_values_are_rejected_on_load() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[drive]\nleft_id = 1\nright_id = 1\n").unwrap();
    let err = RobotParams::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("must differ"));
}

#[test]
fn test_unrepresentable_timings_are_rejected_on_load() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[odometry]\nfrequency_hz = 1e-30\n").unwrap();
    let err = RobotParams::load(file.path()).unwrap_err();
    assert!(matches!(err, DiffbotError::Config(_)));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[line_follower]\nmarker_cooldown_s = 1e20\n").unwrap();
    let err = RobotParams::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("marker_cooldown_s"));
}
