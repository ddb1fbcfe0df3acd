//! Robot parameters
//!
//! Every physical constant and controller gain lives here instead of in
//! module-level globals. The parameters are plain serde structs: a TOML file
//! may override any subset, everything else falls back to the values of the
//! reference robot (25 mm wheels, 118 mm track).

use crate::error::{DiffbotError, DiffbotResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Slowest accepted background sampling rate (Hz)
pub const MIN_SAMPLING_HZ: f64 = 1e-3;
/// Fastest accepted background sampling rate (Hz)
pub const MAX_SAMPLING_HZ: f64 = 10_000.0;
/// Longest accepted controller timing (s)
pub const MAX_DURATION_S: f64 = 86_400.0;

/// Seconds to a duration, clamped to `[0, MAX_DURATION_S]`; NaN maps to zero
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.clamp(0.0, MAX_DURATION_S)).unwrap_or_default()
}

/// Complete parameter set for one robot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RobotParams {
    pub kinematics: KinematicsParams,
    pub drive: DriveParams,
    pub odometry: OdometryParams,
    pub vision: VisionParams,
    pub line_follower: LineFollowerParams,
    pub navigator: NavigatorParams,
}

/// Wheel geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicsParams {
    /// Wheel radius (m)
    pub wheel_radius: f64,
    /// Distance between the two wheel contact points (m)
    pub track_width: f64,
}

impl Default for KinematicsParams {
    fn default() -> Self {
        Self {
            wheel_radius: 0.025,
            track_width: 0.118,
        }
    }
}

/// Actuator wiring and transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveParams {
    /// Linear speed (m/s) that a speed fraction of 1.0 maps to
    pub base_speed: f64,
    pub left_id: u8,
    pub right_id: u8,
    /// Mounting sign of the left motor (+1 or -1)
    pub left_sign: f64,
    /// Mounting sign of the right motor; the right servo is mirrored
    pub right_sign: f64,
    /// Explicit serial port; the first discovered port is used when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    pub baud_rate: u32,
    /// Speed register resolution in rpm per unit
    pub speed_unit_rpm: f64,
    pub read_timeout_ms: u64,
}

impl Default for DriveParams {
    fn default() -> Self {
        Self {
            base_speed: 0.4,
            left_id: 2,
            right_id: 1,
            left_sign: 1.0,
            right_sign: -1.0,
            port: None,
            baud_rate: 1_000_000,
            speed_unit_rpm: 0.111,
            read_timeout_ms: 50,
        }
    }
}

impl DriveParams {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Pose estimator settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OdometryParams {
    /// Background sampling rate (Hz)
    pub frequency_hz: f64,
    /// Minimum spacing between two recorded trajectory samples (ms)
    pub history_interval_ms: u64,
}

impl Default for OdometryParams {
    fn default() -> Self {
        Self {
            frequency_hz: 100.0,
            history_interval_ms: 50,
        }
    }
}

impl OdometryParams {
    pub fn history_interval(&self) -> Duration {
        Duration::from_millis(self.history_interval_ms)
    }
}

/// HSV window in OpenCV units (H in [0, 180], S and V in [0, 255])
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub low: [u8; 3],
    pub high: [u8; 3],
}

impl ColorRange {
    pub fn new(low: [u8; 3], high: [u8; 3]) -> Self {
        Self {
            name: None,
            low,
            high,
        }
    }

    pub fn named(name: &str, low: [u8; 3], high: [u8; 3]) -> Self {
        Self {
            name: Some(name.to_string()),
            low,
            high,
        }
    }

    /// Inclusive containment test on all three channels
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| hsv[i] >= self.low[i] && hsv[i] <= self.high[i])
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    pub fn yellow() -> Self {
        Self::named("yellow", [25, 50, 50], [85, 255, 255])
    }

    pub fn blue() -> Self {
        Self::named("blue", [100, 50, 50], [110, 255, 255])
    }

    pub fn red() -> Self {
        Self::named("red", [0, 50, 50], [20, 255, 255])
    }

    // TODO: retune on the track; this window also catches dark floor patches
    pub fn brown() -> Self {
        Self::named("brown", [0, 30, 0], [180, 150, 150])
    }
}

/// Camera and segmentation settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionParams {
    pub camera_id: u32,
    /// Number of bottom rows searched for the line
    pub roi_rows: u32,
    /// Smallest accepted line blob, as a fraction of the ROI
    pub min_line_area: f64,
}

impl Default for VisionParams {
    fn default() -> Self {
        Self {
            camera_id: 0,
            roi_rows: 20,
            min_line_area: 0.03,
        }
    }
}

/// Line follower gains, timings and colors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineFollowerParams {
    /// Turn rate (deg/s) per unit of normalized lateral offset
    pub theta_gain: f64,
    /// Minimum time between two accepted marker events (s)
    pub marker_cooldown_s: f64,
    /// Markers seen during this time after start are ignored (s)
    pub start_grace_s: f64,
    /// Length of the reduced-speed window after a marker (s)
    pub marker_slowdown_s: f64,
    /// Speed multiplier applied inside the slowdown window
    pub marker_slowdown_factor: f64,
    /// Consecutive frames without an image before the run is aborted
    pub max_missed_frames: u32,
    /// Extra sleep per tick (ms); 0 lets the camera frame rate pace the loop
    pub tick_interval_ms: u64,
    pub marker_roi_threshold: f64,
    pub marker_full_frame_threshold: f64,
    /// Ordered colors to follow
    pub colors: Vec<ColorRange>,
    /// Color of the waypoint markers between two line segments
    pub marker: ColorRange,
}

impl Default for LineFollowerParams {
    fn default() -> Self {
        Self {
            theta_gain: 140.0,
            marker_cooldown_s: 5.0,
            start_grace_s: 5.0,
            marker_slowdown_s: 1.0,
            marker_slowdown_factor: 0.5,
            max_missed_frames: 30,
            tick_interval_ms: 0,
            marker_roi_threshold: 0.5,
            marker_full_frame_threshold: 0.2,
            colors: vec![ColorRange::yellow(), ColorRange::blue(), ColorRange::red()],
            marker: ColorRange::brown(),
        }
    }
}

impl LineFollowerParams {
    pub fn marker_cooldown(&self) -> Duration {
        seconds(self.marker_cooldown_s)
    }

    pub fn start_grace(&self) -> Duration {
        seconds(self.start_grace_s)
    }

    pub fn marker_slowdown(&self) -> Duration {
        seconds(self.marker_slowdown_s)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Go-to controller gains and tolerances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorParams {
    /// Maximum turn rate (deg/s)
    pub base_turn_speed: f64,
    /// Position tolerance (m)
    pub distance_threshold: f64,
    /// Final heading tolerance (deg)
    pub angle_threshold: f64,
    /// Heading error (deg) at which forward speed drops to zero
    pub move_angle: f64,
    pub poll_interval_ms: u64,
}

impl Default for NavigatorParams {
    fn default() -> Self {
        Self {
            base_turn_speed: 120.0,
            distance_threshold: 0.05,
            angle_threshold: 5.0,
            move_angle: 90.0,
            poll_interval_ms: 50,
        }
    }
}

impl NavigatorParams {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl RobotParams {
    /// Load parameters from a TOML file and validate them
    pub fn load(path: impl AsRef<Path>) -> DiffbotResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            DiffbotError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let params = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded robot parameters");
        Ok(params)
    }

    pub fn from_toml_str(text: &str) -> DiffbotResult<Self> {
        let params: RobotParams = toml::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_toml_string(&self) -> DiffbotResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject parameter sets the controllers cannot run with
    pub fn validate(&self) -> DiffbotResult<()> {
        fn positive(name: &str, value: f64) -> DiffbotResult<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(DiffbotError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )))
            }
        }
        fn fraction(name: &str, value: f64) -> DiffbotResult<()> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(DiffbotError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )))
            }
        }

        positive("kinematics.wheel_radius", self.kinematics.wheel_radius)?;
        positive("kinematics.track_width", self.kinematics.track_width)?;
        positive("drive.base_speed", self.drive.base_speed)?;
        positive("drive.speed_unit_rpm", self.drive.speed_unit_rpm)?;
        for (name, sign) in [
            ("drive.left_sign", self.drive.left_sign),
            ("drive.right_sign", self.drive.right_sign),
        ] {
            if sign.abs() != 1.0 {
                return Err(DiffbotError::Config(format!(
                    "{} must be 1 or -1, got {}",
                    name, sign
                )));
            }
        }
        if self.drive.left_id == self.drive.right_id {
            return Err(DiffbotError::Config(
                "drive.left_id and drive.right_id must differ".to_string(),
            ));
        }
        let hz = self.odometry.frequency_hz;
        if !(MIN_SAMPLING_HZ..=MAX_SAMPLING_HZ).contains(&hz) {
            return Err(DiffbotError::Config(format!(
                "odometry.frequency_hz must be within [{}, {}], got {}",
                MIN_SAMPLING_HZ, MAX_SAMPLING_HZ, hz
            )));
        }
        if self.vision.roi_rows == 0 {
            return Err(DiffbotError::Config(
                "vision.roi_rows must be at least 1".to_string(),
            ));
        }
        fraction("vision.min_line_area", self.vision.min_line_area)?;

        let lf = &self.line_follower;
        if lf.colors.is_empty() {
            return Err(DiffbotError::Config(
                "line_follower.colors must name at least one color".to_string(),
            ));
        }
        for (name, secs) in [
            ("line_follower.marker_cooldown_s", lf.marker_cooldown_s),
            ("line_follower.start_grace_s", lf.start_grace_s),
            ("line_follower.marker_slowdown_s", lf.marker_slowdown_s),
        ] {
            if !(0.0..=MAX_DURATION_S).contains(&secs) {
                return Err(DiffbotError::Config(format!(
                    "{} must be within [0, {}] s, got {}",
                    name, MAX_DURATION_S, secs
                )));
            }
        }
        fraction("line_follower.marker_slowdown_factor", lf.marker_slowdown_factor)?;
        fraction("line_follower.marker_roi_threshold", lf.marker_roi_threshold)?;
        fraction(
            "line_follower.marker_full_frame_threshold",
            lf.marker_full_frame_threshold,
        )?;

        let nav = &self.navigator;
        positive("navigator.base_turn_speed", nav.base_turn_speed)?;
        positive("navigator.distance_threshold", nav.distance_threshold)?;
        positive("navigator.angle_threshold", nav.angle_threshold)?;
        positive("navigator.move_angle", nav.move_angle)?;
        Ok(())
    }
}
