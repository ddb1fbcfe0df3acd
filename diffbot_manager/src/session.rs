//! Session lifecycle shared by every mode
//!
//! Opening a session connects the actuator and starts pose sampling;
//! [`Session::finish`] tears down in a fixed order: sampling stops, the
//! wheels get a final stop command, then the trajectory map is written.

use crate::cli::Mode;
use chrono::{DateTime, Local};
use diffbot_core::error::{DiffbotError, DiffbotResult};
use diffbot_core::params::RobotParams;
use diffbot_core::shutdown::CancelToken;
use diffbot_library::export;
use diffbot_library::hardware::{DriveActuator, SimulatedDrive};
use diffbot_library::{DriveBase, KinematicsModel, Pose, PoseEstimator, RunOutcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where the trajectory map goes, if anywhere
#[derive(Debug, Clone)]
pub struct MapOptions {
    pub enabled: bool,
    pub dir: PathBuf,
}

/// `<mode>_map_<YYYYmmdd_HHMMSS>.png`
pub fn map_file_name(mode: &Mode, at: DateTime<Local>) -> String {
    format!("{}_map_{}.png", mode.name(), at.format("%Y%m%d_%H%M%S"))
}

/// Process exit code for a finished run
///
/// Passive mode ends by operator stop, which is its normal completion.
pub fn exit_code(mode: &Mode, result: &DiffbotResult<RunOutcome>) -> i32 {
    match (result, mode) {
        (Ok(RunOutcome::Completed), _) => 0,
        (Ok(RunOutcome::Cancelled), Mode::Passive) => 0,
        (Ok(RunOutcome::Cancelled), _) => 1,
        (Err(_), _) => 1,
    }
}

pub struct Session {
    pub params: RobotParams,
    pub actuator: Arc<dyn DriveActuator>,
    pub estimator: PoseEstimator,
    pub cancel: CancelToken,
}

impl Session {
    /// Connect the actuator and start pose sampling
    pub fn open(params: RobotParams, simulate: bool, cancel: CancelToken) -> DiffbotResult<Self> {
        let actuator = connect(&params, simulate)?;
        tracing::info!(actuator = %actuator.describe(), "drive connected");

        let estimator = PoseEstimator::with_history_interval(
            KinematicsModel::from_params(&params.kinematics),
            params.odometry.history_interval(),
        );
        estimator.start_periodic_sampling(actuator.clone(), params.odometry.frequency_hz)?;

        Ok(Self {
            params,
            actuator,
            estimator,
            cancel,
        })
    }

    pub fn drive_base(&self) -> DriveBase {
        DriveBase::new(self.actuator.clone(), &self.params)
    }

    /// Stop sampling and the wheels, export the map, return the final pose
    pub fn finish(self, mode: &Mode, map: &MapOptions) -> Pose {
        self.estimator.stop_periodic_sampling();
        if let Err(e) = self.actuator.stop() {
            tracing::error!(error = %e, "final stop command failed");
        }

        let pose = self.estimator.get_position();
        if map.enabled {
            let path = map.dir.join(map_file_name(mode, Local::now()));
            if let Err(e) = save_map(&self.estimator, &path) {
                tracing::warn!(path = %path.display(), error = %e, "trajectory map not written");
            }
        }
        pose
    }
}

fn save_map(estimator: &PoseEstimator, path: &Path) -> DiffbotResult<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    export::save_trajectory_png(&estimator.history(), path)
}

fn connect(params: &RobotParams, simulate: bool) -> DiffbotResult<Arc<dyn DriveActuator>> {
    if simulate {
        return Ok(Arc::new(SimulatedDrive::new()));
    }
    connect_hardware(params)
}

#[cfg(feature = "serial-hardware")]
fn connect_hardware(params: &RobotParams) -> DiffbotResult<Arc<dyn DriveActuator>> {
    let drive = diffbot_library::hardware::DynamixelDrive::discover_and_connect(&params.drive)?;
    Ok(Arc::new(drive))
}

#[cfg(not(feature = "serial-hardware"))]
fn connect_hardware(_params: &RobotParams) -> DiffbotResult<Arc<dyn DriveActuator>> {
    Err(DiffbotError::InitializationFailed(
        "built without serial-hardware support, use --simulate".to_string(),
    ))
}

/// Reject a map directory that exists as a file before anything moves
pub fn check_map_dir(map: &MapOptions) -> DiffbotResult<()> {
    if map.enabled && map.dir.exists() && !map.dir.is_dir() {
        return Err(DiffbotError::InvalidInput(format!(
            "map directory {} is not a directory",
            map.dir.display()
        )));
    }
    Ok(())
}
