//! # diffbot library
//!
//! Kinematics, odometry, controllers and device adapters for a two-wheeled
//! differential-drive robot.
//!
//! ## Structure
//!
//! ```text
//! diffbot_library/
//! ── messages/       # Plain data passed between components
//! ── algorithms/     # Pure math: angles, kinematics, odometry step, segmentation
//! ── hardware/       # Actuator interface, Dynamixel servos, simulated drive
//! ── vision/         # Frame sources and line/marker detection
//! ── nodes/          # Pose estimator, drive base, controllers
//! ── export/         # Trajectory PNG/JSON output
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use diffbot_library::prelude::*;
//! use std::sync::Arc;
//!
//! let params = RobotParams::default();
//! let actuator: Arc<dyn DriveActuator> = Arc::new(SimulatedDrive::new());
//!
//! let estimator = PoseEstimator::new(KinematicsModel::from_params(&params.kinematics));
//! estimator.start_periodic_sampling(actuator.clone(), params.odometry.frequency_hz)?;
//!
//! let drive = DriveBase::new(actuator, &params);
//! let mut navigator = Navigator::new(params.navigator);
//! navigator.set_target(1.0, 0.0, 90.0);
//! navigator.run_to_completion(&drive, &estimator, &CancelToken::new())?;
//! estimator.stop_periodic_sampling();
//! ```

pub mod algorithms;
pub mod export;
pub mod hardware;
pub mod messages;
pub mod nodes;
pub mod vision;

// Re-export message types at the crate root for convenience
pub use messages::*;

pub use algorithms::differential_drive::KinematicsModel;
pub use hardware::{DriveActuator, SimulatedDrive};
pub use nodes::{
    DriveAuthority, DriveBase, FollowStep, LineFollower, NavigationPhase, NavigationStep,
    Navigator, OperatorEvent, OperatorInput, PassiveMode, PoseEstimator, RunOutcome,
};
pub use vision::{ImageSequence, VisionSensor};

#[cfg(feature = "serial-hardware")]
pub use hardware::DynamixelDrive;

#[cfg(feature = "opencv-backend")]
pub use vision::OpenCvCamera;

/// Prelude module for convenient imports
pub mod prelude {
    pub use diffbot_core::{CancelToken, DiffbotError, DiffbotResult, RobotParams};

    pub use crate::messages::{
        BodyVelocity, ColorRange, ColorSequence, MarkerThresholds, MotionCommand,
        NavigationTarget, Pose, TrajectorySample, VisionReading, WheelVelocityPair,
    };

    pub use crate::algorithms::differential_drive::KinematicsModel;
    pub use crate::hardware::{DriveActuator, SimulatedDrive};
    pub use crate::nodes::{
        DriveBase, LineFollower, Navigator, PassiveMode, PoseEstimator, RunOutcome,
    };
    pub use crate::vision::{ImageSequence, VisionSensor};

    #[cfg(feature = "serial-hardware")]
    pub use crate::hardware::DynamixelDrive;
}
