//! diffbot nodes
//!
//! Stateful components built on the algorithms and hardware modules.
//!
//! ## Estimation
//! - `PoseEstimator` - wheel odometry with an optional background sampler
//!
//! ## Actuation
//! - `DriveBase` - motion commands to wheel speeds, scoped motor authority
//!
//! ## Control goals (exactly one runs at a time)
//! - `LineFollower` - color-sequence line following
//! - `Navigator` - go to a position, then turn to a heading
//! - `PassiveMode` - torque off, pose tracking while pushed by hand
//!
//! ## Input
//! - `OperatorInput` - stdin commands over a channel
//!
//! Every control loop polls a [`CancelToken`](diffbot_core::CancelToken) once
//! per tick and holds a [`DriveAuthority`] (or restores torque) so the wheels
//! are stopped however the loop ends.

pub mod drive_base;
pub mod line_follower;
pub mod navigator;
pub mod operator_input;
pub mod passive_mode;
pub mod pose_estimator;

pub use drive_base::{DriveAuthority, DriveBase};
pub use line_follower::{FollowStep, LineFollower};
pub use navigator::{NavigationPhase, NavigationStep, Navigator};
pub use operator_input::{OperatorEvent, OperatorInput};
pub use passive_mode::PassiveMode;
pub use pose_estimator::PoseEstimator;

/// How a control loop ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The goal was reached
    Completed,
    /// The cancel token tripped first
    Cancelled,
}
