//! Message types exchanged between diffbot components
//!
//! - Geometry: [`Pose`], [`NavigationTarget`]
//! - Kinematics: [`WheelVelocityPair`], [`BodyVelocity`]
//! - Control: [`MotionCommand`]
//! - Vision: [`ColorRange`], [`ColorSequence`], [`MarkerThresholds`], [`VisionReading`]
//! - Trajectory: [`TrajectorySample`]

pub mod control;
pub mod geometry;
pub mod kinematics;
pub mod trajectory;
pub mod vision;

pub use control::MotionCommand;
pub use geometry::{NavigationTarget, Pose};
pub use kinematics::{BodyVelocity, WheelVelocityPair};
pub use trajectory::TrajectorySample;
pub use vision::{ColorRange, ColorSequence, MarkerThresholds, VisionReading};
