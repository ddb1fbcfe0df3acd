//! Actuator adapters
//!
//! Controllers and the pose estimator only see [`DriveActuator`]. Two
//! adapters implement it:
//!
//! - [`DynamixelDrive`]: two Dynamixel servos in wheel mode (feature `serial-hardware`)
//! - [`SimulatedDrive`]: in-memory loopback used by `--simulate` and tests

#[cfg(feature = "serial-hardware")]
pub mod dynamixel;
pub mod sim;

#[cfg(feature = "serial-hardware")]
pub use dynamixel::DynamixelDrive;
pub use sim::SimulatedDrive;

use crate::messages::WheelVelocityPair;
use diffbot_core::error::DiffbotResult;

/// Capability interface of the wheel actuators
///
/// Speeds are wheel angular speeds in deg/s where positive drives the robot
/// forward; adapters apply any per-wheel mounting sign themselves. All
/// methods take `&self` so that the sampling thread and the active
/// controller can share one `Arc<dyn DriveActuator>`; implementations
/// serialize access to the underlying device.
pub trait DriveActuator: Send + Sync {
    /// Command both wheels
    fn set_wheel_speeds(&self, speeds: WheelVelocityPair) -> DiffbotResult<()>;

    /// Read the present wheel speeds
    fn wheel_speeds(&self) -> DiffbotResult<WheelVelocityPair>;

    /// Stop both wheels
    fn stop(&self) -> DiffbotResult<()> {
        self.set_wheel_speeds(WheelVelocityPair::zero())
    }

    /// Release holding torque so the robot can be pushed by hand
    fn enable_passive_mode(&self) -> DiffbotResult<()>;

    /// Restore holding torque
    fn disable_passive_mode(&self) -> DiffbotResult<()>;

    /// Short description for logs
    fn describe(&self) -> String {
        "drive".to_string()
    }
}
