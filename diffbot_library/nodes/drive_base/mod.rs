use crate::algorithms::differential_drive::KinematicsModel;
use crate::hardware::DriveActuator;
use crate::messages::{MotionCommand, WheelVelocityPair};
use diffbot_core::error::DiffbotResult;
use diffbot_core::params::RobotParams;
use std::sync::Arc;

/// Turns controller commands into wheel speeds
///
/// `apply` maps a [`MotionCommand`] through inverse kinematics:
/// the speed fraction (clamped to [-1, 1]) scales `base_speed`, the turn rate
/// passes through unchanged.
pub struct DriveBase {
    actuator: Arc<dyn DriveActuator>,
    kinematics: KinematicsModel,
    base_speed: f64,
}

impl DriveBase {
    pub fn new(actuator: Arc<dyn DriveActuator>, params: &RobotParams) -> Self {
        Self::with_model(
            actuator,
            KinematicsModel::from_params(&params.kinematics),
            params.drive.base_speed,
        )
    }

    pub fn with_model(actuator: Arc<dyn DriveActuator>, kinematics: KinematicsModel, base_speed: f64) -> Self {
        Self {
            actuator,
            kinematics,
            base_speed,
        }
    }

    /// Wheel speeds a command maps to
    pub fn wheel_speeds_for(&self, command: &MotionCommand) -> WheelVelocityPair {
        self.kinematics
            .inverse(command.clamped_fraction() * self.base_speed, command.turn_rate)
    }

    pub fn apply(&self, command: &MotionCommand) -> DiffbotResult<()> {
        let wheels = self.wheel_speeds_for(command);
        tracing::trace!(
            speed_fraction = command.speed_fraction,
            turn_rate = command.turn_rate,
            left = wheels.left,
            right = wheels.right,
            "drive command"
        );
        self.actuator.set_wheel_speeds(wheels)
    }

    pub fn stop(&self) -> DiffbotResult<()> {
        self.actuator.stop()
    }

    /// Take motor authority for the duration of a control loop
    ///
    /// The wheels are stopped when the returned guard goes out of scope,
    /// whichever way the loop exits.
    pub fn acquire(&self) -> DriveAuthority<'_> {
        DriveAuthority { base: self }
    }

    pub fn actuator(&self) -> &Arc<dyn DriveActuator> {
        &self.actuator
    }

    pub fn base_speed(&self) -> f64 {
        self.base_speed
    }
}

/// Scoped motor authority; dropping it stops the wheels
pub struct DriveAuthority<'a> {
    base: &'a DriveBase,
}

impl DriveAuthority<'_> {
    pub fn apply(&self, command: &MotionCommand) -> DiffbotResult<()> {
        self.base.apply(command)
    }

    pub fn stop(&self) -> DiffbotResult<()> {
        self.base.stop()
    }
}

impl Drop for DriveAuthority<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.base.stop() {
            tracing::error!(error = %e, "failed to stop the wheels on release");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::SimulatedDrive;
    use approx::assert_relative_eq;

    fn setup() -> (Arc<SimulatedDrive>, DriveBase) {
        let sim = Arc::new(SimulatedDrive::new());
        let base = DriveBase::with_model(sim.clone(), KinematicsModel::new(0.025, 0.118), 0.4);
        (sim, base)
    }

    #[test]
    fn test_apply_uses_inverse_kinematics() {
        let (sim, base) = setup();
        base.apply(&MotionCommand::new(0.5, 0.0)).unwrap();
        let wheels = sim.last_command().unwrap();
        // 0.2 m/s on a 25 mm wheel
        assert_relative_eq!(wheels.left, (0.2f64 / 0.025).to_degrees(), epsilon = 1e-9);
        assert_relative_eq!(wheels.left, wheels.right);
    }

    #[test]
    fn test_fraction_is_clamped() {
        let (sim, base) = setup();
        base.apply(&MotionCommand::new(3.0, 0.0)).unwrap();
        let fast = sim.last_command().unwrap();
        base.apply(&MotionCommand::new(1.0, 0.0)).unwrap();
        assert_eq!(sim.last_command().unwrap(), fast);
    }

    #[test]
    fn test_authority_stops_on_drop() {
        let (sim, base) = setup();
        {
            let authority = base.acquire();
            authority.apply(&MotionCommand::new(1.0, 30.0)).unwrap();
            assert!(!sim.current_speeds().is_zero());
        }
        assert!(sim.current_speeds().is_zero());
    }

    #[test]
    fn test_authority_stops_on_error_path() {
        let (sim, base) = setup();
        let run = || -> DiffbotResult<()> {
            let authority = base.acquire();
            authority.apply(&MotionCommand::new(1.0, 0.0))?;
            sim.fail_next_writes(1);
            authority.apply(&MotionCommand::new(0.5, 0.0))?;
            Ok(())
        };
        assert!(run().is_err());
        assert!(sim.current_speeds().is_zero());
    }
}
