//! Simulated drive
//!
//! Reports back the last commanded wheel speeds, as if the servos tracked
//! their setpoints perfectly. Torque-off keeps the reported speeds wherever
//! a test pushes them with [`SimulatedDrive::push`], which is how manual
//! pushes are modelled in passive mode.

use super::DriveActuator;
use crate::messages::WheelVelocityPair;
use diffbot_core::error::{DiffbotError, DiffbotResult};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct SimState {
    speeds: WheelVelocityPair,
    torque_enabled: bool,
    pending_read_failures: u32,
    pending_write_failures: u32,
    commands: Vec<WheelVelocityPair>,
    reads: u64,
}

/// In-memory [`DriveActuator`]
#[derive(Debug)]
pub struct SimulatedDrive {
    state: Mutex<SimState>,
}

impl SimulatedDrive {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                torque_enabled: true,
                ..SimState::default()
            }),
        }
    }

    /// Make the next `count` telemetry reads fail with a transient error
    pub fn fail_next_reads(&self, count: u32) {
        self.state.lock().pending_read_failures = count;
    }

    /// Make the next `count` speed commands fail
    pub fn fail_next_writes(&self, count: u32) {
        self.state.lock().pending_write_failures = count;
    }

    /// Move the wheels from outside, bypassing the command path
    pub fn push(&self, speeds: WheelVelocityPair) {
        self.state.lock().speeds = speeds;
    }

    /// Every command accepted so far, oldest first
    pub fn commands(&self) -> Vec<WheelVelocityPair> {
        self.state.lock().commands.clone()
    }

    pub fn last_command(&self) -> Option<WheelVelocityPair> {
        self.state.lock().commands.last().copied()
    }

    pub fn current_speeds(&self) -> WheelVelocityPair {
        self.state.lock().speeds
    }

    pub fn torque_enabled(&self) -> bool {
        self.state.lock().torque_enabled
    }

    pub fn read_count(&self) -> u64 {
        self.state.lock().reads
    }
}

impl Default for SimulatedDrive {
    fn default() -> Self {
        Self::new()
    }
}

impl DriveActuator for SimulatedDrive {
    fn set_wheel_speeds(&self, speeds: WheelVelocityPair) -> DiffbotResult<()> {
        let mut state = self.state.lock();
        if state.pending_write_failures > 0 {
            state.pending_write_failures -= 1;
            return Err(DiffbotError::Driver("simulated write failure".to_string()));
        }
        state.commands.push(speeds);
        state.speeds = speeds;
        Ok(())
    }

    fn wheel_speeds(&self) -> DiffbotResult<WheelVelocityPair> {
        let mut state = self.state.lock();
        state.reads += 1;
        if state.pending_read_failures > 0 {
            state.pending_read_failures -= 1;
            return Err(DiffbotError::Driver("simulated read failure".to_string()));
        }
        Ok(state.speeds)
    }

    fn enable_passive_mode(&self) -> DiffbotResult<()> {
        self.state.lock().torque_enabled = false;
        tracing::info!("simulated drive: torque disabled");
        Ok(())
    }

    fn disable_passive_mode(&self) -> DiffbotResult<()> {
        self.state.lock().torque_enabled = true;
        tracing::info!("simulated drive: torque enabled");
        Ok(())
    }

    fn describe(&self) -> String {
        "simulated drive".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback() {
        let drive = SimulatedDrive::new();
        drive.set_wheel_speeds(WheelVelocityPair::new(90.0, -45.0)).unwrap();
        assert_eq!(drive.wheel_speeds().unwrap(), WheelVelocityPair::new(90.0, -45.0));

        drive.stop().unwrap();
        assert!(drive.wheel_speeds().unwrap().is_zero());
        assert_eq!(drive.commands().len(), 2);
    }

    #[test]
    fn test_injected_read_failures() {
        let drive = SimulatedDrive::new();
        drive.fail_next_reads(2);
        assert!(drive.wheel_speeds().unwrap_err().is_transient());
        assert!(drive.wheel_speeds().is_err());
        assert!(drive.wheel_speeds().is_ok());
        assert_eq!(drive.read_count(), 3);
    }

    #[test]
    fn test_failed_write_is_not_recorded() {
        let drive = SimulatedDrive::new();
        drive.fail_next_writes(1);
        assert!(drive.set_wheel_speeds(WheelVelocityPair::new(1.0, 1.0)).is_err());
        assert!(drive.commands().is_empty());
        assert!(drive.stop().is_ok());
    }

    #[test]
    fn test_passive_mode_toggles_torque() {
        let drive = SimulatedDrive::new();
        assert!(drive.torque_enabled());
        drive.enable_passive_mode().unwrap();
        assert!(!drive.torque_enabled());
        drive.push(WheelVelocityPair::new(30.0, 30.0));
        assert_eq!(drive.wheel_speeds().unwrap().left, 30.0);
        drive.disable_passive_mode().unwrap();
        assert!(drive.torque_enabled());
    }
}
