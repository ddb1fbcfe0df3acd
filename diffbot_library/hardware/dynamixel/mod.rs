//! Dynamixel wheel drive
//!
//! Two protocol 1.0 servos (AX/MX series) in wheel mode on one half-duplex
//! serial bus. The right servo is mounted mirrored, so its commands and
//! readings are multiplied by `right_sign` (-1 on the reference robot).
//!
//! # Example
//! ```rust,ignore
//! use diffbot_core::RobotParams;
//! use diffbot_library::hardware::{DriveActuator, DynamixelDrive};
//! use diffbot_library::messages::WheelVelocityPair;
//!
//! let params = RobotParams::default();
//! let drive = DynamixelDrive::discover_and_connect(&params.drive)?;
//! drive.set_wheel_speeds(WheelVelocityPair::new(180.0, 180.0))?;
//! ```

pub mod protocol;

use self::protocol::{register, DynamixelError, StatusPacket};
use super::DriveActuator;
use crate::messages::WheelVelocityPair;
use diffbot_core::error::{DiffbotError, DiffbotResult};
use diffbot_core::params::DriveParams;
use parking_lot::Mutex;
use serialport::{ClearBuffer, SerialPort};
use std::io::Write;

impl From<DynamixelError> for DiffbotError {
    fn from(err: DynamixelError) -> Self {
        DiffbotError::Protocol(err.to_string())
    }
}

fn serial_error(context: &str, err: serialport::Error) -> DiffbotError {
    DiffbotError::Driver(format!("{}: {}", context, err))
}

fn io_error(context: &str, err: std::io::Error) -> DiffbotError {
    match err.kind() {
        std::io::ErrorKind::TimedOut => DiffbotError::Timeout(format!("{}: {}", context, err)),
        _ => DiffbotError::Driver(format!("{}: {}", context, err)),
    }
}

/// Dynamixel-backed [`DriveActuator`]
pub struct DynamixelDrive {
    port: Mutex<Box<dyn SerialPort>>,
    port_name: String,
    params: DriveParams,
}

impl DynamixelDrive {
    /// Open the configured port, or the first serial port found, and put
    /// both servos in wheel mode with torque enabled
    pub fn discover_and_connect(params: &DriveParams) -> DiffbotResult<Self> {
        let port_name = match &params.port {
            Some(name) => name.clone(),
            None => {
                let ports = serialport::available_ports()
                    .map_err(|e| serial_error("cannot enumerate serial ports", e))?;
                match ports.into_iter().next() {
                    Some(info) => info.port_name,
                    None => return Err(DiffbotError::NotFound("no device found".to_string())),
                }
            }
        };

        tracing::info!(port = %port_name, baud = params.baud_rate, "opening Dynamixel bus");
        let port = serialport::new(&port_name, params.baud_rate)
            .timeout(params.read_timeout())
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => {
                    DiffbotError::NotFound(format!("no device found at {}", port_name))
                }
                _ => DiffbotError::InitializationFailed(format!(
                    "cannot open {}: {}",
                    port_name, e
                )),
            })?;

        let drive = Self {
            port: Mutex::new(port),
            port_name,
            params: params.clone(),
        };
        drive.set_wheel_mode()?;
        drive.set_torque(true)?;
        Ok(drive)
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    fn ids(&self) -> [u8; 2] {
        [self.params.left_id, self.params.right_id]
    }

    /// Zero angle limits switch the servos to endless rotation
    fn set_wheel_mode(&self) -> DiffbotResult<()> {
        for id in self.ids() {
            let packet = protocol::write_data(id, register::CW_ANGLE_LIMIT, &[0, 0, 0, 0])?;
            self.transact(id, &packet)?;
            tracing::debug!(id, "servo in wheel mode");
        }
        Ok(())
    }

    fn set_torque(&self, enabled: bool) -> DiffbotResult<()> {
        for id in self.ids() {
            let packet = protocol::write_data(id, register::TORQUE_ENABLE, &[enabled as u8])?;
            self.transact(id, &packet)?;
        }
        Ok(())
    }

    fn send(&self, port: &mut Box<dyn SerialPort>, packet: &[u8]) -> DiffbotResult<()> {
        port.clear(ClearBuffer::Input)
            .map_err(|e| serial_error("cannot clear input buffer", e))?;
        port.write_all(packet).map_err(|e| io_error("write failed", e))?;
        port.flush().map_err(|e| io_error("flush failed", e))
    }

    /// Send one instruction and wait for the servo's status reply
    fn transact(&self, id: u8, packet: &[u8]) -> DiffbotResult<StatusPacket> {
        let mut port = self.port.lock();
        self.send(&mut port, packet)?;
        let status = protocol::read_status(&mut *port)
            .map_err(|e| io_error(&format!("no status from servo {}", id), e))??;
        Ok(status.check(id)?)
    }

    fn read_speed(&self, id: u8) -> DiffbotResult<f64> {
        let packet = protocol::read_data(id, register::PRESENT_SPEED, 2)?;
        let value = self.transact(id, &packet)?.word()?;
        Ok(protocol::register_to_speed(value, self.params.speed_unit_rpm))
    }
}

impl DriveActuator for DynamixelDrive {
    fn set_wheel_speeds(&self, speeds: WheelVelocityPair) -> DiffbotResult<()> {
        let unit = self.params.speed_unit_rpm;
        let left = protocol::speed_to_register(speeds.left * self.params.left_sign, unit).to_le_bytes();
        let right =
            protocol::speed_to_register(speeds.right * self.params.right_sign, unit).to_le_bytes();

        let packet = protocol::sync_write(
            register::MOVING_SPEED,
            &[(self.params.left_id, &left[..]), (self.params.right_id, &right[..])],
        )?;
        // Broadcast writes get no status reply
        let mut port = self.port.lock();
        self.send(&mut port, &packet)
    }

    fn wheel_speeds(&self) -> DiffbotResult<WheelVelocityPair> {
        let left = self.read_speed(self.params.left_id)? * self.params.left_sign;
        let right = self.read_speed(self.params.right_id)? * self.params.right_sign;
        Ok(WheelVelocityPair::new(left, right))
    }

    fn enable_passive_mode(&self) -> DiffbotResult<()> {
        self.set_torque(false)?;
        tracing::info!("servos in passive mode (torque disabled)");
        Ok(())
    }

    fn disable_passive_mode(&self) -> DiffbotResult<()> {
        self.set_torque(true)?;
        tracing::info!("servos in active mode (torque enabled)");
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "Dynamixel bus {} (left id {}, right id {})",
            self.port_name, self.params.left_id, self.params.right_id
        )
    }
}
