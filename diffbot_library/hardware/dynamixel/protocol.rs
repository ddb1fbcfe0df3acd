//! Dynamixel protocol 1.0 packet codec
//!
//! Instruction packet: `FF FF id len instr params.. checksum`
//! Status packet:      `FF FF id len error params.. checksum`
//!
//! `len` counts the instruction (or error) byte, the parameters and the
//! checksum. The checksum is the inverted low byte of the sum of every byte
//! after the two-byte header.

use std::io::Read;
use thiserror::Error;

pub const HEADER: [u8; 2] = [0xFF, 0xFF];
pub const BROADCAST_ID: u8 = 0xFE;

/// Control table addresses (AX/MX series, protocol 1.0)
pub mod register {
    pub const CW_ANGLE_LIMIT: u8 = 0x06;
    pub const CCW_ANGLE_LIMIT: u8 = 0x08;
    pub const TORQUE_ENABLE: u8 = 0x18;
    pub const MOVING_SPEED: u8 = 0x20;
    pub const PRESENT_SPEED: u8 = 0x26;
}

/// Instruction codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Instruction {
    Ping = 0x01,
    ReadData = 0x02,
    WriteData = 0x03,
    SyncWrite = 0x83,
}

/// Codec and servo-reported errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DynamixelError {
    #[error("bad packet header {0:02X?}")]
    BadHeader([u8; 2]),

    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    Checksum { expected: u8, actual: u8 },

    #[error("invalid length byte {0}")]
    BadLength(u8),

    #[error("status from servo {actual}, expected {expected}")]
    UnexpectedId { expected: u8, actual: u8 },

    #[error("servo {id} reported error flags {flags:#010b}")]
    Servo { id: u8, flags: u8 },

    #[error("expected {expected} parameter bytes, got {actual}")]
    ShortReply { expected: usize, actual: usize },

    #[error("packet too long: {0} parameter bytes")]
    TooLong(usize),
}

/// Names of the set bits of a status error byte
pub fn describe_error_flags(flags: u8) -> String {
    const NAMES: [&str; 7] = [
        "input voltage",
        "angle limit",
        "overheating",
        "range",
        "checksum",
        "overload",
        "instruction",
    ];
    let names: Vec<&str> = NAMES
        .iter()
        .enumerate()
        .filter(|(bit, _)| flags & (1 << bit) != 0)
        .map(|(_, name)| *name)
        .collect();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

/// Checksum over the bytes following the header (id, len, instr/error, params)
pub fn checksum(body: &[u8]) -> u8 {
    let sum: u32 = body.iter().map(|&b| b as u32).sum();
    (!sum & 0xFF) as u8
}

/// Build an instruction packet
pub fn encode_instruction(
    id: u8,
    instruction: Instruction,
    params: &[u8],
) -> Result<Vec<u8>, DynamixelError> {
    // len is a single byte holding params + instruction + checksum
    if params.len() > 253 {
        return Err(DynamixelError::TooLong(params.len()));
    }
    let mut packet = Vec::with_capacity(params.len() + 6);
    packet.extend_from_slice(&HEADER);
    packet.push(id);
    packet.push((params.len() + 2) as u8);
    packet.push(instruction as u8);
    packet.extend_from_slice(params);
    let sum = checksum(&packet[2..]);
    packet.push(sum);
    Ok(packet)
}

pub fn write_data(id: u8, address: u8, data: &[u8]) -> Result<Vec<u8>, DynamixelError> {
    let mut params = Vec::with_capacity(data.len() + 1);
    params.push(address);
    params.extend_from_slice(data);
    encode_instruction(id, Instruction::WriteData, &params)
}

pub fn read_data(id: u8, address: u8, length: u8) -> Result<Vec<u8>, DynamixelError> {
    encode_instruction(id, Instruction::ReadData, &[address, length])
}

/// Write the same register range on several servos in one broadcast packet
///
/// Servos do not answer a sync write.
pub fn sync_write(address: u8, entries: &[(u8, &[u8])]) -> Result<Vec<u8>, DynamixelError> {
    let data_len = entries.first().map_or(0, |(_, data)| data.len());
    let mut params = vec![address, data_len as u8];
    for (id, data) in entries {
        if data.len() != data_len {
            return Err(DynamixelError::BadLength(data.len() as u8));
        }
        params.push(*id);
        params.extend_from_slice(data);
    }
    encode_instruction(BROADCAST_ID, Instruction::SyncWrite, &params)
}

/// Decoded status packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPacket {
    pub id: u8,
    pub error: u8,
    pub params: Vec<u8>,
}

impl StatusPacket {
    /// Fail on a non-zero error byte or a reply from the wrong servo
    pub fn check(self, expected_id: u8) -> Result<Self, DynamixelError> {
        if self.id != expected_id {
            return Err(DynamixelError::UnexpectedId {
                expected: expected_id,
                actual: self.id,
            });
        }
        if self.error != 0 {
            return Err(DynamixelError::Servo {
                id: self.id,
                flags: self.error,
            });
        }
        Ok(self)
    }

    /// Little-endian 16-bit value from the first two parameter bytes
    pub fn word(&self) -> Result<u16, DynamixelError> {
        match self.params.as_slice() {
            [lo, hi, ..] => Ok(u16::from_le_bytes([*lo, *hi])),
            other => Err(DynamixelError::ShortReply {
                expected: 2,
                actual: other.len(),
            }),
        }
    }
}

/// Parse a complete status packet from a byte slice
pub fn decode_status(bytes: &[u8]) -> Result<StatusPacket, DynamixelError> {
    if bytes.len() < 6 {
        return Err(DynamixelError::ShortReply {
            expected: 6,
            actual: bytes.len(),
        });
    }
    if bytes[..2] != HEADER {
        return Err(DynamixelError::BadHeader([bytes[0], bytes[1]]));
    }
    let len = bytes[3];
    if len < 2 || bytes.len() != len as usize + 4 {
        return Err(DynamixelError::BadLength(len));
    }

    let (body, tail) = bytes[2..].split_at(bytes.len() - 3);
    let expected = checksum(body);
    let actual = tail[0];
    if expected != actual {
        return Err(DynamixelError::Checksum { expected, actual });
    }

    Ok(StatusPacket {
        id: bytes[2],
        error: bytes[4],
        params: bytes[5..bytes.len() - 1].to_vec(),
    })
}

/// Read one status packet from a byte stream
///
/// I/O errors (including read timeouts) are returned as-is so the caller
/// can classify them; malformed packets become [`DynamixelError`]s.
pub fn read_status<R: Read>(reader: &mut R) -> std::io::Result<Result<StatusPacket, DynamixelError>> {
    let mut head = [0u8; 4];
    reader.read_exact(&mut head)?;
    if head[..2] != HEADER {
        return Ok(Err(DynamixelError::BadHeader([head[0], head[1]])));
    }
    let len = head[3];
    if len < 2 {
        return Ok(Err(DynamixelError::BadLength(len)));
    }

    let mut packet = head.to_vec();
    packet.resize(4 + len as usize, 0);
    reader.read_exact(&mut packet[4..])?;
    Ok(decode_status(&packet))
}

/// Encode a wheel speed (deg/s) as a moving-speed register value
///
/// Magnitude in units of `unit_rpm`, saturated at 1023; bit 10 set for the
/// clockwise (negative) direction.
pub fn speed_to_register(deg_per_sec: f64, unit_rpm: f64) -> u16 {
    let units = (deg_per_sec.abs() / (6.0 * unit_rpm)).round().min(1023.0) as u16;
    if deg_per_sec < 0.0 && units > 0 {
        units | 0x400
    } else {
        units
    }
}

/// Decode a present-speed register value into deg/s
pub fn register_to_speed(value: u16, unit_rpm: f64) -> f64 {
    let magnitude = (value & 0x3FF) as f64 * unit_rpm * 6.0;
    if value & 0x400 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_ping_packet() {
        // Reference packet from the protocol 1.0 manual: ping servo 1
        let packet = encode_instruction(1, Instruction::Ping, &[]).unwrap();
        assert_eq!(packet, vec![0xFF, 0xFF, 0x01, 0x02, 0x01, 0xFB]);
    }

    #[test]
    fn test_write_data_packet() {
        // Set servo 1 moving speed to 0x0200
        let packet = write_data(1, register::MOVING_SPEED, &[0x00, 0x02]).unwrap();
        assert_eq!(packet[..7], [0xFF, 0xFF, 0x01, 0x05, 0x03, 0x20, 0x00]);
        assert_eq!(packet[7], 0x02);
        assert_eq!(packet[8], checksum(&packet[2..8]));
    }

    #[test]
    fn test_sync_write_layout() {
        let left: &[u8] = &[0x10, 0x00];
        let right: &[u8] = &[0x10, 0x04];
        let packet = sync_write(register::MOVING_SPEED, &[(2, left), (1, right)]).unwrap();
        assert_eq!(packet[2], BROADCAST_ID);
        assert_eq!(packet[3] as usize, packet.len() - 4);
        assert_eq!(packet[4], Instruction::SyncWrite as u8);
        assert_eq!(&packet[5..13], &[0x20, 2, 2, 0x10, 0x00, 1, 0x10, 0x04]);

        let short: &[u8] = &[0x10];
        assert!(sync_write(register::MOVING_SPEED, &[(2, short), (1, right)]).is_err());
    }

    #[test]
    fn test_decode_status() {
        // Servo 1 reports present speed 0x0420, no error
        let mut bytes = vec![0xFF, 0xFF, 0x01, 0x04, 0x00, 0x20, 0x04];
        bytes.push(checksum(&bytes[2..]));
        let status = decode_status(&bytes).unwrap().check(1).unwrap();
        assert_eq!(status.word().unwrap(), 0x0420);

        let mut corrupt = bytes.clone();
        corrupt[5] ^= 0x01;
        assert!(matches!(decode_status(&corrupt), Err(DynamixelError::Checksum { .. })));
    }

    #[test]
    fn test_status_error_flags() {
        let mut bytes = vec![0xFF, 0xFF, 0x02, 0x02, 0x24];
        bytes.push(checksum(&bytes[2..]));
        let err = decode_status(&bytes).unwrap().check(2).unwrap_err();
        assert_eq!(err, DynamixelError::Servo { id: 2, flags: 0x24 });
        assert_eq!(describe_error_flags(0x24), "overheating, overload");
        assert_eq!(describe_error_flags(0), "none");

        let status = decode_status(&bytes).unwrap();
        assert!(matches!(status.check(1), Err(DynamixelError::UnexpectedId { .. })));
    }

    #[test]
    fn test_read_status_from_stream() {
        let mut bytes = vec![0xFF, 0xFF, 0x01, 0x02, 0x00];
        bytes.push(checksum(&bytes[2..]));
        bytes.extend_from_slice(&[0xAA, 0xBB]); // trailing noise stays unread
        let mut cursor = Cursor::new(bytes);
        let status = read_status(&mut cursor).unwrap().unwrap();
        assert_eq!(status.id, 1);
        assert!(status.params.is_empty());
        assert_eq!(cursor.position(), 6);

        let mut truncated = Cursor::new(vec![0xFF, 0xFF, 0x01]);
        assert!(read_status(&mut truncated).is_err());
    }

    #[test]
    fn test_speed_encoding() {
        assert_eq!(speed_to_register(0.0, 0.111), 0);
        // 0.111 rpm * 6 = 0.666 deg/s per unit
        assert_eq!(speed_to_register(66.6, 0.111), 100);
        assert_eq!(speed_to_register(-66.6, 0.111), 100 | 0x400);
        assert_eq!(speed_to_register(1e6, 0.111), 1023);
        assert_eq!(speed_to_register(-1e6, 0.111), 1023 | 0x400);

        assert!((register_to_speed(100, 0.111) - 66.6).abs() < 1e-9);
        assert!((register_to_speed(100 | 0x400, 0.111) + 66.6).abs() < 1e-9);
    }
}
