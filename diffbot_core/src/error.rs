//! Unified error handling for diffbot
//!
//! One error type is shared by every crate in the workspace so that control
//! loops can decide, per error, whether to skip a tick or stop the robot.

use thiserror::Error;

/// Main error type for diffbot operations
#[derive(Debug, Error)]
pub enum DiffbotError {
    /// I/O related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parsing or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Actuator transport errors (serial port, bus timeouts)
    #[error("Driver error: {0}")]
    Driver(String),

    /// Malformed or rejected actuator packets
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Camera or image processing errors
    #[error("Vision error: {0}")]
    Vision(String),

    /// Serialization/Deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Operation timed out
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Resource not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid input/argument errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Initialization errors
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Internal errors with source location for debugging.
    /// Use the `diffbot_internal!()` macro to create these.
    #[error("Internal error: {message} (at {file}:{line})")]
    Internal {
        message: String,
        file: &'static str,
        line: u32,
    },
}

/// Create an internal error with automatic file/line capture.
///
/// ```rust
/// use diffbot_core::diffbot_internal;
/// let err = diffbot_internal!("unexpected state: {}", 3);
/// assert!(err.to_string().contains("unexpected state: 3"));
/// ```
#[macro_export]
macro_rules! diffbot_internal {
    ($($arg:tt)*) => {
        $crate::error::DiffbotError::Internal {
            message: format!($($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

impl DiffbotError {
    /// Whether a running loop may skip the current tick and carry on.
    ///
    /// Telemetry reads that fail once (a dropped status packet, a frame that
    /// did not arrive in time) are transient; configuration, initialization
    /// and internal errors are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DiffbotError::Driver(_)
                | DiffbotError::Protocol(_)
                | DiffbotError::Timeout(_)
                | DiffbotError::Vision(_)
        )
    }
}

/// Convenience type alias for Results using DiffbotError
pub type DiffbotResult<T> = std::result::Result<T, DiffbotError>;

/// Short alias - `Result<T>` is equivalent to `DiffbotResult<T>`
pub type Result<T> = DiffbotResult<T>;

impl From<serde_json::Error> for DiffbotError {
    fn from(err: serde_json::Error) -> Self {
        DiffbotError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for DiffbotError {
    fn from(err: toml::de::Error) -> Self {
        DiffbotError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for DiffbotError {
    fn from(err: toml::ser::Error) -> Self {
        DiffbotError::Serialization(format!("TOML serialization error: {}", err))
    }
}
