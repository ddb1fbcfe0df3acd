//! # diffbot core
//!
//! Shared building blocks for the diffbot workspace:
//!
//! - **error**: the unified [`DiffbotError`] taxonomy and result aliases
//! - **params**: robot parameters loaded from TOML ([`RobotParams`])
//! - **shutdown**: the operator cancellation flag ([`CancelToken`])
//!
//! Nothing in this crate touches hardware; the drivers, algorithms and
//! controllers live in `diffbot_library`.

pub mod error;
pub mod params;
pub mod shutdown;

pub use error::{DiffbotError, DiffbotResult};
pub use params::RobotParams;
pub use shutdown::CancelToken;
