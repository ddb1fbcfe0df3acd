//! diffbot manager
//!
//! Everything behind the `diffbot` binary: argument parsing, the session
//! lifecycle and one runner per mode.

pub mod cli;
pub mod commands;
pub mod session;
