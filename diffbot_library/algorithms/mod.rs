//! Pure computational algorithms
//!
//! Nothing in here performs I/O or keeps state between calls, so every
//! function can be exercised directly from unit tests.
//!
//! - **angles**: heading normalization and wrap-aware angle differences
//! - **differential_drive**: wheel speeds <-> body velocity
//! - **odometry**: one dead-reckoning integration step
//! - **color_segmentation**: HSV masks, line centroid and marker shares

pub mod angles;
pub mod color_segmentation;
pub mod differential_drive;
pub mod odometry;
