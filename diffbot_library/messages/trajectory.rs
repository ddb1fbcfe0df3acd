use serde::{Deserialize, Serialize};

/// One recorded point of the trajectory log
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    /// Seconds since the estimator was last reset
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}
