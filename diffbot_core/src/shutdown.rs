//! Operator cancellation
//!
//! A [`CancelToken`] is a shared flag that control loops poll once per tick.
//! Tripping it (Ctrl+C, a quit key, a test harness) asks the active loop to
//! stop the motors and return; it is a clean stop path, never an error.

use crate::error::{DiffbotError, DiffbotResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cloneable cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token that is tripped by Ctrl+C.
    ///
    /// Only one handler can be installed per process; a second call returns
    /// an initialization error.
    pub fn install_ctrlc() -> DiffbotResult<Self> {
        let token = Self::new();
        let handler_token = token.clone();
        ctrlc::set_handler(move || {
            tracing::warn!("Ctrl+C received, stopping");
            handler_token.cancel();
        })
        .map_err(|e| {
            DiffbotError::InitializationFailed(format!("cannot install Ctrl+C handler: {}", e))
        })?;
        Ok(token)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, waking early when the token trips.
    ///
    /// Returns `true` if the token was cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        const SLICE: Duration = Duration::from_millis(10);
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep((deadline - now).min(SLICE));
        }
    }
}
