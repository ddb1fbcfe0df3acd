use crate::algorithms::differential_drive::KinematicsModel;
use crate::algorithms::odometry;
use crate::hardware::DriveActuator;
use crate::messages::{Pose, TrajectorySample};
use diffbot_core::error::{DiffbotError, DiffbotResult};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Minimum spacing of recorded trajectory samples
pub const DEFAULT_HISTORY_INTERVAL: Duration = Duration::from_millis(50);

/// Read failures between two escalated log lines
const FAILURE_LOG_EVERY: u64 = 100;

#[derive(Debug)]
struct PoseState {
    pose: Pose,
    epoch: Instant,
    history: Vec<TrajectorySample>,
    last_recorded: Instant,
    updates: u64,
}

impl PoseState {
    fn new(pose: Pose, now: Instant) -> Self {
        Self {
            pose,
            epoch: now,
            history: vec![TrajectorySample {
                t: 0.0,
                x: pose.x,
                y: pose.y,
                heading: pose.heading,
            }],
            last_recorded: now,
            updates: 0,
        }
    }

    fn record(&mut self, now: Instant, interval: Duration) {
        if now.saturating_duration_since(self.last_recorded) < interval {
            return;
        }
        self.last_recorded = now;
        self.history.push(TrajectorySample {
            t: now.saturating_duration_since(self.epoch).as_secs_f64(),
            x: self.pose.x,
            y: self.pose.y,
            heading: self.pose.heading,
        });
    }
}

struct Shared {
    state: Mutex<PoseState>,
    kinematics: KinematicsModel,
    history_interval: Duration,
}

impl Shared {
    fn integrate(&self, linear: f64, heading_rate: f64, dt: f64, now: Instant) {
        let mut state = self.state.lock();
        state.pose = odometry::integrate(state.pose, linear, heading_rate, dt);
        state.updates += 1;
        state.record(now, self.history_interval);
    }
}

/// A running sampling thread and its own stop flag
struct Sampler {
    handle: JoinHandle<()>,
    running: Arc<AtomicBool>,
}

/// Wheel-odometry pose estimator
///
/// Owns the robot pose and its trajectory log. Samples can be pushed with
/// [`integrate_sample`](Self::integrate_sample), or pulled from an actuator
/// by a background thread started with
/// [`start_periodic_sampling`](Self::start_periodic_sampling).
///
/// The pose lives behind one mutex that is held only for the arithmetic of a
/// single update; readers always get a complete snapshot.
///
/// # Example
/// ```rust
/// use diffbot_library::nodes::PoseEstimator;
/// use diffbot_library::KinematicsModel;
///
/// let estimator = PoseEstimator::new(KinematicsModel::default());
/// estimator.integrate_sample(0.2, 0.0, 0.5);
/// assert!((estimator.get_position().x - 0.1).abs() < 1e-12);
/// ```
pub struct PoseEstimator {
    shared: Arc<Shared>,
    sampler: Mutex<Option<Sampler>>,
}

impl PoseEstimator {
    pub fn new(kinematics: KinematicsModel) -> Self {
        Self::with_history_interval(kinematics, DEFAULT_HISTORY_INTERVAL)
    }

    pub fn with_history_interval(kinematics: KinematicsModel, history_interval: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(PoseState::new(Pose::origin(), Instant::now())),
                kinematics,
                history_interval,
            }),
            sampler: Mutex::new(None),
        }
    }

    /// Integrate one velocity sample
    ///
    /// # Arguments
    /// * `linear` - forward speed (m/s)
    /// * `heading_rate` - counter-clockwise yaw rate (deg/s), see
    ///   [`BodyVelocity::heading_rate`](crate::messages::BodyVelocity::heading_rate)
    /// * `dt` - sample duration (s)
    pub fn integrate_sample(&self, linear: f64, heading_rate: f64, dt: f64) {
        self.shared.integrate(linear, heading_rate, dt, Instant::now());
    }

    #[cfg(test)]
    pub(crate) fn integrate_sample_at(&self, linear: f64, heading_rate: f64, dt: f64, now: Instant) {
        self.shared.integrate(linear, heading_rate, dt, now);
    }

    /// Snapshot of the current pose
    pub fn get_position(&self) -> Pose {
        self.shared.state.lock().pose
    }

    /// Reset the pose and restart the trajectory log from it
    pub fn reset(&self, x: f64, y: f64, heading: f64) {
        let pose = Pose::new(x, y, heading);
        *self.shared.state.lock() = PoseState::new(pose, Instant::now());
        tracing::debug!(x, y, heading = pose.heading, "pose reset");
    }

    /// Copy of the decimated trajectory log, oldest first
    pub fn history(&self) -> Vec<TrajectorySample> {
        self.shared.state.lock().history.clone()
    }

    /// Number of samples integrated since the last reset
    pub fn update_count(&self) -> u64 {
        self.shared.state.lock().updates
    }

    pub fn kinematics(&self) -> &KinematicsModel {
        &self.shared.kinematics
    }

    pub fn is_sampling(&self) -> bool {
        self.sampler.lock().is_some()
    }

    /// Poll `actuator` at `frequency_hz` on a dedicated thread
    ///
    /// Each tick reads the wheel speeds, converts them with the kinematics
    /// model and integrates them over the measured time since the previous
    /// successful tick. Read errors are logged and the tick is skipped.
    pub fn start_periodic_sampling(
        &self,
        actuator: Arc<dyn DriveActuator>,
        frequency_hz: f64,
    ) -> DiffbotResult<()> {
        let period = sampling_period(frequency_hz)?;

        let mut sampler = self.sampler.lock();
        if sampler.is_some() {
            return Err(DiffbotError::InvalidInput(
                "periodic sampling is already running".to_string(),
            ));
        }

        let shared = Arc::clone(&self.shared);
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = std::thread::Builder::new()
            .name("pose-sampler".to_string())
            .spawn(move || sampling_loop(&shared, &flag, actuator.as_ref(), period))
            .map_err(|e| {
                DiffbotError::InitializationFailed(format!("cannot spawn sampling thread: {}", e))
            })?;

        *sampler = Some(Sampler { handle, running });
        tracing::info!(frequency_hz, "pose sampling started");
        Ok(())
    }

    /// Stop the sampling thread and wait for it to exit
    ///
    /// The stopped thread makes no pose update after this returns. Calling
    /// it while no sampler runs is a no-op. The sampler slot is released
    /// before the join, so a concurrent start gets a fresh thread with its
    /// own stop flag.
    pub fn stop_periodic_sampling(&self) {
        let stopped = {
            let mut sampler = self.sampler.lock();
            let stopped = sampler.take();
            if let Some(stopped) = &stopped {
                stopped.running.store(false, Ordering::SeqCst);
            }
            stopped
        };
        let Some(Sampler { handle, .. }) = stopped else {
            return;
        };

        if handle.join().is_err() {
            tracing::error!("pose sampling thread panicked");
        }
        tracing::info!(updates = self.update_count(), "pose sampling stopped");
    }
}

impl Drop for PoseEstimator {
    fn drop(&mut self) {
        self.stop_periodic_sampling();
    }
}

/// Tick period for `frequency_hz`, rejecting rates no `Duration` can express
fn sampling_period(frequency_hz: f64) -> DiffbotResult<Duration> {
    let invalid = || {
        DiffbotError::InvalidInput(format!(
            "sampling frequency must be a positive rate, got {}",
            frequency_hz
        ))
    };
    if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
        return Err(invalid());
    }
    match Duration::try_from_secs_f64(1.0 / frequency_hz) {
        Ok(period) if !period.is_zero() => Ok(period),
        _ => Err(invalid()),
    }
}

fn sampling_loop(
    shared: &Shared,
    running: &AtomicBool,
    actuator: &dyn DriveActuator,
    period: Duration,
) {
    let mut previous: Option<Instant> = None;
    let mut failures: u64 = 0;

    while running.load(Ordering::SeqCst) {
        let tick_start = Instant::now();

        match actuator.wheel_speeds() {
            Ok(wheels) => {
                if failures > 0 {
                    tracing::info!(failures, "wheel telemetry recovered");
                    failures = 0;
                }
                let now = Instant::now();
                if let Some(prev) = previous {
                    let dt = now.saturating_duration_since(prev).as_secs_f64();
                    if dt > 0.0 {
                        let body = shared.kinematics.direct(wheels.left, wheels.right);
                        shared.integrate(body.linear, body.heading_rate(), dt, now);
                    }
                }
                previous = Some(now);
            }
            Err(e) => {
                failures += 1;
                if failures == 1 {
                    tracing::warn!(error = %e, "wheel telemetry read failed, skipping tick");
                } else if failures % FAILURE_LOG_EVERY == 0 {
                    tracing::error!(failures, error = %e, "wheel telemetry still failing");
                }
            }
        }

        let elapsed = tick_start.elapsed();
        if elapsed < period {
            std::thread::sleep(period - elapsed);
        }
    }
}
