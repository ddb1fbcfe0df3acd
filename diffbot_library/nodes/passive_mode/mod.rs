use crate::hardware::DriveActuator;
use crate::messages::Pose;
use crate::nodes::pose_estimator::PoseEstimator;
use crate::nodes::RunOutcome;
use diffbot_core::error::DiffbotResult;
use diffbot_core::shutdown::CancelToken;
use std::sync::Arc;
use std::time::Duration;

/// Pose tracking while the robot is pushed by hand
///
/// Releases the servos' holding torque and waits for the operator to stop
/// the run; the estimator keeps integrating the wheel telemetry in the
/// meantime. Torque is restored on every exit path.
pub struct PassiveMode {
    actuator: Arc<dyn DriveActuator>,
    report_interval: Duration,
}

/// Restores holding torque when dropped
struct TorqueRelease<'a> {
    actuator: &'a dyn DriveActuator,
}

impl<'a> TorqueRelease<'a> {
    fn engage(actuator: &'a dyn DriveActuator) -> DiffbotResult<Self> {
        actuator.enable_passive_mode()?;
        Ok(Self { actuator })
    }
}

impl Drop for TorqueRelease<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.actuator.disable_passive_mode() {
            tracing::error!(error = %e, "could not restore holding torque");
        }
    }
}

impl PassiveMode {
    pub fn new(actuator: Arc<dyn DriveActuator>) -> Self {
        Self {
            actuator,
            report_interval: Duration::from_secs(1),
        }
    }

    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Track the pose until `cancel` trips
    ///
    /// An operator stop is the normal end of passive mode and is reported as
    /// [`RunOutcome::Completed`].
    pub fn run(&self, estimator: &PoseEstimator, cancel: &CancelToken) -> DiffbotResult<RunOutcome> {
        let _torque = TorqueRelease::engage(self.actuator.as_ref())?;
        tracing::info!("passive mode active, push the robot; Ctrl+C to stop");

        let mut last: Option<Pose> = None;
        while !cancel.sleep(self.report_interval) {
            let pose = estimator.get_position();
            if last != Some(pose) {
                tracing::info!(x = pose.x, y = pose.y, heading = pose.heading, "tracked pose");
                last = Some(pose);
            }
        }

        let pose = estimator.get_position();
        tracing::info!(x = pose.x, y = pose.y, heading = pose.heading, "passive mode stopped");
        Ok(RunOutcome::Completed)
    }
}
