use crate::algorithms::angles::{sign, vec_angle, vec_length, wrap_angle_distance};
use crate::messages::{MotionCommand, NavigationTarget, Pose};
use crate::nodes::drive_base::DriveBase;
use crate::nodes::pose_estimator::PoseEstimator;
use crate::nodes::RunOutcome;
use diffbot_core::error::{DiffbotError, DiffbotResult};
use diffbot_core::params::NavigatorParams;
use diffbot_core::shutdown::CancelToken;

/// Smallest turn multiplier while the heading error is non-zero
const MIN_TURN_MULT: f64 = 0.2;

/// Controller phase for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationPhase {
    /// Drive towards the target position
    Approach,
    /// Rotate in place to the target heading
    Align,
    /// Within both tolerances
    Arrived,
}

/// Everything the navigator computed for one pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationStep {
    pub phase: NavigationPhase,
    pub command: MotionCommand,
    /// Distance to the target position (m)
    pub distance: f64,
    /// Direction of the target position seen from the robot (deg)
    pub bearing: f64,
    /// Rotation left to reach the target heading (deg)
    pub heading_error_final: f64,
    /// Rotation left to face the target position (deg)
    pub heading_error_to_target: f64,
}

/// Go-to-pose controller
///
/// Two phases: approach the target position, steering towards it while
/// slowing down for large heading errors, then rotate in place to the
/// target heading.
///
/// # Example
/// ```rust
/// use diffbot_core::params::NavigatorParams;
/// use diffbot_library::messages::Pose;
/// use diffbot_library::nodes::{NavigationPhase, Navigator};
///
/// let mut nav = Navigator::new(NavigatorParams::default());
/// nav.set_target(1.0, 0.0, 0.0);
/// let step = nav.step(&Pose::origin()).unwrap();
/// assert_eq!(step.phase, NavigationPhase::Approach);
/// assert_eq!(step.command.speed_fraction, 1.0);
/// ```
pub struct Navigator {
    params: NavigatorParams,
    target: Option<NavigationTarget>,
}

impl Navigator {
    pub fn new(params: NavigatorParams) -> Self {
        Self {
            params,
            target: None,
        }
    }

    pub fn set_target(&mut self, x: f64, y: f64, heading: f64) {
        let target = NavigationTarget::new(x, y, heading);
        tracing::info!(x, y, heading = target.heading, "navigation target set");
        self.target = Some(target);
    }

    pub fn target(&self) -> Option<NavigationTarget> {
        self.target
    }

    pub fn params(&self) -> &NavigatorParams {
        &self.params
    }

    /// Compute the command for the current pose
    pub fn step(&self, pose: &Pose) -> DiffbotResult<NavigationStep> {
        let target = self
            .target
            .ok_or_else(|| DiffbotError::InvalidInput("navigation target not set".to_string()))?;
        Ok(self.step_towards(&target, pose))
    }

    fn step_towards(&self, target: &NavigationTarget, pose: &Pose) -> NavigationStep {
        let p = &self.params;
        let dx = target.x - pose.x;
        let dy = target.y - pose.y;
        let distance = vec_length(dx, dy);
        let bearing = vec_angle(dx, dy);

        let heading_error_final = wrap_angle_distance(pose.heading, target.heading);
        let heading_error_to_target = wrap_angle_distance(pose.heading, bearing);
        let turn_mult = |error: f64| (error.abs() / p.move_angle).clamp(MIN_TURN_MULT, 1.0);

        let (phase, command) = if distance >= p.distance_threshold {
            let e = heading_error_to_target;
            let speed_mult = (1.0 - e.abs() / p.move_angle).clamp(0.0, 1.0);
            let turn = p.base_turn_speed * -sign(e) * turn_mult(e);
            (NavigationPhase::Approach, MotionCommand::new(speed_mult, turn))
        } else if heading_error_final.abs() > p.angle_threshold {
            let e = heading_error_final;
            let turn = p.base_turn_speed * -sign(e) * turn_mult(e);
            (NavigationPhase::Align, MotionCommand::rotate(turn))
        } else {
            (NavigationPhase::Arrived, MotionCommand::zero())
        };

        NavigationStep {
            phase,
            command,
            distance,
            bearing,
            heading_error_final,
            heading_error_to_target,
        }
    }

    /// Drive to the target, polling the estimator every `poll_interval_ms`
    ///
    /// Holds motor authority for the whole run, so the wheels are stopped on
    /// every return path. A failed actuator write ends the run with an error.
    pub fn run_to_completion(
        &self,
        drive: &DriveBase,
        estimator: &PoseEstimator,
        cancel: &CancelToken,
    ) -> DiffbotResult<RunOutcome> {
        let target = self
            .target
            .ok_or_else(|| DiffbotError::InvalidInput("navigation target not set".to_string()))?;
        let authority = drive.acquire();
        let mut last_phase = None;
        let mut ticks: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                tracing::warn!(ticks, "navigation cancelled");
                return Ok(RunOutcome::Cancelled);
            }

            let pose = estimator.get_position();
            let step = self.step_towards(&target, &pose);
            if last_phase != Some(step.phase) {
                tracing::info!(
                    phase = ?step.phase,
                    distance = step.distance,
                    heading_error = step.heading_error_final,
                    "navigation phase"
                );
                last_phase = Some(step.phase);
            }

            if step.phase == NavigationPhase::Arrived {
                authority.stop()?;
                tracing::info!(ticks, x = pose.x, y = pose.y, heading = pose.heading, "target reached");
                return Ok(RunOutcome::Completed);
            }

            authority.apply(&step.command)?;
            ticks += 1;
            if cancel.sleep(self.params.poll_interval()) {
                tracing::warn!(ticks, "navigation cancelled");
                return Ok(RunOutcome::Cancelled);
            }
        }
    }
}
