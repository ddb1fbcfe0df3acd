use crate::messages::{ColorRange, ColorSequence, MarkerThresholds, MotionCommand, VisionReading};
use crate::nodes::drive_base::DriveBase;
use crate::nodes::operator_input::{OperatorEvent, OperatorInput};
use crate::nodes::RunOutcome;
use crate::vision::VisionSensor;
use diffbot_core::error::{DiffbotError, DiffbotResult};
use diffbot_core::params::LineFollowerParams;
use diffbot_core::shutdown::CancelToken;
use std::time::{Duration, Instant};

/// Result of one line follower tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FollowStep {
    Drive(MotionCommand),
    /// The last color is done or the operator asked to stop
    Finished,
}

/// Color-sequence line follower
///
/// Follows the line of the current color with a proportional steering law
/// and moves to the next color each time a marker is accepted. A marker is
/// accepted when it is seen after the start grace period and at least one
/// cooldown after the previous sighting; every sighting restarts the
/// cooldown, so a marker that stays in view triggers only once. Accepting
/// the marker of the last color finishes the run.
///
/// With manual switching, markers are ignored and the operator advances the
/// color with [`OperatorEvent::Advance`].
///
/// # Example
/// ```rust
/// use diffbot_core::params::LineFollowerParams;
/// use diffbot_library::messages::VisionReading;
/// use diffbot_library::nodes::{FollowStep, LineFollower};
/// use std::time::Instant;
///
/// let start = Instant::now();
/// let mut follower = LineFollower::new(&LineFollowerParams::default(), false, start).unwrap();
/// match follower.step(VisionReading::line(0.5), start) {
///     FollowStep::Drive(cmd) => assert_eq!(cmd.turn_rate, 70.0),
///     FollowStep::Finished => unreachable!(),
/// }
/// ```
pub struct LineFollower {
    params: LineFollowerParams,
    sequence: ColorSequence,
    thresholds: MarkerThresholds,
    manual_switch: bool,

    current_index: usize,
    started: Instant,
    last_marker_seen: Option<Instant>,
    slowdown_until: Option<Instant>,
    finished: bool,
    exit_requested: bool,
}

impl LineFollower {
    pub fn new(params: &LineFollowerParams, manual_switch: bool, now: Instant) -> DiffbotResult<Self> {
        let sequence = ColorSequence::new(params.colors.clone()).ok_or_else(|| {
            DiffbotError::Config("line follower needs at least one color".to_string())
        })?;
        Ok(Self {
            thresholds: MarkerThresholds {
                roi_share: params.marker_roi_threshold,
                full_frame_share: params.marker_full_frame_threshold,
            },
            params: params.clone(),
            sequence,
            manual_switch,
            current_index: 0,
            started: now,
            last_marker_seen: None,
            slowdown_until: None,
            finished: false,
            exit_requested: false,
        })
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_color(&self) -> &ColorRange {
        self.sequence.color_at(self.current_index)
    }

    pub fn is_finished(&self) -> bool {
        self.finished || self.exit_requested
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn manual_switch(&self) -> bool {
        self.manual_switch
    }

    pub fn marker_thresholds(&self) -> &MarkerThresholds {
        &self.thresholds
    }

    /// Force the run to finish on the next tick
    pub fn request_exit(&mut self) {
        if !self.exit_requested {
            tracing::info!(color_index = self.current_index, "line following exit requested");
        }
        self.exit_requested = true;
    }

    pub fn handle_event(&mut self, event: OperatorEvent, now: Instant) {
        match event {
            OperatorEvent::Quit => self.request_exit(),
            OperatorEvent::Advance if self.manual_switch => self.advance(now),
            OperatorEvent::Advance => {
                tracing::debug!("color advance ignored outside manual switch mode")
            }
        }
    }

    fn advance(&mut self, now: Instant) {
        if self.is_finished() {
            return;
        }
        if self.current_index >= self.sequence.last_index() {
            self.finished = true;
            tracing::info!(colors = self.sequence.len(), "finished last color");
            return;
        }
        self.current_index += 1;
        self.slowdown_until = now.checked_add(self.params.marker_slowdown());
        tracing::info!(
            color_index = self.current_index,
            color = self.current_color().label(),
            "switched to next color"
        );
    }

    fn marker_accepted(&mut self, now: Instant) -> bool {
        let in_grace = now.saturating_duration_since(self.started) < self.params.start_grace();
        let cooled_down = self.last_marker_seen.map_or(true, |seen| {
            now.saturating_duration_since(seen) >= self.params.marker_cooldown()
        });
        self.last_marker_seen = Some(now);
        !in_grace && cooled_down
    }

    /// Advance the state machine with one vision reading
    pub fn step(&mut self, reading: VisionReading, now: Instant) -> FollowStep {
        if self.is_finished() {
            return FollowStep::Finished;
        }

        if reading.marker && !self.manual_switch && self.marker_accepted(now) {
            self.advance(now);
            if self.is_finished() {
                return FollowStep::Finished;
            }
        }

        let Some(offset) = reading.offset else {
            return FollowStep::Drive(MotionCommand::zero());
        };
        let offset = offset.clamp(-1.0, 1.0);
        let mut speed = (1.0 - offset.abs()).max(0.0);
        if self.slowdown_until.map_or(false, |until| now < until) {
            speed *= self.params.marker_slowdown_factor;
        }
        FollowStep::Drive(MotionCommand::new(speed, offset * self.params.theta_gain))
    }

    /// Follow the line until the last color is done
    ///
    /// Returns [`RunOutcome::Cancelled`] when `cancel` trips. A capture
    /// error marked transient skips the tick; more than
    /// `max_missed_frames` consecutive ticks without a frame abort the run.
    pub fn run(
        &mut self,
        drive: &DriveBase,
        sensor: &mut dyn VisionSensor,
        input: Option<&OperatorInput>,
        cancel: &CancelToken,
    ) -> DiffbotResult<RunOutcome> {
        let authority = drive.acquire();
        let mut missed: u32 = 0;
        tracing::info!(
            colors = self.sequence.len(),
            manual_switch = self.manual_switch,
            first = self.current_color().label(),
            "line following started"
        );

        loop {
            if cancel.is_cancelled() {
                tracing::warn!(color_index = self.current_index, "line following cancelled");
                return Ok(RunOutcome::Cancelled);
            }
            if let Some(input) = input {
                for event in input.drain() {
                    self.handle_event(event, Instant::now());
                }
            }
            if self.is_finished() {
                authority.stop()?;
                return Ok(RunOutcome::Completed);
            }

            let frame = match sensor.capture_frame() {
                Ok(Some(frame)) => {
                    missed = 0;
                    Some(frame)
                }
                Ok(None) => None,
                Err(e) if e.is_transient() => {
                    tracing::warn!(error = %e, "frame capture failed, skipping tick");
                    None
                }
                Err(e) => return Err(e),
            };

            let step = match frame {
                Some(frame) => {
                    let reading = VisionReading {
                        offset: sensor.detect_line(&frame, self.current_color()),
                        marker: !self.manual_switch
                            && sensor.detect_marker(&frame, &self.params.marker, &self.thresholds),
                    };
                    self.step(reading, Instant::now())
                }
                None => {
                    missed += 1;
                    if missed > self.params.max_missed_frames {
                        return Err(DiffbotError::Vision(format!(
                            "no camera frame for {} consecutive ticks",
                            missed
                        )));
                    }
                    FollowStep::Drive(MotionCommand::zero())
                }
            };

            match step {
                FollowStep::Drive(command) => authority.apply(&command)?,
                FollowStep::Finished => {
                    authority.stop()?;
                    return Ok(RunOutcome::Completed);
                }
            }

            let pause = self.params.tick_interval();
            if pause > Duration::ZERO && cancel.sleep(pause) {
                tracing::warn!(color_index = self.current_index, "line following cancelled");
                return Ok(RunOutcome::Cancelled);
            }
        }
    }
}
