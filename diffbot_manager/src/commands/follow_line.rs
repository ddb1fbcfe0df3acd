use crate::session::Session;
use diffbot_core::error::DiffbotResult;
use diffbot_core::params::VisionParams;
use diffbot_library::vision::{ImageSequence, VisionSensor};
use diffbot_library::{LineFollower, OperatorInput, RunOutcome};
use std::path::Path;
use std::time::Instant;

/// Follow the configured color sequence
///
/// Frames come from `frames` when given, otherwise from the live camera.
/// Stdin lines are operator commands: Enter or `n` switches color in manual
/// mode, `q` ends the run.
pub fn run(session: &Session, manual_switch: bool, frames: Option<&Path>) -> DiffbotResult<RunOutcome> {
    let mut sensor = open_sensor(session.params.vision, frames)?;
    let input = OperatorInput::from_stdin()?;
    let mut follower = LineFollower::new(&session.params.line_follower, manual_switch, Instant::now())?;

    if manual_switch {
        tracing::info!("manual switch: press Enter for the next color, q to stop");
    }
    follower.run(&session.drive_base(), sensor.as_mut(), Some(&input), &session.cancel)
}

fn open_sensor(params: VisionParams, frames: Option<&Path>) -> DiffbotResult<Box<dyn VisionSensor>> {
    if let Some(dir) = frames {
        return Ok(Box::new(ImageSequence::from_dir(dir, params)?));
    }
    open_camera(params)
}

#[cfg(feature = "opencv-backend")]
fn open_camera(params: VisionParams) -> DiffbotResult<Box<dyn VisionSensor>> {
    Ok(Box::new(diffbot_library::vision::OpenCvCamera::open(params)?))
}

#[cfg(not(feature = "opencv-backend"))]
fn open_camera(_params: VisionParams) -> DiffbotResult<Box<dyn VisionSensor>> {
    Err(diffbot_core::error::DiffbotError::InitializationFailed(
        "built without opencv-backend, replay frames with --frames DIR".to_string(),
    ))
}
