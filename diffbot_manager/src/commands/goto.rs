use crate::session::Session;
use diffbot_core::error::DiffbotResult;
use diffbot_library::{Navigator, RunOutcome};

/// Drive to `(x, y)` and turn to `heading`
pub fn run(session: &Session, x: f64, y: f64, heading: f64) -> DiffbotResult<RunOutcome> {
    let mut navigator = Navigator::new(session.params.navigator);
    navigator.set_target(x, y, heading);
    navigator.run_to_completion(&session.drive_base(), &session.estimator, &session.cancel)
}
