use crate::session::Session;
use diffbot_core::error::DiffbotResult;
use diffbot_library::{PassiveMode, RunOutcome};

pub fn run(session: &Session) -> DiffbotResult<RunOutcome> {
    PassiveMode::new(session.actuator.clone()).run(&session.estimator, &session.cancel)
}
