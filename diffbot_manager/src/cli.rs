//! Command line surface of the `diffbot` binary

use clap::Parser;
use diffbot_core::error::{DiffbotError, DiffbotResult};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "diffbot")]
#[command(about = "Line following, go-to and passive odometry for the diffbot robot")]
#[command(version)]
pub struct Cli {
    /// Follow the colored line sequence (default mode)
    #[arg(long = "follow-line")]
    pub follow_line: bool,

    /// Switch line colors on Enter instead of on markers
    #[arg(long = "manual-switch")]
    pub manual_switch: bool,

    /// Drive to a position (m) and turn to a heading (deg)
    #[arg(
        long = "goto",
        num_args = 3,
        value_names = ["X", "Y", "ANGLE"],
        allow_negative_numbers = true
    )]
    pub goto: Option<Vec<f64>>,

    /// Release the motors and track the pose while the robot is pushed
    #[arg(long = "passive-mode")]
    pub passive_mode: bool,

    /// Robot parameter file (TOML)
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Use the simulated drive instead of the servos
    #[arg(long = "simulate")]
    pub simulate: bool,

    /// Replay camera frames from a directory instead of a live camera
    #[arg(long = "frames", value_name = "DIR")]
    pub frames: Option<PathBuf>,

    /// Directory the trajectory map is written to
    #[arg(long = "map-dir", value_name = "DIR", default_value = ".")]
    pub map_dir: PathBuf,

    /// Do not write a trajectory map
    #[arg(long = "no-map")]
    pub no_map: bool,
}

/// The one control goal of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    FollowLine { manual_switch: bool },
    GoTo { x: f64, y: f64, heading: f64 },
    Passive,
}

impl Mode {
    /// Short name used in file names and logs
    pub fn name(&self) -> &'static str {
        match self {
            Mode::FollowLine { .. } => "follow_line",
            Mode::GoTo { .. } => "go_to",
            Mode::Passive => "passive_mode",
        }
    }
}

impl Cli {
    /// Resolve the selected mode
    ///
    /// At most one mode may be given and none means line following.
    /// `--manual-switch` only applies to line following.
    pub fn mode(&self) -> DiffbotResult<Mode> {
        let selected = [self.follow_line, self.goto.is_some(), self.passive_mode]
            .iter()
            .filter(|&&on| on)
            .count();
        if selected > 1 {
            return Err(DiffbotError::Config(
                "choose only one of --follow-line, --goto and --passive-mode".to_string(),
            ));
        }

        if let Some(values) = &self.goto {
            if self.manual_switch {
                return Err(DiffbotError::Config(
                    "--manual-switch requires --follow-line".to_string(),
                ));
            }
            return match values.as_slice() {
                &[x, y, heading] if [x, y, heading].iter().all(|v| v.is_finite()) => {
                    Ok(Mode::GoTo { x, y, heading })
                }
                _ => Err(DiffbotError::InvalidInput(format!(
                    "--goto expects three numbers, got {:?}",
                    values
                ))),
            };
        }

        if self.passive_mode {
            if self.manual_switch {
                return Err(DiffbotError::Config(
                    "--manual-switch requires --follow-line".to_string(),
                ));
            }
            return Ok(Mode::Passive);
        }

        Ok(Mode::FollowLine {
            manual_switch: self.manual_switch,
        })
    }
}
