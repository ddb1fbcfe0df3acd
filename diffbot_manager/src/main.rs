use clap::Parser;
use colored::*;
use diffbot_core::params::RobotParams;
use diffbot_core::shutdown::CancelToken;
use diffbot_manager::cli::{Cli, Mode};
use diffbot_manager::commands;
use diffbot_manager::session::{self, MapOptions, Session};
use diffbot_library::RunOutcome;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diffbot=info,diffbot_library=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Run the selected mode and return the process exit code
///
/// Errors before the session is open (bad arguments, config, no device)
/// come back as `Err`; everything after is reported with the final pose.
fn run(cli: Cli) -> anyhow::Result<i32> {
    let mode = cli.mode()?;
    let params = match &cli.config {
        Some(path) => RobotParams::load(path)?,
        None => RobotParams::default(),
    };
    let map = MapOptions {
        enabled: !cli.no_map,
        dir: cli.map_dir.clone(),
    };
    session::check_map_dir(&map)?;

    let cancel = CancelToken::install_ctrlc()?;
    let session = Session::open(params, cli.simulate, cancel)?;
    println!("{} {} mode, Ctrl+C to stop", "→".cyan(), mode.name().bold());

    let result = match mode {
        Mode::FollowLine { manual_switch } => {
            commands::follow_line::run(&session, manual_switch, cli.frames.as_deref())
        }
        Mode::GoTo { x, y, heading } => commands::goto::run(&session, x, y, heading),
        Mode::Passive => commands::passive::run(&session),
    };

    let pose = session.finish(&mode, &map);
    let code = session::exit_code(&mode, &result);
    let position = format!("x={:.3} m y={:.3} m heading={:.1}°", pose.x, pose.y, pose.heading);
    match (&result, code) {
        (_, 0) => println!("{} {}", "✓ Done:".green().bold(), position),
        (Ok(RunOutcome::Cancelled), _) => {
            eprintln!("{} {}", "Aborted by operator, final pose:".yellow().bold(), position)
        }
        (Err(e), _) => {
            tracing::error!(error = %e, "run failed");
            eprintln!("{} {}", "Error:".red().bold(), e);
            eprintln!("{} {}", "Final pose:".red(), position);
        }
        (Ok(RunOutcome::Completed), _) => {}
    }
    Ok(code)
}
