// Closed-loop runs of the controllers against the simulated drive
use crossbeam::channel;
use diffbot_core::error::DiffbotError;
use diffbot_core::params::{LineFollowerParams, NavigatorParams, VisionParams};
use diffbot_library::prelude::*;
use diffbot_library::OperatorEvent;
use diffbot_library::OperatorInput;
use image::{Rgb, RgbImage};
use std::sync::Arc;
use std::time::{Duration, Instant};

const WIDTH: u32 = 40;
const HEIGHT: u32 = 30;

const FLOOR: Rgb<u8> = Rgb([128, 128, 128]);
const YELLOW: Rgb<u8> = Rgb([255, 220, 0]);
const BLUE: Rgb<u8> = Rgb([0, 128, 255]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);
const BROWN: Rgb<u8> = Rgb([120, 90, 60]);

fn line_frame(color: Rgb<u8>) -> RgbImage {
    RgbImage::from_fn(WIDTH, HEIGHT, |x, _| if (16..24).contains(&x) { color } else { FLOOR })
}

fn marker_frame() -> RgbImage {
    RgbImage::from_pixel(WIDTH, HEIGHT, BROWN)
}

/// No grace period and no cooldown, so replayed frames drive the sequence
fn eager_params() -> LineFollowerParams {
    LineFollowerParams {
        start_grace_s: 0.0,
        marker_cooldown_s: 0.0,
        max_missed_frames: 3,
        ..LineFollowerParams::default()
    }
}

fn drive(sim: &Arc<SimulatedDrive>) -> DriveBase {
    DriveBase::with_model(sim.clone(), KinematicsModel::default(), 0.2)
}

/// Cancels `token` after `after` unless the test finished first
fn watchdog(token: &CancelToken, after: Duration) {
    let token = token.clone();
    std::thread::spawn(move || {
        std::thread::sleep(after);
        token.cancel();
    });
}

#[test]
fn test_follows_three_colors_over_markers() {
    let sim = Arc::new(SimulatedDrive::new());
    let drive = drive(&sim);
    let mut camera = ImageSequence::from_frames(
        vec![
            line_frame(YELLOW),
            marker_frame(),
            line_frame(BLUE),
            marker_frame(),
            line_frame(RED),
            marker_frame(),
        ],
        VisionParams::default(),
    );

    let mut follower = LineFollower::new(&eager_params(), false, Instant::now()).unwrap();
    let outcome = follower
        .run(&drive, &mut camera, None, &CancelToken::new())
        .unwrap();

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(follower.current_index(), 2);
    assert!(follower.is_finished());
    assert!(!follower.exit_requested());
    assert_eq!(camera.remaining(), 0);

    let commands = sim.commands();
    // centered yellow line: straight at full speed
    assert!(commands[0].left > 0.0);
    assert_eq!(commands[0].left, commands[0].right);
    // marker frame: no line of the new color in view
    assert!(commands[1].is_zero());
    // blue line right after the marker: slowed down
    assert!((commands[2].left - 0.5 * commands[0].left).abs() < 1e-9);
    assert!(sim.current_speeds().is_zero());
}

#[test]
fn test_lost_camera_aborts_and_stops() {
    let sim = Arc::new(SimulatedDrive::new());
    let drive = drive(&sim);
    let mut camera =
        ImageSequence::from_frames(vec![line_frame(YELLOW); 2], VisionParams::default());

    let mut follower = LineFollower::new(&eager_params(), false, Instant::now()).unwrap();
    let err = follower
        .run(&drive, &mut camera, None, &CancelToken::new())
        .unwrap_err();

    assert!(matches!(err, DiffbotError::Vision(_)));
    assert!(sim.current_speeds().is_zero());
}

#[test]
fn test_manual_switch_ignores_markers() {
    let sim = Arc::new(SimulatedDrive::new());
    let drive = drive(&sim);
    let (tx, rx) = channel::unbounded();
    let input = OperatorInput::from_receiver(rx);
    let mut camera = ImageSequence::from_frames(
        vec![marker_frame(), marker_frame(), marker_frame(), line_frame(YELLOW)],
        VisionParams::default(),
    );

    let mut follower = LineFollower::new(&eager_params(), true, Instant::now()).unwrap();
    // three markers and no operator input: still the first color, then the
    // replay runs dry and the missed frames end the run
    let err = follower
        .run(&drive, &mut camera, Some(&input), &CancelToken::new())
        .unwrap_err();
    assert!(err.is_transient());
    assert_eq!(follower.current_index(), 0);

    let mut camera = ImageSequence::from_frames(vec![line_frame(YELLOW); 4], VisionParams::default());
    let mut follower = LineFollower::new(&eager_params(), true, Instant::now()).unwrap();
    for _ in 0..3 {
        tx.send(OperatorEvent::Advance).unwrap();
    }
    let outcome = follower
        .run(&drive, &mut camera, Some(&input), &CancelToken::new())
        .unwrap();
    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(follower.current_index(), 2);
    assert!(sim.current_speeds().is_zero());
}

#[test]
fn test_quit_event_completes_run() {
    let sim = Arc::new(SimulatedDrive::new());
    let drive = drive(&sim);
    let (tx, rx) = channel::unbounded();
    let input = OperatorInput::from_receiver(rx);
    tx.send(OperatorEvent::Quit).unwrap();
    let mut camera = ImageSequence::from_frames(vec![line_frame(YELLOW)], VisionParams::default());

    let mut follower = LineFollower::new(&eager_params(), false, Instant::now()).unwrap();
    let outcome = follower
        .run(&drive, &mut camera, Some(&input), &CancelToken::new())
        .unwrap();

    assert_eq!(outcome, RunOutcome::Completed);
    assert!(follower.exit_requested());
    assert_eq!(camera.remaining(), 1);
}

#[test]
fn test_cancelled_follow_stops_wheels() {
    let sim = Arc::new(SimulatedDrive::new());
    sim.push(WheelVelocityPair::new(50.0, 50.0));
    let drive = drive(&sim);
    let mut camera = ImageSequence::from_frames(vec![line_frame(YELLOW)], VisionParams::default());
    let cancel = CancelToken::new();
    cancel.cancel();

    let mut follower = LineFollower::new(&eager_params(), false, Instant::now()).unwrap();
    let outcome = follower.run(&drive, &mut camera, None, &cancel).unwrap();

    assert_eq!(outcome, RunOutcome::Cancelled);
    assert!(sim.current_speeds().is_zero());
}

fn navigate(target: (f64, f64, f64)) -> (RunOutcome, Pose) {
    let sim = Arc::new(SimulatedDrive::new());
    let drive = drive(&sim);
    let estimator = PoseEstimator::new(KinematicsModel::default());
    estimator.start_periodic_sampling(sim.clone(), 200.0).unwrap();

    let mut navigator = Navigator::new(NavigatorParams {
        poll_interval_ms: 10,
        ..NavigatorParams::default()
    });
    navigator.set_target(target.0, target.1, target.2);

    let cancel = CancelToken::new();
    watchdog(&cancel, Duration::from_secs(20));
    let outcome = navigator
        .run_to_completion(&drive, &estimator, &cancel)
        .unwrap();
    estimator.stop_periodic_sampling();

    assert!(sim.current_speeds().is_zero());
    (outcome, estimator.get_position())
}

#[test]
fn test_navigates_straight_ahead() {
    let (outcome, pose) = navigate((0.3, 0.0, 0.0));
    assert_eq!(outcome, RunOutcome::Completed);
    assert!(pose.distance_to(&Pose::new(0.3, 0.0, 0.0)) < 0.07, "{:?}", pose);
    assert!(pose.heading.abs() < 7.0, "{:?}", pose);
}

#[test]
fn test_navigates_to_offset_pose() {
    let (outcome, pose) = navigate((0.2, 0.2, 90.0));
    assert_eq!(outcome, RunOutcome::Completed);
    assert!(pose.distance_to(&Pose::new(0.2, 0.2, 90.0)) < 0.07, "{:?}", pose);
    assert!((pose.heading - 90.0).abs() < 7.0, "{:?}", pose);
}

#[test]
fn test_cancelled_navigation_stops_wheels() {
    let sim = Arc::new(SimulatedDrive::new());
    let drive = drive(&sim);
    let estimator = PoseEstimator::new(KinematicsModel::default());
    let mut navigator = Navigator::new(NavigatorParams::default());
    navigator.set_target(5.0, 0.0, 0.0);

    let cancel = CancelToken::new();
    watchdog(&cancel, Duration::from_millis(100));
    let outcome = navigator
        .run_to_completion(&drive, &estimator, &cancel)
        .unwrap();

    assert_eq!(outcome, RunOutcome::Cancelled);
    assert!(sim.commands().iter().any(|c| !c.is_zero()));
    assert!(sim.current_speeds().is_zero());
}

#[test]
fn test_navigation_without_target_is_rejected() {
    let sim = Arc::new(SimulatedDrive::new());
    let estimator = PoseEstimator::new(KinematicsModel::default());
    let navigator = Navigator::new(NavigatorParams::default());
    assert!(matches!(
        navigator.run_to_completion(&drive(&sim), &estimator, &CancelToken::new()),
        Err(DiffbotError::InvalidInput(_))
    ));
}
