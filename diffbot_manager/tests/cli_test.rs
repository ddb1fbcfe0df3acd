// End-to-end runs of the `diffbot` binary with the simulated drive
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn diffbot(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_diffbot"))
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch diffbot")
}

#[test]
fn test_conflicting_modes_exit_1() {
    let dir = tempfile::tempdir().unwrap();
    let out = diffbot(&["--simulate", "--follow-line", "--passive-mode"], dir.path());
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("only one"));
}

#[test]
fn test_goto_current_position_completes() {
    let dir = tempfile::tempdir().unwrap();
    let out = diffbot(&["--simulate", "--goto", "0", "0", "0"], dir.path());
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));

    let maps: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(maps.len(), 1);
    assert!(maps[0].starts_with("go_to_map_") && maps[0].ends_with(".png"));
}

#[test]
fn test_no_map_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = diffbot(&["--simulate", "--no-map", "--goto", "0", "0", "2"], dir.path());
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_exhausted_frames_report_final_pose() {
    let dir = tempfile::tempdir().unwrap();
    let frames = dir.path().join("frames");
    std::fs::create_dir(&frames).unwrap();
    image::RgbImage::from_pixel(8, 8, image::Rgb([128, 128, 128]))
        .save(frames.join("0001.png"))
        .unwrap();

    let out = diffbot(
        &["--simulate", "--no-map", "--frames", frames.to_str().unwrap()],
        dir.path(),
    );
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Final pose:"), "{}", stderr);
}

#[test]
fn test_missing_config_is_an_init_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = diffbot(&["--simulate", "--config", "missing.toml", "--goto", "0", "0", "0"], dir.path());
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Configuration error"));
}
