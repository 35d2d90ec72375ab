//! Runs the binary end to end.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn feeder_gym(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_feeder-gym"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("feeder-gym process should run")
}

fn path_arg(p: &Path) -> &str {
    p.to_str().expect("temp path should be UTF-8")
}

#[test]
fn restoration_preset_writes_report_and_csvs() {
    let dir = tempfile::tempdir().unwrap();
    let telemetry = dir.path().join("telemetry.csv");
    let progress = dir.path().join("progress.csv");
    let ckpt = dir.path().join("ckpt");

    let output = feeder_gym(&[
        "--preset",
        "ieee123_restoration",
        "--timesteps",
        "30",
        "--eval-episodes",
        "1",
        "--telemetry-out",
        path_arg(&telemetry),
        "--progress-out",
        path_arg(&progress),
        "--checkpoint-dir",
        path_arg(&ckpt),
        "--log-level",
        "warn",
    ]);
    assert!(
        output.status.success(),
        "run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--- Training Report ---"));
    assert!(stdout.contains("Episodes:              6"));

    // header + one five-step evaluation episode
    assert_eq!(fs::read_to_string(&telemetry).unwrap().lines().count(), 6);
    // header + six training episodes
    assert_eq!(fs::read_to_string(&progress).unwrap().lines().count(), 7);
    assert!(ckpt.join("final_model.json").exists());
}

#[test]
fn scenario_file_runs() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/ieee34_quick.toml");
    let output = feeder_gym(&["--scenario", path_arg(&path), "--timesteps", "192"]);
    assert!(
        output.status.success(),
        "run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Episodes:              2"));
    assert!(stdout.contains("Evaluation reward:"));
}

#[test]
fn unknown_preset_fails() {
    let output = feeder_gym(&["--preset", "ieee13"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown preset"));
}

#[test]
fn invalid_scenario_reports_every_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[simulation]\nstep_minutes = 7\n\n[agent]\ngamma = 2.0\n").unwrap();

    let output = feeder_gym(&["--scenario", path_arg(&path)]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("simulation.step_minutes"));
    assert!(stderr.contains("agent.gamma"));
}
