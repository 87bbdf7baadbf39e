//! Integration tests for the spotter binary.
//!
//! These tests verify end-to-end behavior including:
//! - Guided workouts driven from stdin
//! - Personal records and workout logs reaching disk
//! - History, records and CSV rollup views
//! - The calorie estimator

use assert_cmd::Command;
use predicates::prelude::*;
use spotter_core::catalog::Catalog;
use spotter_core::{Config, ExerciseTemplate, WorkoutTemplate};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("spotter"))
}

/// Config with every cue and the wake lock switched off
fn quiet_config(data_dir: &Path) -> PathBuf {
    let mut config = Config::default();
    config.data.data_dir = data_dir.to_path_buf();
    config.notifications.sound_enabled = false;
    config.notifications.voice_enabled = false;
    config.notifications.vibration_enabled = false;
    config.session.keep_screen_on = false;

    let path = data_dir.join("config.toml");
    config.save_to(&path).expect("Failed to write config");
    path
}

fn run_workout(data_dir: &Path, workout: &str, stdin: &str) -> assert_cmd::assert::Assert {
    let config = quiet_config(data_dir);
    cli()
        .arg("--config")
        .arg(&config)
        .arg("--data-dir")
        .arg(data_dir)
        .args(["run", workout, "--quiet", "--allow-sleep"])
        .write_stdin(stdin)
        .assert()
}

fn wal_lines(data_dir: &Path) -> Vec<serde_json::Value> {
    let content = fs::read_to_string(data_dir.join("wal/workout_logs.wal"))
        .expect("Failed to read WAL");
    content
        .lines()
        .map(|l| serde_json::from_str(l).expect("Invalid JSON in WAL"))
        .collect()
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Guided strength workouts"));
}

#[test]
fn test_verbose_logs_to_stderr() {
    let temp_dir = setup_test_dir();

    run_workout(temp_dir.path(), "full_body", "q\n").success();

    cli()
        .arg("--data-dir")
        .arg(temp_dir.path())
        .args(["--verbose", "history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("full_body"))
        .stderr(predicate::str::contains("Loaded 1 total workouts"));
}

#[test]
fn test_list_shows_builtin_workouts() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("--data-dir")
        .arg(temp_dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("push_day"))
        .stdout(predicate::str::contains("Leg Day"))
        .stdout(predicate::str::contains("full_body"));
}

#[test]
fn test_full_workout_with_enter_only() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    // full_body: 3 exercises × 3 sets. Enter logs the suggested set, then
    // skips the rest that follows; the last set finishes the workout.
    let stdin = "\n".repeat(9 + 8);

    run_workout(data_dir, "full_body", &stdin)
        .success()
        .stdout(predicate::str::contains("Workout complete"))
        .stdout(predicate::str::contains("Sets: 9/9"))
        .stdout(predicate::str::contains("Exercises: 3/3"))
        .stdout(predicate::str::contains("XP earned: 145"));

    let logs = wal_lines(data_dir);
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["workout_id"], "full_body");
    assert_eq!(logs[0]["sets_completed"], 9);
    assert_eq!(logs[0]["exercises_completed"], 3);
    assert_eq!(logs[0]["sets"].as_array().unwrap().len(), 9);
}

#[test]
fn test_first_weight_is_a_pr_and_is_stored() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run_workout(data_dir, "push_day", "60 8\nd\nq\n")
        .success()
        .stdout(predicate::str::contains("NEW PR! Bench Press: 60 kg"))
        .stdout(predicate::str::contains("Workout complete"))
        .stdout(predicate::str::contains("XP earned: 155"));

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .arg("records")
        .assert()
        .success()
        .stdout(predicate::str::contains("bench_press"))
        .stdout(predicate::str::contains("60 kg × 8"));
}

#[test]
fn test_second_session_uses_history() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    run_workout(data_dir, "push_day", "60 8\nd\nq\n").success();

    // Same weight again is not a PR; a heavier one is
    run_workout(data_dir, "push_day", "60 8\n\n62.5 5\nd\nq\n")
        .success()
        .stdout(predicate::str::contains("suggested 60 kg"))
        .stdout(predicate::str::contains("NEW PR! Bench Press: 62.5 kg"))
        .stdout(predicate::str::contains("Previous best 60 kg"));

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .arg("records")
        .assert()
        .success()
        .stdout(predicate::str::contains("62.5 kg × 5"));

    assert_eq!(wal_lines(data_dir).len(), 2);
}

#[test]
fn test_eof_ends_and_saves_workout() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    // Input ends in the middle of a PR celebration
    run_workout(data_dir, "leg_day", "100 5\n")
        .success()
        .stdout(predicate::str::contains("Workout complete"))
        .stdout(predicate::str::contains("Sets: 1/13"));

    let logs = wal_lines(data_dir);
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["total_volume"], 500.0);
}

#[test]
fn test_bad_input_is_reported_and_ignored() {
    let temp_dir = setup_test_dir();

    run_workout(temp_dir.path(), "pull_day", "heavy\ns\nq\n")
        .success()
        .stdout(predicate::str::contains("Couldn't read 'heavy'"))
        .stdout(predicate::str::contains(
            "Cannot skip rest while session is active",
        ))
        .stdout(predicate::str::contains("Sets: 0/12"));
}

#[test]
fn test_navigation_commands() {
    let temp_dir = setup_test_dir();

    // Skip to the second exercise, go back, log a set, pause and resume
    run_workout(temp_dir.path(), "full_body", "n\nb\n20 10\nd\np\nr\nq\n")
        .success()
        .stdout(predicate::str::contains("Next: Push-up"))
        .stdout(predicate::str::contains("Next: Goblet Squat"))
        .stdout(predicate::str::contains("Paused"))
        .stdout(predicate::str::contains("Sets: 1/9"));
}

#[test]
fn test_unknown_workout_fails() {
    let temp_dir = setup_test_dir();

    run_workout(temp_dir.path(), "arm_day", "")
        .failure()
        .stderr(predicate::str::contains("Could not load workout 'arm_day'"));

    assert!(!temp_dir.path().join("wal/workout_logs.wal").exists());
}

#[test]
fn test_user_template_is_listed_and_runnable() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let template = WorkoutTemplate {
        id: "finisher".into(),
        name: "Finisher".into(),
        exercises: vec![ExerciseTemplate {
            id: "farmer_carry".into(),
            name: "Farmer Carry".into(),
            muscle_group: "grip".into(),
            equipment: Some("dumbbell".into()),
            sets: 1,
            target_reps: 1,
            rest_time: 0,
        }],
    };
    Catalog::save_template(&data_dir.join("workouts"), &template).unwrap();

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("finisher"));

    run_workout(data_dir, "finisher", "\n")
        .success()
        .stdout(predicate::str::contains("Sets: 1/1"));
}

#[test]
fn test_init_writes_loadable_config() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("spotter/config.toml");

    cli()
        .arg("--config")
        .arg(&config_path)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default config"));

    let config = Config::load_from(&config_path).unwrap();
    let defaults = Config::default();
    assert_eq!(config.session, defaults.session);
    assert_eq!(config.notifications, defaults.notifications);
    assert_eq!(config.data.data_dir, defaults.data.data_dir);

    cli()
        .arg("--config")
        .arg(&config_path)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    // A broken config can be replaced with --force
    fs::write(&config_path, "[notifications]\nvolume = 7.0\n").unwrap();
    cli()
        .arg("--config")
        .arg(&config_path)
        .args(["init", "--force"])
        .assert()
        .success();
    assert!(Config::load_from(&config_path).is_ok());
}

#[test]
fn test_copy_creates_runnable_user_workout() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["copy", "leg_day", "my_legs", "--name", "My Legs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Copied leg_day"));

    assert!(data_dir.join("workouts/my_legs.toml").exists());

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("my_legs"))
        .stdout(predicate::str::contains("My Legs"));

    run_workout(data_dir, "my_legs", "q\n")
        .success()
        .stdout(predicate::str::contains("Sets: 0/13"));

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["copy", "arm_day", "my_arms"])
        .assert()
        .failure();
}

#[test]
fn test_history_and_rollup() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No workouts in the last 7 days"));

    run_workout(data_dir, "push_day", "q\n").success();
    run_workout(data_dir, "pull_day", "q\n").success();

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("push_day"))
        .stdout(predicate::str::contains("pull_day"))
        .stdout(predicate::str::contains("2 workouts"));

    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .args(["rollup", "--cleanup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled up 2 workouts"));

    assert!(data_dir.join("workout_logs.csv").exists());
    assert!(!data_dir.join("wal/workout_logs.wal").exists());
    assert!(!data_dir.join("wal/workout_logs.wal.processed").exists());

    // History still sees them through the CSV
    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 workouts"));
}

#[test]
fn test_rollup_without_wal() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("--data-dir")
        .arg(temp_dir.path())
        .arg("rollup")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to roll up"));
}

#[test]
fn test_calories() {
    cli()
        .args([
            "calories",
            "--activity",
            "running",
            "--minutes",
            "30",
            "--weight-kg",
            "70",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("343.0 kcal"));
}

#[test]
fn test_calories_uses_configured_weight() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[body]\nweight_kg = 60.0\n").unwrap();

    // 8.0 × 60 × 0.75
    cli()
        .arg("--config")
        .arg(&config_path)
        .args([
            "calories",
            "--activity",
            "cycling",
            "--intensity",
            "moderate",
            "--minutes",
            "45",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("360.0 kcal"));
}

#[test]
fn test_calories_unknown_activity() {
    cli()
        .args(["calories", "--activity", "curling", "--minutes", "30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown activity"));
}

#[test]
fn test_invalid_config_rejected() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[notifications]\nvolume = 2.5\n").unwrap();

    cli()
        .arg("--config")
        .arg(&config_path)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("volume"));
}
