//! Write-Ahead Log (WAL) for workout logs.
//!
//! Finished workouts are appended to a JSONL (JSON Lines) file with file
//! locking to ensure safe concurrent access.

use crate::{Result, WorkoutLog};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Workout log sink trait for persisting finished workouts
pub trait WorkoutLogSink {
    fn append(&mut self, log: &WorkoutLog) -> Result<()>;
}

/// JSONL-based workout log sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Create a new JSONL sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl WorkoutLogSink for JsonlSink {
    fn append(&mut self, log: &WorkoutLog) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(log)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended workout log {} to WAL", log.id);
        Ok(())
    }
}

/// Read all workout logs from a WAL file
///
/// Lines that fail to parse are skipped with a warning.
pub fn read_workout_logs(path: &Path) -> Result<Vec<WorkoutLog>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut logs = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<WorkoutLog>(&line) {
            Ok(log) => logs.push(log),
            Err(e) => {
                tracing::warn!("Failed to parse workout log at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} workout logs from WAL", logs.len());
    Ok(logs)
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::{SetLog, WorkoutLog};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    /// A two-set workout log completed `days_ago` days ago
    pub fn workout_log(workout_id: &str, days_ago: i64) -> WorkoutLog {
        let completed_at = Utc::now() - Duration::days(days_ago);
        let sets = vec![
            SetLog {
                exercise_id: "bench_press".into(),
                set_number: 1,
                weight: 60.0,
                reps: 8,
                rpe: Some(7),
                is_new_pr: false,
                completed_at,
            },
            SetLog {
                exercise_id: "bench_press".into(),
                set_number: 2,
                weight: 62.5,
                reps: 8,
                rpe: Some(8),
                is_new_pr: false,
                completed_at,
            },
        ];

        WorkoutLog {
            id: Uuid::new_v4(),
            workout_id: workout_id.into(),
            performed_on: completed_at.date_naive(),
            completed_at,
            duration_seconds: 1500,
            total_volume: 980.0,
            sets_completed: 2,
            exercises_completed: 1,
            sets,
        }
    }
}
