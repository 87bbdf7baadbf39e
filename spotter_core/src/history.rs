//! Workout history loading with a day window.
//!
//! This module loads recent workout logs from both the WAL and the CSV
//! archive for the `history` view.

use crate::csv_rollup::CsvRow;
use crate::{Result, WorkoutLog};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

impl TryFrom<CsvRow> for WorkoutLog {
    type Error = crate::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| crate::Error::Other(format!("Invalid UUID: {}", e)))?;

        let completed_at = DateTime::parse_from_rfc3339(&row.completed_at)
            .map_err(|e| crate::Error::Other(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);

        let performed_on = row
            .performed_on
            .parse::<NaiveDate>()
            .map_err(|e| crate::Error::Other(format!("Invalid date: {}", e)))?;

        Ok(WorkoutLog {
            id,
            workout_id: row.workout_id,
            performed_on,
            completed_at,
            duration_seconds: row.duration,
            total_volume: row.total_volume,
            sets_completed: row.sets_completed,
            exercises_completed: row.exercises_completed,
            sets: vec![], // Not stored in CSV
        })
    }
}

/// Load workouts from the last N days from both WAL and CSV
///
/// Returns workouts sorted by completion time (newest first), with workouts
/// present in both files counted once.
pub fn load_recent_workouts(
    wal_path: &Path,
    csv_path: &Path,
    days: i64,
) -> Result<Vec<WorkoutLog>> {
    let cutoff = Utc::now() - Duration::days(days);
    let mut logs = Vec::new();
    let mut seen_ids = HashSet::new();

    // WAL first: it carries the set detail the CSV drops
    if wal_path.exists() {
        for log in crate::wal::read_workout_logs(wal_path)? {
            if log.completed_at >= cutoff && seen_ids.insert(log.id) {
                logs.push(log);
            }
        }
        tracing::debug!("Loaded {} workouts from WAL", logs.len());
    }

    if csv_path.exists() {
        let mut csv_count = 0;
        for log in load_workouts_from_csv(csv_path)? {
            if log.completed_at >= cutoff && seen_ids.insert(log.id) {
                logs.push(log);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} workouts from CSV", csv_count);
    }

    logs.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

    tracing::info!(
        "Loaded {} total workouts from last {} days",
        logs.len(),
        days
    );

    Ok(logs)
}

/// Load all workouts from a CSV archive
fn load_workouts_from_csv(path: &Path) -> Result<Vec<WorkoutLog>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut logs = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match WorkoutLog::try_from(row) {
                Ok(log) => logs.push(log),
                Err(e) => {
                    tracing::warn!("Failed to parse CSV row: {}", e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
            }
        }
    }

    Ok(logs)
}

/// Aggregate figures over a set of workouts
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryTotals {
    pub workouts: usize,
    pub total_seconds: u64,
    pub total_volume: f64,
    pub total_sets: u32,
}

pub fn totals(logs: &[WorkoutLog]) -> HistoryTotals {
    logs.iter().fold(HistoryTotals::default(), |mut acc, log| {
        acc.workouts += 1;
        acc.total_seconds += log.duration_seconds;
        acc.total_volume += log.total_volume;
        acc.total_sets += log.sets_completed;
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::testing::workout_log;
    use crate::wal::{JsonlSink, WorkoutLogSink};

    #[test]
    fn test_load_recent_workouts_from_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workout_logs.wal");
        let csv_path = temp_dir.path().join("workout_logs.csv");

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&workout_log("push_day", 1)).unwrap();
        sink.append(&workout_log("pull_day", 3)).unwrap();
        sink.append(&workout_log("leg_day", 10)).unwrap(); // Too old

        let logs = load_recent_workouts(&wal_path, &csv_path, 7).unwrap();
        assert_eq!(logs.len(), 2);
    }

    #[test]
    fn test_deduplication_across_wal_and_csv() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workout_logs.wal");
        let csv_path = temp_dir.path().join("workout_logs.csv");

        let log = workout_log("push_day", 1);
        let log_id = log.id;
        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&log).unwrap();

        crate::csv_rollup::wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();

        // Same workout again in a fresh WAL
        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&log).unwrap();

        let logs = load_recent_workouts(&wal_path, &csv_path, 7).unwrap();
        assert_eq!(logs.iter().filter(|l| l.id == log_id).count(), 1);
        // The WAL copy wins and keeps its sets
        assert_eq!(logs[0].sets.len(), 2);
    }

    #[test]
    fn test_csv_rows_restore_summary_fields() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workout_logs.wal");
        let csv_path = temp_dir.path().join("workout_logs.csv");

        let log = workout_log("leg_day", 2);
        JsonlSink::new(&wal_path).append(&log).unwrap();
        crate::csv_rollup::wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();

        let logs = load_recent_workouts(&wal_path, &csv_path, 7).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].id, log.id);
        assert_eq!(logs[0].performed_on, log.performed_on);
        assert_eq!(logs[0].total_volume, log.total_volume);
        assert!(logs[0].sets.is_empty());
    }

    #[test]
    fn test_workouts_sorted_newest_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workout_logs.wal");
        let csv_path = temp_dir.path().join("workout_logs.csv");

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&workout_log("old", 5)).unwrap();
        sink.append(&workout_log("new", 1)).unwrap();

        let logs = load_recent_workouts(&wal_path, &csv_path, 7).unwrap();
        assert_eq!(logs[0].workout_id, "new");
        assert_eq!(logs[1].workout_id, "old");
    }

    #[test]
    fn test_totals() {
        let logs = vec![workout_log("a", 0), workout_log("b", 1)];
        let totals = totals(&logs);

        assert_eq!(totals.workouts, 2);
        assert_eq!(totals.total_seconds, 3000);
        assert_eq!(totals.total_volume, 1960.0);
        assert_eq!(totals.total_sets, 4);
    }
}
