//! CSV rollup functionality for archiving WAL workout logs.
//!
//! This module implements atomic WAL-to-CSV conversion with proper error handling
//! to prevent data loss. Individual sets are not carried into the CSV; the
//! archive keeps one row per workout.

use crate::{Result, WorkoutLog};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV archive
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CsvRow {
    pub id: String,
    pub workout_id: String,
    pub performed_on: String,
    pub completed_at: String,
    pub duration: u64,
    pub total_volume: f64,
    pub sets_completed: u32,
    pub exercises_completed: u32,
}

impl From<&WorkoutLog> for CsvRow {
    fn from(log: &WorkoutLog) -> Self {
        CsvRow {
            id: log.id.to_string(),
            workout_id: log.workout_id.clone(),
            performed_on: log.performed_on.to_string(),
            completed_at: log.completed_at.to_rfc3339(),
            duration: log.duration_seconds,
            total_volume: log.total_volume,
            sets_completed: log.sets_completed,
            exercises_completed: log.exercises_completed,
        }
    }
}

/// Roll up WAL workout logs into CSV and archive the WAL atomically
///
/// This function:
/// 1. Reads all workout logs from the WAL
/// 2. Appends them to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the WAL to .processed
/// 5. Returns the number of workouts processed
///
/// # Safety
/// - CSV is fsynced before WAL is renamed
/// - WAL is renamed (not deleted) to allow manual recovery if needed
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    let logs = crate::wal::read_workout_logs(wal_path)?;

    if logs.is_empty() {
        tracing::info!("No workout logs in WAL to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Only a fresh file gets a header row
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for log in &logs {
        writer.serialize(CsvRow::from(log))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} workout logs to CSV", logs.len());

    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;

    tracing::info!("Archived WAL to {:?}", processed_path);

    Ok(logs.len())
}

/// Clean up old processed WAL files
///
/// This removes all .wal.processed files in the given directory.
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed WAL: {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed WAL files", count);
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::testing::workout_log;
    use crate::wal::{JsonlSink, WorkoutLogSink};
    use std::fs::File;

    #[test]
    fn test_wal_to_csv_creates_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workout_logs.wal");
        let csv_path = temp_dir.path().join("workout_logs.csv");

        let mut sink = JsonlSink::new(&wal_path);
        for id in ["push_day", "pull_day", "leg_day"] {
            sink.append(&workout_log(id, 0)).unwrap();
        }

        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 3);

        assert!(csv_path.exists());
        assert!(!wal_path.exists());
        assert!(wal_path.with_extension("wal.processed").exists());
    }

    #[test]
    fn test_wal_to_csv_appends() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("workout_logs.wal");
        let csv_path = temp_dir.path().join("workout_logs.csv");

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&workout_log("push_day", 1)).unwrap();
        assert_eq!(wal_to_csv_and_archive(&wal_path, &csv_path).unwrap(), 1);

        let mut sink = JsonlSink::new(&wal_path);
        sink.append(&workout_log("pull_day", 0)).unwrap();
        assert_eq!(wal_to_csv_and_archive(&wal_path, &csv_path).unwrap(), 1);

        // Header written once, two data rows
        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let rows: Vec<CsvRow> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].workout_id, "pull_day");
        assert_eq!(rows[0].total_volume, 980.0);
    }

    #[test]
    fn test_empty_wal() {
        let temp_dir = tempfile::tempdir().unwrap();
        let wal_path = temp_dir.path().join("empty.wal");
        let csv_path = temp_dir.path().join("workout_logs.csv");

        File::create(&wal_path).unwrap();

        let count = wal_to_csv_and_archive(&wal_path, &csv_path).unwrap();
        assert_eq!(count, 0);
        assert!(wal_path.exists());
    }

    #[test]
    fn test_cleanup_processed_wals() {
        let temp_dir = tempfile::tempdir().unwrap();

        File::create(temp_dir.path().join("s1.wal.processed")).unwrap();
        File::create(temp_dir.path().join("s2.wal.processed")).unwrap();
        File::create(temp_dir.path().join("keep.wal")).unwrap();

        let count = cleanup_processed_wals(temp_dir.path()).unwrap();
        assert_eq!(count, 2);

        assert!(!temp_dir.path().join("s1.wal.processed").exists());
        assert!(!temp_dir.path().join("s2.wal.processed").exists());
        assert!(temp_dir.path().join("keep.wal").exists());
    }
}
