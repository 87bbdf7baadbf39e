//! Data layer consumed and fed by guided sessions.
//!
//! [`TrainingStore`] is the seam between the session and wherever workouts,
//! records and logs live. [`FileStore`] keeps them under a data directory:
//!
//! ```text
//! <data_dir>/
//!   workouts/<id>.toml        user workout templates
//!   wal/state.json            best and last-used weights
//!   wal/workout_logs.wal      finished workouts (JSONL)
//!   workout_logs.csv          rolled-up archive
//! ```

use crate::catalog::Catalog;
use crate::wal::{JsonlSink, WorkoutLogSink};
use crate::{Error, PersonalRecord, Result, TrainingState, WorkoutLog, WorkoutTemplate};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub trait TrainingStore: Send {
    fn load_template(&self, workout_id: &str) -> Result<WorkoutTemplate>;

    /// Best recorded weight per exercise; exercises without a record are absent
    fn best_weights(&self, exercise_ids: &[&str]) -> Result<HashMap<String, f64>>;

    /// Most recently used weight per exercise; exercises never logged are absent
    fn last_weights(&self, exercise_ids: &[&str]) -> Result<HashMap<String, f64>>;

    fn upsert_personal_record(&mut self, record: &PersonalRecord) -> Result<()>;

    fn insert_workout_log(&mut self, log: &WorkoutLog) -> Result<()>;
}

/// Well-known file locations under a data directory
#[derive(Clone, Debug)]
pub struct DataPaths {
    pub data_dir: PathBuf,
    pub workouts_dir: PathBuf,
    pub wal_dir: PathBuf,
    pub state_path: PathBuf,
    pub wal_path: PathBuf,
    pub csv_path: PathBuf,
}

impl DataPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let wal_dir = data_dir.join("wal");
        Self {
            workouts_dir: data_dir.join("workouts"),
            state_path: wal_dir.join("state.json"),
            wal_path: wal_dir.join("workout_logs.wal"),
            csv_path: data_dir.join("workout_logs.csv"),
            wal_dir,
            data_dir,
        }
    }
}

/// File-backed training store
#[derive(Clone, Debug)]
pub struct FileStore {
    paths: DataPaths,
}

impl FileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            paths: DataPaths::new(data_dir.as_ref()),
        }
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn catalog(&self) -> Result<Catalog> {
        Catalog::with_user_templates(&self.paths.workouts_dir)
    }

    pub fn training_state(&self) -> Result<TrainingState> {
        TrainingState::load(&self.paths.state_path)
    }
}

fn pick(table: &HashMap<String, f64>, exercise_ids: &[&str]) -> HashMap<String, f64> {
    exercise_ids
        .iter()
        .filter_map(|id| table.get(*id).map(|w| (id.to_string(), *w)))
        .collect()
}

impl TrainingStore for FileStore {
    fn load_template(&self, workout_id: &str) -> Result<WorkoutTemplate> {
        self.catalog()?
            .get(workout_id)
            .cloned()
            .ok_or_else(|| Error::WorkoutNotFound(workout_id.to_string()))
    }

    fn best_weights(&self, exercise_ids: &[&str]) -> Result<HashMap<String, f64>> {
        let state = self.training_state()?;
        let best: HashMap<String, f64> = state
            .personal_records
            .values()
            .map(|r| (r.exercise_id.clone(), r.weight))
            .collect();
        Ok(pick(&best, exercise_ids))
    }

    fn last_weights(&self, exercise_ids: &[&str]) -> Result<HashMap<String, f64>> {
        let state = self.training_state()?;
        Ok(pick(&state.last_weights, exercise_ids))
    }

    fn upsert_personal_record(&mut self, record: &PersonalRecord) -> Result<()> {
        let mut stored = false;
        TrainingState::update(&self.paths.state_path, |state| {
            stored = state.upsert_record(record.clone());
            Ok(())
        })?;
        if stored {
            tracing::info!(
                "Stored personal record for {}: {}",
                record.exercise_id,
                record.weight
            );
        } else {
            tracing::info!(
                "Kept heavier stored record for {} over {}",
                record.exercise_id,
                record.weight
            );
        }
        Ok(())
    }

    fn insert_workout_log(&mut self, log: &WorkoutLog) -> Result<()> {
        JsonlSink::new(&self.paths.wal_path).append(log)?;
        TrainingState::update(&self.paths.state_path, |state| {
            state.apply_workout(log);
            Ok(())
        })?;
        tracing::info!("Stored workout log {} for {}", log.id, log.workout_id);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::testing::workout_log;
    use chrono::NaiveDate;

    #[test]
    fn test_load_builtin_template() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path());

        let template = store.load_template("pull_day").unwrap();
        assert_eq!(template.name, "Pull Day");
    }

    #[test]
    fn test_unknown_workout() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path());

        let result = store.load_template("arm_day");
        assert!(matches!(result, Err(Error::WorkoutNotFound(id)) if id == "arm_day"));
    }

    #[test]
    fn test_records_and_last_weights_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());

        store
            .upsert_personal_record(&PersonalRecord {
                exercise_id: "bench_press".into(),
                weight: 90.0,
                reps: 3,
                achieved_on: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            })
            .unwrap();
        store.insert_workout_log(&workout_log("push_day", 0)).unwrap();

        let best = store.best_weights(&["bench_press", "overhead_press"]).unwrap();
        assert_eq!(best.len(), 1);
        assert_eq!(best["bench_press"], 90.0);

        let last = store.last_weights(&["bench_press"]).unwrap();
        assert_eq!(last["bench_press"], 62.5);

        assert!(store.paths().wal_path.exists());
        assert!(store.paths().state_path.exists());
    }

    #[test]
    fn test_out_of_order_record_write_keeps_best() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());
        let record = |weight: f64| PersonalRecord {
            exercise_id: "deadlift".into(),
            weight,
            reps: 1,
            achieved_on: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        };

        // Two processes finishing in the wrong order
        store.upsert_personal_record(&record(180.0)).unwrap();
        store.upsert_personal_record(&record(170.0)).unwrap();

        let best = store.best_weights(&["deadlift"]).unwrap();
        assert_eq!(best["deadlift"], 180.0);
    }
}
