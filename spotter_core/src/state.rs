//! Training state persistence with file locking.
//!
//! This module handles saving and loading the best-weight and last-weight
//! tables with proper file locking to prevent concurrent access issues.

use crate::{Error, PersonalRecord, Result, TrainingState, WorkoutLog};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl TrainingState {
    /// Load training state from a file with shared locking
    ///
    /// Returns default state if file doesn't exist.
    /// If file is corrupted, logs a warning and returns default state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No state file found, using default state");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        // Acquire shared lock for reading
        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock state file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read state file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<TrainingState>(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded training state from {:?}", path);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save training state to a file with exclusive locking
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            Error::State(format!("state path {:?} has no parent directory", path))
        })?;
        std::fs::create_dir_all(parent)?;

        // Create unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(parent)?;

        // Acquire exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace old state file
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved training state to {:?}", path);
        Ok(())
    }

    /// Load state, modify it, and save it back atomically
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut TrainingState) -> Result<()>,
    {
        let mut state = Self::load(path)?;
        f(&mut state)?;
        state.save(path)?;
        Ok(state)
    }

    /// Best recorded weight for an exercise
    pub fn best_weight(&self, exercise_id: &str) -> Option<f64> {
        self.personal_records.get(exercise_id).map(|r| r.weight)
    }

    /// Store the record unless a heavier one is already on file
    ///
    /// Returns false when the stored record was kept.
    pub fn upsert_record(&mut self, record: PersonalRecord) -> bool {
        match self.personal_records.get(&record.exercise_id) {
            Some(existing) if existing.weight > record.weight => false,
            _ => {
                self.personal_records
                    .insert(record.exercise_id.clone(), record);
                true
            }
        }
    }

    /// Remember the weight of the latest set of each exercise in the log
    pub fn apply_workout(&mut self, log: &WorkoutLog) {
        for set in &log.sets {
            self.last_weights.insert(set.exercise_id.clone(), set.weight);
        }
    }
}
