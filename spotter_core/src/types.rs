//! Core domain types for the Spotter guided workout system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workout templates as stored, and the per-user definitions built from them
//! - Set logs and personal-record events produced during a session
//! - Summaries and persisted workout logs
//! - The persistent training state (best weights, last-used weights)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// XP awarded for each new personal record
pub const PR_XP: u32 = 50;

/// XP awarded for finishing a workout, regardless of content
pub const WORKOUT_BASE_XP: u32 = 100;

/// XP awarded per completed set
pub const SET_XP: u32 = 5;

// ============================================================================
// Templates (stored form)
// ============================================================================

/// One movement of a stored workout template
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseTemplate {
    pub id: String,
    pub name: String,
    pub muscle_group: String,
    #[serde(default)]
    pub equipment: Option<String>,
    pub sets: u32,
    pub target_reps: u32,
    /// Seconds of rest after each set
    pub rest_time: u32,
}

/// A stored workout: the ordered exercises and their prescriptions
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutTemplate {
    pub id: String,
    pub name: String,
    pub exercises: Vec<ExerciseTemplate>,
}

// ============================================================================
// Session input
// ============================================================================

/// One exercise as seen by a guided session, with the user's history folded in
#[derive(Clone, Debug, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub muscle_group: String,
    pub equipment: Option<String>,
    pub sets: u32,
    pub target_reps: u32,
    /// Last weight this user logged for the exercise (0 if none)
    pub suggested_weight: f64,
    /// Best weight this user ever logged for the exercise
    pub current_pr: Option<f64>,
    pub rest_time: u32,
}

/// The immutable plan a session runs through
#[derive(Clone, Debug, PartialEq)]
pub struct WorkoutDefinition {
    pub id: String,
    pub name: String,
    pub exercises: Vec<Exercise>,
}

impl WorkoutDefinition {
    /// Sum of prescribed sets across all exercises
    pub fn total_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.sets).sum()
    }
}

// ============================================================================
// Session output
// ============================================================================

/// What the user reports when finishing a set
#[derive(Clone, Debug, PartialEq)]
pub struct SetInput {
    pub weight: f64,
    pub reps: u32,
    pub rpe: Option<u8>,
}

/// A single completed set. Append-only within a session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetLog {
    pub exercise_id: String,
    /// 1-based, relative to the exercise
    pub set_number: u32,
    pub weight: f64,
    pub reps: u32,
    #[serde(default)]
    pub rpe: Option<u8>,
    pub is_new_pr: bool,
    pub completed_at: DateTime<Utc>,
}

impl SetLog {
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

/// A personal record detected during a session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewPr {
    pub exercise_id: String,
    pub exercise_name: String,
    pub new_record: f64,
    pub previous_record: f64,
    pub improvement: f64,
    pub xp_earned: u32,
}

/// Terminal artifact of a guided session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSummary {
    pub workout_id: String,
    pub workout_name: String,
    /// Elapsed seconds, excluding paused time
    pub duration: u64,
    pub exercises_completed: u32,
    pub total_exercises: u32,
    pub sets_completed: u32,
    pub total_sets: u32,
    pub total_volume: f64,
    pub total_reps: u32,
    pub prs_achieved: Vec<NewPr>,
    pub xp_earned: u32,
    pub completed_at: DateTime<Utc>,
}

// ============================================================================
// Persisted records
// ============================================================================

/// Best-weight record for one exercise (the PR upsert payload)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersonalRecord {
    pub exercise_id: String,
    pub weight: f64,
    pub reps: u32,
    pub achieved_on: NaiveDate,
}

/// A finished workout as written to the workout log
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutLog {
    pub id: Uuid,
    pub workout_id: String,
    pub performed_on: NaiveDate,
    pub completed_at: DateTime<Utc>,
    pub duration_seconds: u64,
    pub total_volume: f64,
    pub sets_completed: u32,
    pub exercises_completed: u32,
    /// Individual sets; not carried into the CSV archive
    #[serde(default)]
    pub sets: Vec<SetLog>,
}

impl WorkoutLog {
    /// Build the log record for a finished session
    pub fn from_summary(summary: &WorkoutSummary, sets: &[SetLog]) -> Self {
        Self {
            id: Uuid::new_v4(),
            workout_id: summary.workout_id.clone(),
            performed_on: summary.completed_at.date_naive(),
            completed_at: summary.completed_at,
            duration_seconds: summary.duration,
            total_volume: summary.total_volume,
            sets_completed: summary.sets_completed,
            exercises_completed: summary.exercises_completed,
            sets: sets.to_vec(),
        }
    }
}

/// User's persistent training state across sessions
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct TrainingState {
    #[serde(default)]
    pub personal_records: HashMap<String, PersonalRecord>,
    /// Weight of the most recent logged set per exercise
    #[serde(default)]
    pub last_weights: HashMap<String, f64>,
}
