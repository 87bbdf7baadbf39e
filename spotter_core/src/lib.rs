#![forbid(unsafe_code)]

//! Core domain model and business logic for the Spotter workout guide.
//!
//! This crate provides:
//! - Domain types (exercises, sets, records, summaries)
//! - The guided session state machine and its rest timer
//! - Notification and wake lock seams with desktop backends
//! - Persistence (templates, WAL, CSV, state)
//! - Cardio calorie estimates

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod wal;
pub mod csv_rollup;
pub mod state;
pub mod history;
pub mod store;
pub mod loader;
pub mod persist;
pub mod timer;
pub mod notify;
pub mod wake_lock;
pub mod platform;
pub mod session;
pub mod calories;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::build_default_catalog;
pub use config::Config;
pub use wal::{JsonlSink, WorkoutLogSink};
pub use history::load_recent_workouts;
pub use store::{FileStore, TrainingStore};
pub use loader::load_definition;
pub use persist::{BackgroundWriter, PersistRequest, RecordSink};
pub use timer::{CountdownTimer, TimerEvent};
pub use notify::Notifier;
pub use wake_lock::ScreenWakeLock;
pub use session::{GuidedSession, SessionEvent, SessionStatus, SettingsPatch};
pub use calories::{estimate_calories, Intensity};
