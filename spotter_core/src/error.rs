//! Error types for the spotter_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for spotter_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// State management error
    #[error("State error: {0}")]
    State(String),

    /// No template exists for the requested workout
    #[error("Workout not found: {0}")]
    WorkoutNotFound(String),

    /// A workout template that cannot be run as-is
    #[error("Invalid workout: {0}")]
    InvalidWorkout(String),

    /// A session action was called in a state that does not accept it
    #[error("Cannot {action} while session is {status}")]
    InvalidTransition {
        action: &'static str,
        status: String,
    },

    /// Calorie estimation input error
    #[error("Calorie estimation error: {0}")]
    Calories(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
