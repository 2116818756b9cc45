use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}. A template has been created - edit it if needed and restart.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Workout errors
    #[error("No valid workout data found: {reason}")]
    InvalidWorkout { reason: String },

    #[error("Interval {index} does not exist")]
    IntervalOutOfRange { index: usize },

    #[error("Seconds must be between 0 and 59, got {value}")]
    SecondsOutOfRange { value: u32 },

    #[error("A workout needs at least one interval")]
    LastInterval,

    #[error("Workout name must not be empty")]
    MissingName,

    // Storage errors
    #[error("Storage key {key} could not be accessed: {source}")]
    Storage {
        key: String,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
