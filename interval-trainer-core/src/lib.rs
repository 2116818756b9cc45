pub mod builder;
pub mod config;
pub mod error;
pub mod paths;
pub mod playback;
pub mod player;
pub mod progress;
pub mod store;
pub mod time;
pub mod workout;

pub use builder::{TimeField, WorkoutDraft};
pub use config::{
    LoggingConfig, PlayerConfig, ServerConfig, StorageConfig, TrainerConfig, PORT_ENV_VAR,
};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
pub use error::{CoreError, Result};
pub use paths::{
    config_dir, config_path, data_dir, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME,
    LOG_FILE_NAME,
};
pub use playback::{transition, Phase, PlaybackEvent, PlaybackMachine, PlaybackState};
pub use player::{PlayerEvent, WorkoutPlayer, DEFAULT_TICK_INTERVAL};
pub use progress::{render, render_progress, CurrentActivity, ProgressView, Segment};
pub use store::{
    FileBackend, MemoryBackend, StorageBackend, WorkoutStore, MAX_SAVED_WORKOUTS, WORKOUTS_KEY,
};
pub use time::{format_clock, format_summary, DurationExt};
pub use workout::{
    total_duration, Interval, IntervalKind, NewWorkout, TimeSpec, Workout, WorkoutPlan,
    WorkoutSummary,
};
