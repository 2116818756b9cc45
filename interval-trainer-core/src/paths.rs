//! Path constants for configuration, data and log files.

use std::path::PathBuf;

/// The name of the configuration directory under ~/.config/
pub const CONFIG_DIR_NAME: &str = "interval-trainer";

/// The name of the main configuration file
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// The name of the log file written when file logging is enabled
pub const LOG_FILE_NAME: &str = "interval-trainer.log";

/// Get the configuration directory path (~/.config/interval-trainer/)
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(CONFIG_DIR_NAME)
}

/// Get the config file path (~/.config/interval-trainer/config.toml)
#[must_use]
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Get the default data directory for saved workouts (`~/.local/share/interval-trainer/`)
///
/// Falls back to the config directory on platforms without a data dir.
#[must_use]
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir().map_or_else(config_dir, |dir| dir.join(CONFIG_DIR_NAME))
}

/// Get the log file path (`~/.cache/interval-trainer/interval-trainer.log`)
#[must_use]
pub fn log_file_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(config_dir)
        .join(CONFIG_DIR_NAME)
        .join(LOG_FILE_NAME)
}
