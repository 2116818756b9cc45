use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `server.port`
pub const PORT_ENV_VAR: &str = "PORT";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the built web client
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    5000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("client/build")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

const fn default_tick_interval() -> u64 {
    100
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
        }
    }
}

impl PlayerConfig {
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Where saved workouts are kept; defaults to the platform data directory
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(crate::paths::data_dir)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to a file in the cache directory
    #[serde(default)]
    pub enabled: bool,
}

impl TrainerConfig {
    /// Get the configuration directory path (~/.config/interval-trainer/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/interval-trainer/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default path or create a template on first run
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template, or an
    /// error if the file cannot be read, parsed or validated.
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&Self::config_path())
    }

    /// Load config from `path` or create a template there
    ///
    /// # Errors
    ///
    /// See [`TrainerConfig::load_or_create`].
    pub fn load_or_create_at(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(path, CONFIG_TEMPLATE)?;

            return Err(CoreError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        Self::load_from(path)
    }

    /// Load and validate config from an existing file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate config text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or a value is out of range.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "server.host must not be empty".to_string(),
            });
        }
        if self.player.tick_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "player.tick_interval_ms must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Override the port with the value of `PORT`, if it holds a valid port.
    #[must_use]
    pub fn with_port_override(mut self, value: Option<&str>) -> Self {
        if let Some(port) = value.and_then(|v| v.trim().parse::<u16>().ok()) {
            self.server.port = port;
        }
        self
    }

    /// Apply environment overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        let port = std::env::var(PORT_ENV_VAR).ok();
        self.with_port_override(port.as_deref())
    }

    /// `host:port` for binding the server
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

const CONFIG_TEMPLATE: &str = r#"# Interval Trainer Configuration
# ~/.config/interval-trainer/config.toml

[server]
host = "0.0.0.0"
# Overridden by the PORT environment variable
port = 5000
# Directory holding the built web client (index.html and assets)
static_dir = "client/build"

[player]
# How often the countdown checks the clock
tick_interval_ms = 100

[storage]
# Where saved workouts are kept; defaults to the platform data directory
# data_dir = "/path/to/data"

[logging]
# Also write logs to ~/.cache/interval-trainer/interval-trainer.log
enabled = false
"#;
