mod error;
mod routes;
mod server;
mod static_files;

use interval_trainer_core::{CoreError, TrainerConfig};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_TARGET: &str = "interval_trainer";

/// Filter used when `RUST_LOG` is unset or invalid
const DEFAULT_LOG_FILTER: &str = "info";

fn main() {
    // Tracing starts before the config is validated, so only the logging
    // switch is read here.
    let log_file = wants_log_file(&TrainerConfig::config_path())
        .then(interval_trainer_core::log_file_path);
    init_tracing(log_file.as_deref());

    let config = match TrainerConfig::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            info!(
                target: LOG_TARGET,
                "Created config template at {}; using defaults",
                path.display()
            );
            TrainerConfig::default()
        }
        Err(CoreError::ConfigParseError(parse_error)) => {
            error!(
                target: LOG_TARGET,
                "Config file {} has syntax errors: {}",
                TrainerConfig::config_path().display(),
                parse_error
            );
            std::process::exit(1);
        }
        Err(e) => {
            error!(target: LOG_TARGET, "{e}");
            std::process::exit(1);
        }
    };
    let config = config.with_env_overrides();
    info!(
        target: LOG_TARGET,
        "Binding {} with client bundle at {}",
        config.bind_address(),
        config.server.static_dir.display()
    );
    match &log_file {
        Some(path) => debug!(target: LOG_TARGET, "Writing logs to {}", path.display()),
        None => debug!(target: LOG_TARGET, "File logging disabled"),
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(target: LOG_TARGET, "Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    let shutdown = CancellationToken::new();
    let ctrlc_shutdown = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!(target: LOG_TARGET, "Received Ctrl+C, stopping server");
        ctrlc_shutdown.cancel();
    }) {
        warn!(target: LOG_TARGET, "Failed to set Ctrl+C handler: {}", e);
    }

    if let Err(e) = runtime.block_on(server::run(&config.server, shutdown)) {
        error!(target: LOG_TARGET, "{e}");
        std::process::exit(1);
    }

    info!(target: LOG_TARGET, "Shutdown complete");
}

/// Whether the config file at `path` turns on file logging.
///
/// A missing or malformed file means no.
fn wants_log_file(path: &Path) -> bool {
    std::fs::read_to_string(path)
        .map(|content| logging_enabled_in(&content))
        .unwrap_or(false)
}

/// Read `logging.enabled` from raw TOML, ignoring every other table.
fn logging_enabled_in(content: &str) -> bool {
    #[derive(serde::Deserialize, Default)]
    struct LoggingSwitch {
        #[serde(default)]
        enabled: bool,
    }
    #[derive(serde::Deserialize)]
    struct Document {
        #[serde(default)]
        logging: LoggingSwitch,
    }

    toml::from_str::<Document>(content).is_ok_and(|doc| doc.logging.enabled)
}

/// Console output, plus a plain-text copy at `log_file` when given
fn init_tracing(log_file: Option<&Path>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let file_layer = log_file.and_then(create_log_file).map(|file| {
        fmt::layer()
            .with_writer(Arc::new(file))
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();
}

fn create_log_file(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    // The subscriber is not up yet, so this goes to stderr
    File::create(path)
        .inspect_err(|e| eprintln!("Failed to create log file at {}: {e}", path.display()))
        .ok()
}
