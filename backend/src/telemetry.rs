//! Tracing initialisation for the rowfold binary.
//!
//! Call [`init_tracing`] once at program start. Logs go to stderr, or are
//! appended to `logging.log_file` when one is configured. `RUST_LOG`
//! overrides the configured level.

use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;
use crate::error::{ConfigError, ConfigResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Parse a level name (`trace` … `error`).
pub fn parse_level(name: &str) -> ConfigResult<Level> {
    name.trim().parse::<Level>().map_err(|_| {
        ConfigError::invalid("logging.log_level", format!("unknown level '{}'", name))
    })
}

/// Initialise the global tracing subscriber.
///
/// Only the first call takes effect.
pub fn init_tracing(logging: &LoggingConfig) -> ConfigResult<()> {
    let level = parse_level(&logging.log_level)?;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let layer: BoxedLayer = match &logging.log_file {
        Some(path) => {
            let io_err = |source| ConfigError::Io {
                path: path.clone(),
                source,
            };
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(io_err)?;
            let base = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            if logging.json {
                base.json().boxed()
            } else {
                base.boxed()
            }
        }
        None => {
            let base = fmt::layer().with_target(false).with_writer(std::io::stderr);
            if logging.json {
                base.json().boxed()
            } else {
                base.boxed()
            }
        }
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .try_init()
        .ok();
    Ok(())
}
