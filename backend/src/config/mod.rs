//! Application and transform configuration.
//!
//! The application config names where transforms live, how to log and which
//! document store receives the results:
//!
//! ```yaml
//! logging:
//!   log_file: logs/rowfold.log
//!   log_level: info
//! transforms_dir: transforms
//! store:
//!   kind: sqlite
//!   path: store/rowfold.db
//!   database: sales
//! ```

pub mod transform;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

pub use transform::{AggregateOp, LeafField, TransformConfig, TransformFile};

/// Directory searched for `<name>.yaml` transform files.
pub const DEFAULT_TRANSFORMS_DIR: &str = "transforms";

fn default_transforms_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TRANSFORMS_DIR)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("store")
}

fn default_database() -> String {
    "sales".to_string()
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default = "default_transforms_dir")]
    pub transforms_dir: PathBuf,

    /// Document store target; results are only persisted when present.
    #[serde(default)]
    pub store: Option<StoreConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            transforms_dir: default_transforms_dir(),
            store: None,
        }
    }
}

/// Log destination and verbosity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Append logs to this file instead of stderr.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Default level when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit newline-delimited JSON instead of text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            log_level: default_log_level(),
            json: false,
        }
    }
}

/// Kind of document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// In-process only; nothing survives the run.
    Memory,
    /// One JSON file per document.
    Directory,
    /// SQLite database file.
    Sqlite,
}

/// Document store connection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub kind: StoreKind,

    /// Directory (for `directory`) or database file (for `sqlite`).
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Logical database name; documents are namespaced under it.
    #[serde(default = "default_database")]
    pub database: String,
}

impl AppConfig {
    /// Read the application config; an empty file yields the defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
