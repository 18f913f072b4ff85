//! Transform Registry - find transform configs by name
//!
//! Transforms are YAML files stored in one directory; the file stem is the
//! transform name (`transforms/sales-summary.yaml` → `sales-summary`).

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{TransformConfig, DEFAULT_TRANSFORMS_DIR};
use crate::error::{ConfigError, ConfigResult};

const EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Registry for locating transform configurations
#[derive(Debug, Clone)]
pub struct TransformRegistry {
    /// Directory where transform files are stored
    dir: PathBuf,
}

impl TransformRegistry {
    /// Create a registry over the default directory
    pub fn new() -> Self {
        Self::with_dir(DEFAULT_TRANSFORMS_DIR)
    }

    /// Create a registry with a custom directory
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of all transforms in the directory, sorted
    pub fn list(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(_) => return Vec::new(),
        };

        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| EXTENSIONS.contains(&e))
            })
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Path of the file holding transform `name`, if it exists
    pub fn find(&self, name: &str) -> ConfigResult<PathBuf> {
        if name.is_empty() || name.contains(|c: char| c == '/' || c == '\\') || name.starts_with('.') {
            return Err(ConfigError::invalid(
                "transform",
                format!("'{}' is not a valid transform name", name),
            ));
        }

        EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", name, ext)))
            .find(|path| path.is_file())
            .ok_or_else(|| ConfigError::TransformNotFound(name.to_string()))
    }

    /// Load and validate transform `name`
    pub fn load(&self, name: &str) -> ConfigResult<TransformConfig> {
        let path = self.find(name)?;
        TransformConfig::load(name, &path)
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}
