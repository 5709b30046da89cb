//! Configuration loading
//!
//! Resolution priority, highest first:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default base URL of the pretrained damage-classification model
///
/// The gateway appends `model.json` / `metadata.json` to this base.
pub const DEFAULT_MODEL_URL: &str = "https://teachablemachine.withgoogle.com/models/5O2NVBVDW/";

/// TOML configuration file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Base URL of the classification model
    pub model_url: String,
    /// SQLite database path; defaults to `<data dir>/kashif/kashif.db`
    pub database_path: Option<PathBuf>,
    /// HTTP bind address
    pub bind_address: String,
    /// HTTP port
    pub port: u16,
    /// tracing env-filter directive (e.g. "kashif_ir=debug")
    pub log_filter: Option<String>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            model_url: DEFAULT_MODEL_URL.to_string(),
            database_path: None,
            bind_address: "127.0.0.1".to_string(),
            port: 5730,
            log_filter: None,
        }
    }
}

impl TomlConfig {
    /// Database path, falling back to the OS-dependent default
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}

/// Load configuration from a TOML file
///
/// A missing file yields the compiled defaults; a malformed file is a
/// configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        tracing::debug!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Default configuration file path for the platform
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("kashif").join("kashif.toml"))
        .unwrap_or_else(|| PathBuf::from("kashif.toml"))
}

/// OS-dependent default database path
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("kashif").join("kashif.db"))
        .unwrap_or_else(|| PathBuf::from("./kashif.db"))
}
