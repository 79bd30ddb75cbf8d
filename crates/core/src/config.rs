//! Application configuration.
//!
//! Values are layered: built-in defaults, then the optional
//! `~/.config/gridbag/config.json`, then `GRIDBAG_*` environment variables.

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::{game_data::DEFAULT_FETCH_DELAY, storage::FileStorage};

/// Directory under `~/.config` holding the config file.
pub const CONFIG_DIR: &str = "gridbag";
/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.json";

/// Runtime settings for the store and the terminal front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where the inventory file lives.
    pub storage_root: PathBuf,
    /// Number of grid columns rendered by the UI.
    pub grid_columns: u16,
    /// Number of grid rows rendered by the UI.
    pub grid_rows: u16,
    /// Delay before the simulated game-data fetch resolves.
    pub game_data_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_root: FileStorage::default_root(),
            grid_columns: 5,
            grid_rows: 5,
            game_data_delay_ms: DEFAULT_FETCH_DELAY.as_millis() as u64,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration using `path` as the (optional) file layer.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let defaults = serde_json::to_string(&AppConfig::default())
            .context("failed to serialize default config")?;
        let settings = Config::builder()
            .add_source(File::from_str(&defaults, FileFormat::Json))
            .add_source(File::from(path.clone()).format(FileFormat::Json).required(false))
            .add_source(Environment::with_prefix("GRIDBAG").try_parsing(true))
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid config in {}", path.display()))
    }

    /// Delay for the game-data loader.
    pub fn game_data_delay(&self) -> Duration {
        Duration::from_millis(self.game_data_delay_ms)
    }
}

/// Location of the config file under the user's config directory.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write a config file with default values if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &PathBuf) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(&AppConfig::default())
        .context("failed to serialize default config")?;
    fs::write(path, serialized).with_context(|| format!("failed to write {}", path.display()))
}
