//! Configuration file support.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Application configuration loaded from config file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Database file path
    pub db: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default config file location.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config file: {}", config_path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", config_path.display()))
    }

    /// Returns the path to the config file.
    ///
    /// Default: `~/.config/berea/config.toml`
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("berea")
            .join("config.toml")
    }

    /// Resolve the database path, with CLI argument taking precedence.
    ///
    /// Precedence order:
    /// 1. CLI `--db` argument
    /// 2. Config file `db` setting
    /// 3. `~/.local/share/berea/study.db` (platform data directory)
    pub fn db_path(&self, cli_db: Option<&PathBuf>) -> PathBuf {
        cli_db
            .cloned()
            .or_else(|| self.db.clone())
            .unwrap_or_else(|| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("berea")
                    .join("study.db")
            })
    }
}
