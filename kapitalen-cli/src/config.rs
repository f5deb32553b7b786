//! `kapitalen.toml` settings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kapitalen_core::DbConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "kapitalen.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxConfig {
    pub year: i32,
    /// Trinnskatt schedule CSV replacing the built-in brackets.
    pub schedule: Option<PathBuf>,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            year: 2026,
            schedule: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DbConfig,
    pub logging: LoggingConfig,
    pub tax: TaxConfig,
}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Reads `path`, or [`DEFAULT_CONFIG_FILE`] when `None`.
    ///
    /// A missing default file yields the defaults; a missing file that was
    /// asked for explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !explicit && !path.exists() {
            debug!(path = %path.display(), "no configuration file; using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read configuration '{}'", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("in configuration '{}'", path.display()))?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}
