// CLASSIFICATION: COMMUNITY
// Filename: config.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Settings for the thread dump module.
//!
//! Defaults match the stock module; a TOML file may override any field and
//! `LKDC_RECORD_BUDGET` overrides the per-record byte budget last.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

pub const RECORD_BUDGET_ENV: &str = "LKDC_RECORD_BUDGET";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShowallConfig {
    /// Directory created under the debugfs root.
    pub dir_name: String,
    /// File created inside `dir_name`.
    pub file_name: String,
    pub mode: u16,
    /// Bytes reserved per thread before formatting starts.
    pub per_record_budget: usize,
}

impl Default for ShowallConfig {
    fn default() -> Self {
        ShowallConfig {
            dir_name: "dbgfs_showall_threads".into(),
            file_name: "dbgfs_showall_threads".into(),
            mode: 0o644,
            per_record_budget: 128,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid LKDC_RECORD_BUDGET value {0:?}")]
    Env(String),
}

impl ShowallConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply environment overrides on top of this config.
    pub fn with_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(v) = std::env::var(RECORD_BUDGET_ENV) {
            self.per_record_budget = v.trim().parse().map_err(|_| ConfigError::Env(v))?;
        }
        Ok(self)
    }
}

/// Load a TOML configuration file, then apply environment overrides.
pub fn load_config(path: impl AsRef<Path>) -> Result<ShowallConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    ShowallConfig::from_toml_str(&text)?.with_env()
}
