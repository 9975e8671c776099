//! # Configuration Management Module
//!
//! TOML configuration for the clan engine and its binary.
//!
//! - [`ClanConfig`] - clan name and identity limits
//! - [`StorageConfig`] - where the registry snapshot lives and when it is written
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Configuration File Format
//!
//! ```toml
//! [clans]
//! max_name_length = 32
//! max_identity_length = 64
//! allow_spaces_in_names = false
//!
//! [storage]
//! data_dir = "./data"
//! file_name = "clans.json"
//! persist = "every_mutation"   # or "manual"
//!
//! [logging]
//! level = "info"
//! file = "clanhall.log"
//! ```
//!
//! ## Persistence modes
//!
//! `every_mutation` writes the store after each successful change; a crash loses
//! nothing that was acknowledged. `manual` only writes on an explicit flush, so a
//! crash loses every change since the last flush.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::validation::ClanNameRules;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub clans: ClanConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClanConfig {
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    #[serde(default = "default_max_identity_length")]
    pub max_identity_length: usize,
    /// Permit interior spaces in clan names. Chat commands split on whitespace, so
    /// hosts that parse commands with [`crate::commands`] should leave this off.
    #[serde(default)]
    pub allow_spaces_in_names: bool,
}

fn default_max_name_length() -> usize {
    32
}

fn default_max_identity_length() -> usize {
    64
}

impl Default for ClanConfig {
    fn default() -> Self {
        Self {
            max_name_length: default_max_name_length(),
            max_identity_length: default_max_identity_length(),
            allow_spaces_in_names: false,
        }
    }
}

impl ClanConfig {
    pub fn name_rules(&self) -> ClanNameRules {
        ClanNameRules {
            max_length: self.max_name_length,
            allow_spaces: self.allow_spaces_in_names,
        }
    }
}

/// When the registry is written back to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PersistMode {
    /// Save after every successful mutation.
    #[default]
    EveryMutation,
    /// Save only on an explicit flush.
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    #[serde(default = "default_file_name")]
    pub file_name: String,
    #[serde(default)]
    pub persist: PersistMode,
}

fn default_file_name() -> String {
    "clans.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            file_name: default_file_name(),
            persist: PersistMode::EveryMutation,
        }
    }
}

impl StorageConfig {
    /// Full path of the registry snapshot file.
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.file_name)
    }
}

/// A `[logging]` section that omits `file` logs to the console only; a config with no
/// `[logging]` section at all gets the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: Some("clanhall.log".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        Self::from_toml(&content).map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.clans.max_name_length == 0 {
            return Err(anyhow!("clans.max_name_length must be at least 1"));
        }
        if config.storage.file_name.trim().is_empty() {
            return Err(anyhow!("storage.file_name must not be empty"));
        }
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let content = toml::to_string_pretty(&Config::default())
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}
