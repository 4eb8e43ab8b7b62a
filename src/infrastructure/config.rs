use crate::application::{StorageKeyGenerator, TimestampKeys, UniqueKeys};
use crate::constants::{APP_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_URL_TTL_SECS};
use crate::domain::DomainError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// TOML configuration for the notes client
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub urls: UrlConfig,
    #[serde(default)]
    pub keys: KeyConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct StorageConfig {
    /// Root of the local backend; empty means the platform data directory
    #[serde(default)]
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct UrlConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default)]
    pub signing_secret: String,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    #[default]
    Unique,
    Timestamp,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct KeyConfig {
    #[serde(default)]
    pub strategy: KeyStrategy,
}

fn default_ttl_secs() -> u64 {
    DEFAULT_URL_TTL_SECS
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            signing_secret: String::new(),
        }
    }
}

impl KeyConfig {
    pub fn generator(&self) -> Box<dyn StorageKeyGenerator> {
        match self.strategy {
            KeyStrategy::Unique => Box::new(UniqueKeys::new()),
            KeyStrategy::Timestamp => Box::new(TimestampKeys::new()),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse TOML config")?;

        Ok(config)
    }

    /// Load from `path` if given, else from the default location.
    /// A missing default file yields the default configuration.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => {
                debug!(?path, "Loading config");
                Self::load(path)
            }
            _ => {
                debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config to TOML")?;

        std::fs::write(path.as_ref(), toml_string)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Create default configuration file at path
    pub fn create_default(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    pub fn data_dir(&self) -> Result<PathBuf, DomainError> {
        if !self.storage.data_dir.is_empty() {
            return Ok(PathBuf::from(&self.storage.data_dir));
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or_else(|| DomainError::Config("Could not find data directory".to_string()))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}
