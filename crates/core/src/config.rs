//! Configuration file management
//!
//! The configuration lives in `config.toml` inside the configuration
//! directory, next to the persisted trust store.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::profile::Profile;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "DAVSYNC_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";
const TRUST_STORE_FILE: &str = "truststore.toml";
const CONFIG_VERSION: u32 = 1;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Schema version of the file
    #[serde(default = "default_version")]
    pub version: u32,

    /// Configured remotes
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            profiles: Vec::new(),
        }
    }
}

/// Loads and saves the configuration file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Use `DAVSYNC_CONFIG_DIR`, falling back to the platform config directory
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()
                .ok_or_else(|| {
                    Error::ConfigInvalid("cannot determine configuration directory".to_string())
                })?
                .join("davsync"),
        };

        Ok(Self { config_dir })
    }

    /// Use an explicit directory
    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Where the process-wide trust store is persisted
    pub fn trust_store_path(&self) -> PathBuf {
        self.config_dir.join(TRUST_STORE_FILE)
    }

    /// Load the configuration; a missing file yields the default
    pub fn load(&self) -> Result<Config> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        if config.version > CONFIG_VERSION {
            return Err(Error::ConfigInvalid(format!(
                "unsupported config version {} in {}",
                config.version,
                path.display()
            )));
        }

        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        let content = toml::to_string_pretty(config)?;
        std::fs::write(self.config_path(), content)?;
        tracing::debug!(path = %self.config_path().display(), "Saved configuration");
        Ok(())
    }
}
