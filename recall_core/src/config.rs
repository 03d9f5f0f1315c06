//! Configuration file support for recall.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/recall/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Card store file name, relative to `data_dir` unless absolute
    #[serde(default = "default_cards_file")]
    pub cards_file: PathBuf,

    /// Results store file name, relative to `data_dir` unless absolute
    #[serde(default = "default_results_file")]
    pub results_file: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cards_file: default_cards_file(),
            results_file: default_results_file(),
        }
    }
}

impl DataConfig {
    /// Resolved path of the card store
    pub fn cards_path(&self) -> PathBuf {
        self.data_dir.join(&self.cards_file)
    }

    /// Resolved path of the results store
    pub fn results_path(&self) -> PathBuf {
        self.data_dir.join(&self.results_file)
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("recall")
}

fn default_cards_file() -> PathBuf {
    PathBuf::from("base.json")
}

fn default_results_file() -> PathBuf {
    PathBuf::from("results.json")
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("recall").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.data.cards_file.as_os_str().is_empty() {
            return Err(Error::Config("data.cards_file must not be empty".into()));
        }
        if self.data.results_file.as_os_str().is_empty() {
            return Err(Error::Config("data.results_file must not be empty".into()));
        }
        if self.data.cards_path() == self.data.results_path() {
            return Err(Error::Config(
                "data.cards_file and data.results_file must differ".into(),
            ));
        }
        Ok(())
    }
}
