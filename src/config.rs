use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::campus::Campus;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Service endpoints and credentials: one credentialed identity per campus
/// plus the unauthenticated feed host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub sea: CampusConfig,
    pub bot: CampusConfig,
    pub tac: CampusConfig,
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CampusConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedConfig {
    pub base_url: String,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    pub fn load_or_create() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trumba-client")
            .join("config.toml")
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .expect("Failed to serialize config");
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    pub fn campus(&self, campus: Campus) -> &CampusConfig {
        match campus {
            Campus::Sea => &self.sea,
            Campus::Bot => &self.bot,
            Campus::Tac => &self.tac,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let campus = || CampusConfig {
            base_url: "https://www.trumba.com".to_string(),
            username: String::new(),
            password: String::new(),
        };

        Self {
            sea: campus(),
            bot: campus(),
            tac: campus(),
            feed: FeedConfig {
                base_url: "https://www.trumba.com".to_string(),
            },
        }
    }
}
