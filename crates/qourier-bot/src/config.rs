//! Application configuration loaded from environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// traQ connection configuration
    pub traq: TraqConfig,

    /// Configuration document storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Bot configuration
    #[serde(default)]
    pub bot: BotConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraqConfig {
    /// Bot access token
    pub access_token: String,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Poll interval for the message receiver
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// SQLite database URL for the config document
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Reseed the stored document from its default on startup
    #[serde(default)]
    pub reset: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default implementations
impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            reset: false,
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://q.trap.jp/api/v3".into()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_database_url() -> String {
    "sqlite://qourier.db".into()
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Tokens and UUIDs must stay strings even when they
                    // happen to look numeric.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
