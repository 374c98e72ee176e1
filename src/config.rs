use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub fetcher: FetcherConfig,
    pub runner: RunnerConfig,
    pub store: StoreConfig,
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Attempts per item before giving up on finding a price element.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub retry_delay_ms: u64,
    /// Per-request timeout in seconds.
    pub request_timeout: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Maximum number of items fetched at once.
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Item sheet (CSV with ITEM NAME / ITEM LINK / WEBSITE / DESIRED PRICE).
    pub items_file: String,
    /// JSON price history file, rewritten after every mutation.
    pub history_file: String,
    /// SQLite database holding the per-site selector table.
    pub selector_db: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub pushbullet: PushbulletConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushbulletConfig {
    pub access_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default"))
            // Add environment-specific config
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix "PRICEWATCH_"
            .add_source(Environment::with_prefix("PRICEWATCH").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        // The token is a secret, so allow the plain env var too
        if config.notifications.pushbullet.access_token.is_none() {
            config.notifications.pushbullet.access_token = env::var("PUSHBULLET_TOKEN").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetcher.max_attempts == 0 {
            return Err(ConfigError::Message(
                "Fetcher max_attempts must be greater than 0".into(),
            ));
        }

        if self.fetcher.request_timeout == 0 || self.fetcher.request_timeout > 300 {
            return Err(ConfigError::Message(
                "Fetcher request_timeout must be between 1 and 300 seconds".into(),
            ));
        }

        if self.runner.concurrency == 0 {
            return Err(ConfigError::Message(
                "Runner concurrency must be greater than 0".into(),
            ));
        }

        if self.store.items_file.is_empty() {
            return Err(ConfigError::Message("Store items_file must be set".into()));
        }

        if self.store.history_file.is_empty() {
            return Err(ConfigError::Message("Store history_file must be set".into()));
        }

        if self.store.selector_db.is_empty() {
            return Err(ConfigError::Message("Store selector_db must be set".into()));
        }

        Ok(())
    }
}
