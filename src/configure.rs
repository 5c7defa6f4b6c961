use std::time::Duration;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::client::ClientConfig;
use crate::verification::{CodeTracker, PollerConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub banking_base_url: String,
    pub user_base_url: String,
    pub request_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub tick_interval_ms: u64,
    pub otp_ttl_ms: i64,
    pub excluded_description: String,
    pub token_file: String,
    pub log_level: String,
    pub log_to_file: bool,
    pub log_file: String,
}

impl AppConfig {
    pub fn banking_client(&self) -> ClientConfig {
        ClientConfig::new(self.banking_base_url.clone())
            .with_timeout(Duration::from_millis(self.request_timeout_ms))
    }

    pub fn user_client(&self) -> ClientConfig {
        ClientConfig::new(self.user_base_url.clone())
            .with_timeout(Duration::from_millis(self.request_timeout_ms))
    }

    pub fn poller(&self) -> PollerConfig {
        PollerConfig {
            poll_interval_ms: self.poll_interval_ms,
            tick_interval_ms: self.tick_interval_ms,
            excluded_description: self.excluded_description.clone(),
        }
    }

    pub fn code_tracker(&self) -> CodeTracker {
        CodeTracker::new(self.otp_ttl_ms)
    }
}

fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Config::builder()
        // Set defaults
        .set_default("banking_base_url", "http://127.0.0.1:8082")?
        .set_default("user_base_url", "http://127.0.0.1:8081")?
        .set_default("request_timeout_ms", 20_000)?
        .set_default("poll_interval_ms", 2_000)?
        .set_default("tick_interval_ms", 1_000)?
        .set_default("otp_ttl_ms", 300_000)?
        .set_default("excluded_description", "Promena valute")?
        .set_default("token_file", ".banking/token")?
        .set_default("log_level", "info")?
        .set_default("log_to_file", false)?
        .set_default("log_file", "log/banking_client.log")
}

pub fn load_config() -> Result<AppConfig, ConfigError> {
    let s = builder()?
        // Add configuration from a file, if there is one
        .add_source(File::with_name("config/config").required(false))
        // Add configuration from environment variables (BANKING_POLL_INTERVAL_MS=...)
        .add_source(config::Environment::with_prefix("BANKING"))
        .build()?;

    s.try_deserialize()
}

/// Defaults only, no file and no environment
pub fn default_config() -> Result<AppConfig, ConfigError> {
    builder()?.build()?.try_deserialize()
}
