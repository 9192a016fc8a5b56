use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{ImeiError, Result};

pub const DEFAULT_API_URL: &str = "https://dash.imei.info/api/check/0/";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub batch: BatchConfig,
    pub database: DatabaseConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub api_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BatchConfig {
    /// Identifiers resolved at the same time; 1 means strictly sequential
    pub concurrency: usize,
    pub completion: CompletionStrategy,
}

/// Candidate order used when completing a 14-digit base
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionStrategy {
    /// Digits 0 through 9, first success wins
    #[default]
    Sweep,
    /// Luhn-computed digit first, then the remaining digits ascending
    LuhnFirst,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    pub default_format: String,
}

impl Config {
    /// Layer defaults, `config/default`, the optional user file and `IMEI__*` env vars
    pub fn load(path: Option<&str>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut builder = config::Config::builder()
            .set_default("service.api_url", DEFAULT_API_URL)
            .and_then(|b| b.set_default("service.timeout_secs", 30))
            .and_then(|b| b.set_default("batch.concurrency", 4))
            .and_then(|b| b.set_default("batch.completion", "sweep"))
            .and_then(|b| b.set_default("database.path", "imei_resolver.db"))
            .and_then(|b| b.set_default("export.default_format", "csv"))
            .map_err(config_error)?
            .add_source(config::File::with_name("config/default").required(false));

        if let Some(path) = path {
            if !Path::new(path).exists() {
                return Err(ImeiError::Config(format!("config file not found: {}", path)));
            }
            builder = builder.add_source(config::File::with_name(path));
        }

        let config: Config = builder
            .add_source(config::Environment::with_prefix("IMEI").separator("__"))
            .build()
            .map_err(config_error)?
            .try_deserialize()
            .map_err(config_error)?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.service.api_url.trim().is_empty() {
            return Err(ImeiError::Config("service.api_url must not be empty".into()));
        }
        if self.service.timeout_secs == 0 {
            return Err(ImeiError::Config("service.timeout_secs must be positive".into()));
        }
        if self.batch.concurrency == 0 {
            return Err(ImeiError::Config("batch.concurrency must be at least 1".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.service.timeout_secs)
    }
}

fn config_error(e: config::ConfigError) -> ImeiError {
    ImeiError::Config(e.to_string())
}
