//! Service configuration

use crate::rate_limit::RateLimitConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use retention::RiskThresholds;
use serde::Deserialize;
use std::path::Path;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/churn.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    /// Tier cut-offs shared by the classifier and `/api/v1/model`
    pub risk: RiskThresholds,
    pub logging: LoggingConfig,
    pub rate_limit: RateLimitConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind
    pub addr: String,
    /// Apply per-IP rate limiting to scoring routes
    pub rate_limit_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            rate_limit_enabled: true,
        }
    }
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path of the serialized bundle
    pub bundle_path: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            bundle_path: "models/churn_bundle.json".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a file (optional) overlaid with `CHURN__*` variables
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: AppConfig = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix("CHURN").separator("__"))
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        self.risk.validate().context("Invalid risk thresholds")?;
        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            other => anyhow::bail!("Unknown log format {other:?}, expected json or pretty"),
        }
        if self.rate_limit.per_second == 0 || self.rate_limit.burst_size == 0 {
            anyhow::bail!("Rate limit per_second and burst_size must be positive");
        }
        Ok(())
    }
}
