use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::{is_project_subdir, Config};

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Invalid burst_size: {0}. Must be at least 1")]
    InvalidBurstSize(u32),

    #[error("Invalid max_tokens: {0}. Must be at least 1")]
    InvalidMaxTokens(u32),

    #[error("Invalid temperature: {0}. Must be between 0.0 and 2.0")]
    InvalidTemperature(f32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("handlers_dir cannot be empty")]
    EmptyHandlersDir,

    #[error("Invalid handlers_dir '{0}'. Must be a subdirectory of the project root without '.' or '..' components")]
    InvalidHandlersDir(String),

    #[error("handlers_dir '{0}' must lie inside one of writable_dirs")]
    HandlersDirNotWritable(String),

    #[error("Invalid writable dir '{0}'. Must be a subdirectory of the project root without '.' or '..' components")]
    InvalidWritableDir(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .omniroute/config.yaml (project config)
    /// 3. .omniroute/local.yaml (project local overrides, optional)
    /// 4. Environment variables (OMNIROUTE_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".omniroute/config.yaml"))
            .merge(Yaml::file(".omniroute/local.yaml"))
            .merge(Env::prefixed("OMNIROUTE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("OMNIROUTE_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.handlers_dir.trim().is_empty() {
            return Err(ConfigError::EmptyHandlersDir);
        }

        let handlers_dir = Path::new(&config.handlers_dir);
        if !is_project_subdir(handlers_dir) {
            return Err(ConfigError::InvalidHandlersDir(config.handlers_dir.clone()));
        }

        for dir in &config.writable_dirs {
            if !is_project_subdir(Path::new(dir)) {
                return Err(ConfigError::InvalidWritableDir(dir.clone()));
            }
        }

        if !config
            .writable_dirs
            .iter()
            .any(|dir| handlers_dir.starts_with(dir))
        {
            return Err(ConfigError::HandlersDirNotWritable(
                config.handlers_dir.clone(),
            ));
        }

        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        if !["json", "pretty"].contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if !["daily", "hourly", "never"].contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        if config.generation.max_tokens == 0 {
            return Err(ConfigError::InvalidMaxTokens(config.generation.max_tokens));
        }

        if !(0.0..=2.0).contains(&config.generation.temperature) {
            return Err(ConfigError::InvalidTemperature(
                config.generation.temperature,
            ));
        }

        if config.generation.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "generation.base_url cannot be empty".to_string(),
            ));
        }

        if config.rate_limit.requests_per_second <= 0.0 {
            return Err(ConfigError::InvalidRateLimit(
                config.rate_limit.requests_per_second,
            ));
        }

        if config.rate_limit.burst_size == 0 {
            return Err(ConfigError::InvalidBurstSize(config.rate_limit.burst_size));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        if config.code_exec.timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "code_exec.timeout_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
