//! Application configuration management
//!
//! Configuration is read from the environment once at startup and handed to
//! [`AppState`](crate::state::AppState), which injects the pieces each
//! component needs. Nothing reads the environment after that point.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_DATABASE_MAX_CONNECTIONS, DEFAULT_JUDGE_CONNECT_TIMEOUT_SECONDS,
    DEFAULT_JUDGE_MAX_CONCURRENCY, DEFAULT_JUDGE_QUEUE_TIMEOUT_SECONDS,
    DEFAULT_JUDGE_TIMEOUT_SECONDS, DEFAULT_JUDGE_URL,
    DEFAULT_LOG_FILTER, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
    DEFAULT_STALE_SUBMISSION_SECONDS, DEFAULT_STALE_SWEEP_INTERVAL_SECONDS,
};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub judge: JudgeConfig,
    pub recovery: RecoveryConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    pub log_format: LogFormat,
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidValue("LOG_FORMAT".to_string())),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// JWT verification configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
}

/// External judge engine configuration
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Endpoint receiving the grading POST
    pub url: String,
    /// Deadline covering the whole call, body included
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Upper bound on concurrent outbound judge calls
    pub max_concurrency: usize,
    /// Longest a submission may wait for a free judge slot
    pub queue_timeout: Duration,
}

/// Stranded-submission recovery configuration
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    pub stale_after: Duration,
    pub sweep_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            judge: JudgeConfig::from_env()?,
            recovery: RecoveryConfig::from_env()?,
        };
        config.recovery.validate_against(&config.judge)?;
        Ok(config)
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            port: parse_var("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse()?,
        })
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL".to_string()))?,
            max_connections: parse_var(
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_DATABASE_MAX_CONNECTIONS,
            )?,
        })
    }
}

impl JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret: env::var("JWT_SECRET")
                .map_err(|_| ConfigError::Missing("JWT_SECRET".to_string()))?,
        })
    }
}

impl JudgeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs: u64 = parse_var("JUDGE_TIMEOUT_SECONDS", DEFAULT_JUDGE_TIMEOUT_SECONDS)?;
        let connect_secs: u64 = parse_var(
            "JUDGE_CONNECT_TIMEOUT_SECONDS",
            DEFAULT_JUDGE_CONNECT_TIMEOUT_SECONDS,
        )?;
        let max_concurrency: usize =
            parse_var("JUDGE_MAX_CONCURRENCY", DEFAULT_JUDGE_MAX_CONCURRENCY)?;
        let queue_secs: u64 = parse_var(
            "JUDGE_QUEUE_TIMEOUT_SECONDS",
            DEFAULT_JUDGE_QUEUE_TIMEOUT_SECONDS,
        )?;

        let config = Self {
            url: env::var("JUDGE_URL").unwrap_or_else(|_| DEFAULT_JUDGE_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_secs),
            max_concurrency,
            queue_timeout: Duration::from_secs(queue_secs),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make grading impossible
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::InvalidValue("JUDGE_URL".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidValue("JUDGE_TIMEOUT_SECONDS".to_string()));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue("JUDGE_MAX_CONCURRENCY".to_string()));
        }
        if self.queue_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "JUDGE_QUEUE_TIMEOUT_SECONDS".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_JUDGE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_JUDGE_TIMEOUT_SECONDS),
            connect_timeout: Duration::from_secs(DEFAULT_JUDGE_CONNECT_TIMEOUT_SECONDS),
            max_concurrency: DEFAULT_JUDGE_MAX_CONCURRENCY,
            queue_timeout: Duration::from_secs(DEFAULT_JUDGE_QUEUE_TIMEOUT_SECONDS),
        }
    }
}

impl RecoveryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let stale: u64 = parse_var("STALE_SUBMISSION_SECONDS", DEFAULT_STALE_SUBMISSION_SECONDS)?;
        let interval: u64 = parse_var(
            "STALE_SWEEP_INTERVAL_SECONDS",
            DEFAULT_STALE_SWEEP_INTERVAL_SECONDS,
        )?;
        if interval == 0 {
            return Err(ConfigError::InvalidValue(
                "STALE_SWEEP_INTERVAL_SECONDS".to_string(),
            ));
        }

        Ok(Self {
            stale_after: Duration::from_secs(stale),
            sweep_interval: Duration::from_secs(interval),
        })
    }

    /// A submission still in flight must never be swept as stale.
    ///
    /// A row waits at most `queue_timeout` as PENDING, then at most `timeout`
    /// as IN_PROGRESS; the window has to outlast both.
    pub fn validate_against(&self, judge: &JudgeConfig) -> Result<(), ConfigError> {
        if self.stale_after <= judge.timeout.saturating_add(judge.queue_timeout) {
            return Err(ConfigError::InvalidValue(
                "STALE_SUBMISSION_SECONDS".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(DEFAULT_STALE_SUBMISSION_SECONDS),
            sweep_interval: Duration::from_secs(DEFAULT_STALE_SWEEP_INTERVAL_SECONDS),
        }
    }
}

/// Read an optional variable, falling back to `default` when unset
fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}
