//! Configuration management for the gateway
//!
//! All configuration comes from environment variables, with defaults
//! suitable for local development.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Deployment environment, selected by the `ENVIRONMENT` variable.
///
/// Development relaxes the outer guards: generation quotas are bypassed
/// and remote image URLs skip the origin allowlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    fn from_env() -> Self {
        match env::var("ENVIRONMENT").as_deref() {
            Ok("production") => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_development(self) -> bool {
        self == Self::Development
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Main configuration struct for the gateway
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Shared provider credential, may be empty
    pub fal_api_key: String,
    /// Wall clock budget for one complete upstream operation
    pub upstream_budget: Duration,
    /// Per client ceiling for the whole /api surface
    pub api_rate_limit: u32,
    pub api_rate_window: Duration,
    /// Generation quota, short horizon
    pub hourly_limit: u32,
    pub hourly_window: Duration,
    /// Generation quota, long horizon
    pub daily_limit: u32,
    pub daily_window: Duration,
    /// Origins remote image URLs must match in production
    pub allowed_image_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let fal_api_key = env::var("FAL_KEY").unwrap_or_default();
        if fal_api_key.is_empty() {
            warn!(
                "FAL_KEY is not set; only requests with a caller-supplied key will succeed upstream"
            );
        }

        let allowed_image_origins = env::var("ALLOWED_IMAGE_DOMAINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            host: env::var("GATEWAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("GATEWAY_PORT", 8080)?,
            environment: Environment::from_env(),
            fal_api_key,
            upstream_budget: Duration::from_secs(parse_env("GATEWAY_TIMEOUT", 100)?),
            api_rate_limit: parse_env("API_RATE_LIMIT", 200)?,
            api_rate_window: Duration::from_secs(parse_env("API_RATE_WINDOW_SECS", 3600)?),
            hourly_limit: parse_env("HOURLY_LIMIT", 10)?,
            hourly_window: Duration::from_secs(parse_env("HOURLY_WINDOW_SECS", 3600)?),
            daily_limit: parse_env("DAILY_LIMIT", 40)?,
            daily_window: Duration::from_secs(parse_env("DAILY_WINDOW_SECS", 86400)?),
            allowed_image_origins,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: Environment::default(),
            fal_api_key: String::new(),
            upstream_budget: Duration::from_secs(100),
            api_rate_limit: 200,
            api_rate_window: Duration::from_secs(3600),
            hourly_limit: 10,
            hourly_window: Duration::from_secs(3600),
            daily_limit: 40,
            daily_window: Duration::from_secs(86400),
            allowed_image_origins: vec![],
        }
    }
}

/// Parse an environment variable, falling back to a default when unset.
fn parse_env<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
