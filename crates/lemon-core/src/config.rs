//! Client configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LEMON_BASE_URL` | `http://localhost:3000/api` | Base URL relative targets are joined to |
//! | `LEMON_TIMEOUT_MS` | 10000 | Per-attempt timeout |
//! | `LEMON_RETRY_ATTEMPTS` | 3 | Retries after the first attempt |
//! | `LEMON_RETRY_DELAY_MS` | 1000 | Base backoff delay, doubled per retry |

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::types::BaseUrl;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Default number of retries after the first attempt.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default base delay for exponential backoff.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(1_000);

/// Upper bound on configured retries; `2^attempt` stays well inside `u32`.
const MAX_RETRY_ATTEMPTS: u32 = 16;

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Endpoint paths, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub login: String,
    pub refresh: String,
    pub user_profile: String,
    pub feedback: String,
    pub menu_items: String,
    pub restaurant_info: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            refresh: "/auth/refresh".to_string(),
            user_profile: "/user/profile".to_string(),
            feedback: "/feedback/submit".to_string(),
            menu_items: "/menu/items".to_string(),
            restaurant_info: "/restaurant/info".to_string(),
        }
    }
}

/// Configuration for the request pipeline and the auth API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL relative targets resolve against.
    pub base_url: BaseUrl,
    /// Timeout applied to each individual attempt.
    pub timeout: Duration,
    /// Retries after the first attempt, for transport failures only.
    pub retry_attempts: u32,
    /// Backoff before retry `n` is `retry_base_delay * 2^n`.
    pub retry_base_delay: Duration,
    /// Endpoint paths.
    pub endpoints: Endpoints,
}

impl ClientConfig {
    /// Create a configuration for `base_url` with default settings.
    pub fn new(base_url: BaseUrl) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            endpoints: Endpoints::default(),
        }
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of retries after the first attempt.
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.min(MAX_RETRY_ATTEMPTS);
        self
    }

    /// Set the backoff base delay.
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Replace the endpoint paths.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Creates a configuration from `LEMON_*` environment variables.
    ///
    /// Unset variables fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Creates a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("LEMON_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = BaseUrl::new(&base_url).map_err(|e| ConfigError::InvalidValue {
            key: "LEMON_BASE_URL".to_string(),
            message: e.to_string(),
        })?;

        let mut config = Self::new(base_url);

        if let Some(val) = lookup("LEMON_TIMEOUT_MS") {
            let ms = parse_u64("LEMON_TIMEOUT_MS", &val)?;
            if ms == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "LEMON_TIMEOUT_MS".to_string(),
                    message: "timeout must be greater than 0".to_string(),
                });
            }
            config.timeout = Duration::from_millis(ms);
        }

        if let Some(val) = lookup("LEMON_RETRY_ATTEMPTS") {
            let attempts = val.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
                key: "LEMON_RETRY_ATTEMPTS".to_string(),
                message: format!("expected non-negative integer, got '{val}'"),
            })?;
            if attempts > MAX_RETRY_ATTEMPTS {
                return Err(ConfigError::InvalidValue {
                    key: "LEMON_RETRY_ATTEMPTS".to_string(),
                    message: format!("must be at most {MAX_RETRY_ATTEMPTS}"),
                });
            }
            config.retry_attempts = attempts;
        }

        if let Some(val) = lookup("LEMON_RETRY_DELAY_MS") {
            config.retry_base_delay = Duration::from_millis(parse_u64("LEMON_RETRY_DELAY_MS", &val)?);
        }

        Ok(config)
    }
}

fn parse_u64(key: &str, val: &str) -> Result<u64, ConfigError> {
    val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected non-negative integer, got '{val}'"),
    })
}
