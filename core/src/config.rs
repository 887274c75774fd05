//! Client and query-cache settings.
//!
//! Defaults match the public API the reader talks to. `ClientConfig` can be
//! overridden from the environment:
//!
//! | Variable              | Meaning                      |
//! |-----------------------|------------------------------|
//! | `BLOG_API_BASE_URL`   | upstream base URL            |
//! | `BLOG_API_TIMEOUT_MS` | per-request timeout, millis  |

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const BASE_URL_VAR: &str = "BLOG_API_BASE_URL";
pub const TIMEOUT_VAR: &str = "BLOG_API_TIMEOUT_MS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must not be empty")]
    Empty { var: &'static str },

    #[error("{var} is not a valid number of milliseconds: {value:?}")]
    InvalidTimeout { var: &'static str, value: String },
}

/// Transport settings: where to send requests and how long to wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read overrides through `lookup`; unset variables keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(base_url) = lookup(BASE_URL_VAR) {
            let base_url = base_url.trim();
            if base_url.is_empty() {
                return Err(ConfigError::Empty { var: BASE_URL_VAR });
            }
            config.base_url = base_url.to_string();
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let millis: u64 = raw
                .trim()
                .parse()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout {
                    var: TIMEOUT_VAR,
                    value: raw.clone(),
                })?;
            config.timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }
}

/// Caching and retry policy of the query layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// A cached value younger than this is served without a request.
    pub stale_time: Duration,
    /// An entry not read for this long is evicted.
    pub cache_time: Duration,
    /// Retries after the first failed attempt.
    pub retry: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
    pub refetch_on_focus: bool,
    pub refetch_on_reconnect: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(5),
            cache_time: Duration::from_secs(30 * 60),
            retry: 3,
            retry_base_delay: Duration::from_secs(1),
            retry_max_delay: Duration::from_secs(30),
            refetch_on_focus: true,
            refetch_on_reconnect: true,
        }
    }
}

impl QueryConfig {
    /// Delay before retry number `attempt` (zero-based): the base delay
    /// doubled per attempt, capped at `retry_max_delay`.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.retry_base_delay.checked_mul(factor))
            .map_or(self.retry_max_delay, |delay| delay.min(self.retry_max_delay))
    }
}
