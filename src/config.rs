// src/config.rs
// Environment-driven client configuration.

use std::time::Duration;

use thiserror::Error;

use crate::poller::PollConfig;

pub const BASE_URL_VAR: &str = "VIDCHAT_API_BASE_URL";
/// Name used by the web frontend; accepted so one `.env` can serve both.
pub const LEGACY_BASE_URL_VAR: &str = "NEXT_PUBLIC_API_BASE_URL";
pub const POLL_INTERVAL_VAR: &str = "VIDCHAT_POLL_INTERVAL_MS";
pub const RETRY_ATTEMPTS_VAR: &str = "VIDCHAT_RETRY_ATTEMPTS";
pub const RETRY_DELAY_VAR: &str = "VIDCHAT_RETRY_DELAY_MS";
pub const REQUEST_TIMEOUT_VAR: &str = "VIDCHAT_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("API base URL is not set (set VIDCHAT_API_BASE_URL or NEXT_PUBLIC_API_BASE_URL)")]
    MissingBaseUrl,
    #[error("API base URL '{0}' is not a valid http(s) URL")]
    InvalidBaseUrl(String),
    #[error("{key} must be a non-negative integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub poll_interval: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Defaults for everything but the base URL.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        let poll = PollConfig::default();
        Self {
            api_base_url: api_base_url.into(),
            poll_interval: poll.interval,
            retry_attempts: poll.max_attempts,
            retry_delay: poll.retry_delay,
            request_timeout: None,
        }
    }

    /// Load from the process environment. Call `dotenvy::dotenv()` first to
    /// pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(BASE_URL_VAR)
            .or_else(|| lookup(LEGACY_BASE_URL_VAR))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingBaseUrl)?;
        validate_base_url(&base_url)?;

        let mut config = Self::new(base_url);

        if let Some(ms) = parse_number(&lookup, POLL_INTERVAL_VAR)? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(attempts) = parse_number(&lookup, RETRY_ATTEMPTS_VAR)? {
            config.retry_attempts = u32::try_from(attempts).unwrap_or(u32::MAX);
        }
        if let Some(ms) = parse_number(&lookup, RETRY_DELAY_VAR)? {
            config.retry_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_number(&lookup, REQUEST_TIMEOUT_VAR)? {
            config.request_timeout = Some(Duration::from_secs(secs)).filter(|d| !d.is_zero());
        }

        Ok(config)
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: self.poll_interval,
            max_attempts: self.retry_attempts.max(1),
            retry_delay: self.retry_delay,
        }
    }
}

pub fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    match url::Url::parse(base_url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ConfigError::InvalidBaseUrl(base_url.to_string())),
    }
}

fn parse_number<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
    }
}
