use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub log_level: String,
    pub refresh_interval: Duration,
    pub search_debounce: Duration,
    pub search_limit: usize,
    pub request_timeout: Duration,
    pub notification_timeout: Duration,
    pub event_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            log_level: "info".to_string(),
            refresh_interval: Duration::from_millis(5000),
            search_debounce: Duration::from_millis(250),
            search_limit: 6,
            request_timeout: Duration::from_millis(10_000),
            notification_timeout: Duration::from_millis(3000),
            event_buffer_size: 64,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let config = Self {
            backend_url: env::var("BACKEND_URL").unwrap_or(defaults.backend_url),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            refresh_interval: Duration::from_millis(parse_or_default(
                "REFRESH_INTERVAL_MS",
                5000,
            )?),
            search_debounce: Duration::from_millis(parse_or_default("SEARCH_DEBOUNCE_MS", 250)?),
            search_limit: parse_or_default("SEARCH_LIMIT", defaults.search_limit)?,
            request_timeout: Duration::from_millis(parse_or_default(
                "REQUEST_TIMEOUT_MS",
                10_000,
            )?),
            notification_timeout: Duration::from_millis(parse_or_default(
                "NOTIFICATION_TIMEOUT_MS",
                3000,
            )?),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", defaults.event_buffer_size)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.backend_url.trim().is_empty() {
            return Err(AppError::Config("BACKEND_URL cannot be empty".to_string()));
        }
        if self.refresh_interval.is_zero() {
            return Err(AppError::Config(
                "REFRESH_INTERVAL_MS must be > 0".to_string(),
            ));
        }
        if self.search_limit == 0 {
            return Err(AppError::Config("SEARCH_LIMIT must be > 0".to_string()));
        }
        if self.event_buffer_size == 0 {
            return Err(AppError::Config("EVENT_BUFFER_SIZE must be > 0".to_string()));
        }
        Ok(())
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Config(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
