//! Application configuration loaded from environment variables.
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file in the working directory.

use chrono::Duration;
use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment ("development" enables human-readable logs)
    pub environment: String,
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID; when unset the in-memory store is used
    pub gcp_project_id: Option<String>,
    /// Symmetric key used to sign access and refresh tokens (raw bytes)
    pub token_symmetric_key: Vec<u8>,
    /// Lifetime of access tokens
    pub access_token_duration: Duration,
    /// Lifetime of refresh tokens and their sessions
    pub refresh_token_duration: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "production".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            token_symmetric_key: env::var("TOKEN_SYMMETRIC_KEY")
                .map_err(|_| ConfigError::Missing("TOKEN_SYMMETRIC_KEY"))?
                .trim()
                .as_bytes()
                .to_vec(),
            access_token_duration: duration_var("ACCESS_TOKEN_DURATION", "15m")?,
            refresh_token_duration: duration_var("REFRESH_TOKEN_DURATION", "24h")?,
        })
    }

    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            environment: "test".to_string(),
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: None,
            token_symmetric_key: b"test_token_key_32_bytes_minimum!!".to_vec(),
            access_token_duration: Duration::minutes(15),
            refresh_token_duration: Duration::hours(24),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn duration_var(name: &'static str, default: &str) -> Result<Duration, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    parse_duration(&raw).ok_or(ConfigError::Invalid(name, raw))
}

/// Parse a Go-style duration string such as `90s`, `15m`, `1h30m` or `7d`.
///
/// Returns `None` for empty input, unknown units, or a zero total.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let mut total = Duration::zero();
    let mut digits = String::new();

    for c in raw.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let value: i64 = digits.parse().ok()?;
        digits.clear();

        let part = match c {
            's' => Duration::try_seconds(value)?,
            'm' => Duration::try_minutes(value)?,
            'h' => Duration::try_hours(value)?,
            'd' => Duration::try_days(value)?,
            _ => return None,
        };
        total = total.checked_add(&part)?;
    }

    // Trailing number without a unit
    if !digits.is_empty() || total <= Duration::zero() {
        return None;
    }

    Some(total)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("TOKEN_SYMMETRIC_KEY", "test_token_key_32_bytes_minimum!!");
        env::set_var("ACCESS_TOKEN_DURATION", "10m");
        env::remove_var("REFRESH_TOKEN_DURATION");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(
            config.token_symmetric_key,
            b"test_token_key_32_bytes_minimum!!".to_vec()
        );
        assert_eq!(config.access_token_duration, Duration::minutes(10));
        assert_eq!(config.refresh_token_duration, Duration::hours(24));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90s"), Some(Duration::seconds(90)));
        assert_eq!(parse_duration("15m"), Some(Duration::minutes(15)));
        assert_eq!(
            parse_duration("1h30m"),
            Some(Duration::minutes(90))
        );
        assert_eq!(parse_duration("7d"), Some(Duration::days(7)));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("15"), None);
        assert_eq!(parse_duration("15x"), None);
        assert_eq!(parse_duration("h"), None);
        assert_eq!(parse_duration("0m"), None);
    }
}
