//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use reqwest::Url;
use std::time::Duration;
use tracing::Level;
use triheart_core::RenderMode;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: Url,
    pub api_prefix: String,
    pub request_timeout: Duration,
    pub render_mode: RenderMode,
    pub log_level: Level,
    pub token: Option<String>,
    pub user_id: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Backend Location ---
        let base_url_str = lookup("TRIHEART_BASE_URL")
            .ok_or_else(|| ConfigError::MissingVar("TRIHEART_BASE_URL".to_string()))?;
        let base_url = Url::parse(&base_url_str).map_err(|e| {
            ConfigError::InvalidValue("TRIHEART_BASE_URL".to_string(), e.to_string())
        })?;

        let api_prefix = normalize_prefix(
            &lookup("TRIHEART_API_PREFIX").unwrap_or_else(|| "/api/v2".to_string()),
        );

        let timeout_str = lookup("TRIHEART_TIMEOUT_SECS").unwrap_or_else(|| "30".to_string());
        let timeout_secs = timeout_str
            .parse::<u64>()
            .ok()
            .filter(|s| *s > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "TRIHEART_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", timeout_str),
                )
            })?;

        let render_mode = lookup("TRIHEART_RENDER_MODE")
            .map(|m| {
                m.parse::<RenderMode>()
                    .map_err(|e| ConfigError::InvalidValue("TRIHEART_RENDER_MODE".to_string(), e))
            })
            .transpose()?
            .unwrap_or_default();

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Session (optional) ---
        let token = lookup("TRIHEART_TOKEN").filter(|t| !t.is_empty());
        let user_id = lookup("TRIHEART_USER_ID").filter(|u| !u.is_empty());

        Ok(Self {
            base_url,
            api_prefix,
            request_timeout: Duration::from_secs(timeout_secs),
            render_mode,
            log_level,
            token,
            user_id,
        })
    }
}

/// `"api/v2/"` and `"/api/v2"` both become `"/api/v2"`; an empty prefix stays empty.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_base_url_is_set() {
        let config = load(&[("TRIHEART_BASE_URL", "https://books.example.com")]).unwrap();
        assert_eq!(config.api_prefix, "/api/v2");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.render_mode, RenderMode::Crop);
        assert_eq!(config.log_level, Level::INFO);
        assert!(config.token.is_none());
    }

    #[test]
    fn base_url_is_required_and_validated() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingVar(v)) if v == "TRIHEART_BASE_URL"));
        assert!(matches!(
            load(&[("TRIHEART_BASE_URL", "not a url")]),
            Err(ConfigError::InvalidValue(v, _)) if v == "TRIHEART_BASE_URL"
        ));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("TRIHEART_BASE_URL", "http://127.0.0.1:9988"),
            ("TRIHEART_API_PREFIX", "gateway/api/"),
            ("TRIHEART_TIMEOUT_SECS", "5"),
            ("TRIHEART_RENDER_MODE", "ORIGIN"),
            ("RUST_LOG", "debug"),
            ("TRIHEART_TOKEN", "abc"),
            ("TRIHEART_USER_ID", "u1"),
        ])
        .unwrap();
        assert_eq!(config.api_prefix, "/gateway/api");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.render_mode, RenderMode::Origin);
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn bad_values_are_reported_by_name() {
        let base = ("TRIHEART_BASE_URL", "http://localhost");
        for (key, value) in [
            ("TRIHEART_TIMEOUT_SECS", "0"),
            ("TRIHEART_TIMEOUT_SECS", "soon"),
            ("TRIHEART_RENDER_MODE", "sideways"),
            ("RUST_LOG", "chatty"),
        ] {
            match load(&[base, (key, value)]) {
                Err(ConfigError::InvalidValue(name, _)) => assert_eq!(name, key),
                other => panic!("{}={} gave {:?}", key, value, other),
            }
        }
    }

    #[test]
    fn empty_prefix_is_allowed() {
        let config = load(&[
            ("TRIHEART_BASE_URL", "http://localhost"),
            ("TRIHEART_API_PREFIX", "/"),
        ])
        .unwrap();
        assert_eq!(config.api_prefix, "");
    }
}
