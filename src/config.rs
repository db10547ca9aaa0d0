//! Process configuration, read from environment variables.

use crate::identity::IdentityConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Everything the web binary needs at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Directory for per-group JSON files. None keeps state in memory only.
    pub data_dir: Option<PathBuf>,
    pub identity: IdentityConfig,
}

impl AppConfig {
    /// Load from `HOST`, `PORT`, `DATA_DIR`, `IDENTITY_API_URL`, `IDENTITY_API_KEY`,
    /// `IDENTITY_MAX_RETRIES` and `IDENTITY_BACKOFF_MS`, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = IdentityConfig::default();
        let identity = IdentityConfig {
            base_url: lookup("IDENTITY_API_URL").unwrap_or(defaults.base_url),
            api_key: lookup("IDENTITY_API_KEY").filter(|k| !k.trim().is_empty()),
            max_retries: parse_or(&lookup, "IDENTITY_MAX_RETRIES", defaults.max_retries)?,
            backoff: Duration::from_millis(parse_or(&lookup, "IDENTITY_BACKOFF_MS", 1000u64)?),
        };
        let config = Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            data_dir: lookup("DATA_DIR").map(PathBuf::from),
            identity,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid {
                var: "PORT".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }
        if self.identity.backoff.is_zero() {
            return Err(ConfigError::Invalid {
                var: "IDENTITY_BACKOFF_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("cannot parse {raw:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert!(config.data_dir.is_none());
        assert!(config.identity.api_key.is_none());
        assert_eq!(config.identity.max_retries, 3);
        assert_eq!(config.identity.backoff, Duration::from_millis(1000));
    }

    #[test]
    fn overrides_and_blank_key() {
        let config = load(&[
            ("PORT", "9000"),
            ("DATA_DIR", "/var/lib/cup"),
            ("IDENTITY_API_KEY", "  "),
            ("IDENTITY_BACKOFF_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/cup")));
        assert!(config.identity.api_key.is_none());
        assert_eq!(config.identity.backoff, Duration::from_millis(250));
    }

    #[test]
    fn rejects_bad_values() {
        let err = load(&[("PORT", "abc")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert!(load(&[("PORT", "0")]).is_err());
        assert!(load(&[("IDENTITY_BACKOFF_MS", "0")]).is_err());
    }
}
