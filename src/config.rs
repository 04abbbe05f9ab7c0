//! Process configuration, loaded once at startup from the environment.
//!
//! Everything here is immutable after load and passed explicitly (by `Arc`)
//! to the parts that need it; there is no global mutable state.

use crate::error::AppError;
use axum_extra::extract::cookie::Key;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_ENVIRONMENT: &str = "ENV";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_COOKIE_ENCRYPTION_KEYS: &str = "COOKIE_ENCRYPTION_KEYS";
pub const ENV_API_BASIC_AUTH: &str = "API_BASIC_AUTH";
pub const ENV_ASSETS_DIR: &str = "ASSETS_DIR";

// Development-only fallback; real deployments set COOKIE_ENCRYPTION_KEYS.
const DEV_COOKIE_KEY: &str = "webapp-development-cookie-key-0000000000000000000000000000000000";

/// Build metadata stamped at compile time. Branch and timestamp come from
/// `BUILD_BRANCH`/`BUILD_TIMESTAMP` set by the release pipeline and are empty
/// for local builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildInfo {
    pub branch: String,
    pub version: String,
    pub timestamp: String,
}

impl BuildInfo {
    pub fn current() -> Self {
        BuildInfo {
            branch: option_env!("BUILD_BRANCH").unwrap_or("").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: option_env!("BUILD_TIMESTAMP").unwrap_or("").to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Deployment environment name, e.g. "development" or "production".
    pub environment: String,
    pub database_url: Option<String>,
    /// Cookie encryption keys, newest first. Only the first is used to issue
    /// cookies; the list form is accepted for rotation.
    pub cookie_keys: Vec<String>,
    /// Credentials guarding the `/api/v1` group, as `(user, password)`.
    pub api_auth: (String, String),
    /// Serve static assets from this directory instead of the bundled tree.
    pub assets_dir: Option<PathBuf>,
    pub filename_404: String,
    pub filename_500: String,
    pub build: BuildInfo,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let environment =
            std::env::var(ENV_ENVIRONMENT).unwrap_or_else(|_| "development".to_string());

        let cookie_keys: Vec<String> = std::env::var(ENV_COOKIE_ENCRYPTION_KEYS)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();

        let api_auth = parse_accounts(
            &std::env::var(ENV_API_BASIC_AUTH).unwrap_or_else(|_| "admin:secret".to_string()),
        )?;

        Ok(AppConfig {
            environment,
            database_url: std::env::var(ENV_DATABASE_URL).ok().filter(|s| !s.is_empty()),
            cookie_keys,
            api_auth,
            assets_dir: std::env::var(ENV_ASSETS_DIR).ok().map(PathBuf::from),
            filename_404: "404.html".to_string(),
            filename_500: "500.html".to_string(),
            build: BuildInfo::current(),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Key used to encrypt session cookies. Derived from the first configured
    /// key; falls back to a fixed development key with a warning.
    pub fn cookie_key(&self) -> Result<Key, AppError> {
        let secret = match self.cookie_keys.first() {
            Some(k) => k.as_str(),
            None => {
                tracing::warn!(
                    "{} not set, using development cookie key",
                    ENV_COOKIE_ENCRYPTION_KEYS
                );
                DEV_COOKIE_KEY
            }
        };
        if secret.len() < 32 {
            return Err(AppError::Config(format!(
                "cookie encryption key must be at least 32 bytes, got {}",
                secret.len()
            )));
        }
        Ok(Key::derive_from(secret.as_bytes()))
    }
}

fn parse_accounts(raw: &str) -> Result<(String, String), AppError> {
    match raw.split_once(':') {
        Some((user, pass)) if !user.is_empty() && !pass.is_empty() => {
            Ok((user.to_string(), pass.to_string()))
        }
        _ => Err(AppError::Config(format!(
            "{ENV_API_BASIC_AUTH} must be formatted as user:password"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            environment: "test".to_string(),
            database_url: None,
            cookie_keys: Vec::new(),
            api_auth: ("admin".to_string(), "secret".to_string()),
            assets_dir: None,
            filename_404: "404.html".to_string(),
            filename_500: "500.html".to_string(),
            build: BuildInfo::current(),
        }
    }

    #[test]
    fn parse_accounts_requires_user_and_password() {
        assert!(parse_accounts("admin:secret").is_ok());
        assert!(parse_accounts("admin").is_err());
        assert!(parse_accounts(":secret").is_err());
    }

    #[test]
    fn cookie_key_rejects_short_secrets() {
        let mut config = test_config();
        config.cookie_keys = vec!["short".to_string()];
        assert!(config.cookie_key().is_err());
    }

    #[test]
    fn cookie_key_falls_back_to_dev_key() {
        let config = test_config();
        assert!(config.cookie_key().is_ok());
    }

    #[test]
    fn build_info_has_version() {
        assert!(!BuildInfo::current().version.is_empty());
    }
}
