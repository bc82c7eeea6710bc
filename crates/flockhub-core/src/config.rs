//! Application configuration management.
//!
//! Configuration is stored at `~/.config/flockhub/config.json` and may be
//! overridden per process through environment variables:
//!
//! - `FLOCKHUB_API_URL`: backend base URL
//! - `FLOCKHUB_USE_MOCK`: serve canned data instead of calling the backend
//! - `FLOCKHUB_USE_COOKIES`: keep a cookie session alongside the token
//! - `FLOCKHUB_TOKEN_IN_BODY`: ask the backend for the token in the login body

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::ApiClientConfig;
use crate::auth::Storage;
use crate::state::ThemeMode;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "flockhub";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

pub const ENV_API_URL: &str = "FLOCKHUB_API_URL";
pub const ENV_USE_MOCK: &str = "FLOCKHUB_USE_MOCK";
pub const ENV_USE_COOKIES: &str = "FLOCKHUB_USE_COOKIES";
pub const ENV_TOKEN_IN_BODY: &str = "FLOCKHUB_TOKEN_IN_BODY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub use_mock: bool,
    pub use_cookies: bool,
    pub request_token_in_body: bool,
    pub active_church_id: Option<String>,
    pub theme: ThemeMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            use_mock: false,
            use_cookies: false,
            // A terminal has no cookie jar between runs, so the token travels in the body.
            request_token_in_body: true,
            active_church_id: None,
            theme: ThemeMode::System,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted session (token and user marker).
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Apply `FLOCKHUB_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = Some(url.trim().to_string());
        }
        if let Some(flag) = lookup(ENV_USE_MOCK).as_deref().and_then(parse_flag) {
            self.use_mock = flag;
        }
        if let Some(flag) = lookup(ENV_USE_COOKIES).as_deref().and_then(parse_flag) {
            self.use_cookies = flag;
        }
        if let Some(flag) = lookup(ENV_TOKEN_IN_BODY).as_deref().and_then(parse_flag) {
            self.request_token_in_body = flag;
        }
    }

    pub fn base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    /// Facade options for this configuration, persisting auth state in `storage`.
    pub fn client_config(&self, storage: Arc<dyn Storage>) -> ApiClientConfig {
        ApiClientConfig::new(self.base_url(), storage)
            .use_cookies(self.use_cookies)
            .request_token_in_body(self.request_token_in_body)
            .use_mock(self.use_mock)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::auth::MemoryStorage;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.base_url(), DEFAULT_API_URL);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_base_url: Some("https://api.test".to_string()),
            active_church_id: Some("c1".to_string()),
            theme: ThemeMode::Dark,
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"use_mock": true}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert!(config.use_mock);
        assert!(config.request_token_in_body);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_URL, " https://api.test "),
            (ENV_USE_MOCK, "TRUE"),
            (ENV_USE_COOKIES, "1"),
            (ENV_TOKEN_IN_BODY, "maybe"),
        ]);
        let mut config = Config::default();
        config.apply_env_from(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.base_url(), "https://api.test");
        assert!(config.use_mock);
        assert!(config.use_cookies);
        // Unparseable flags leave the current value alone.
        assert!(config.request_token_in_body);
    }

    #[test]
    fn test_client_config_carries_flags() {
        let config = Config {
            use_cookies: true,
            use_mock: true,
            ..Config::default()
        };
        let client_config = config.client_config(Arc::new(MemoryStorage::new()));
        assert_eq!(client_config.base_url, DEFAULT_API_URL);
        assert!(client_config.use_cookies);
        assert!(client_config.use_mock);
        assert!(client_config.request_token_in_body);
    }
}
