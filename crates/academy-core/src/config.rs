//! Application configuration management.
//!
//! This module handles loading the configuration: the backend
//! base URL, the administrative scope the operator works in, and the
//! label language. The API token is never written to disk; it comes from
//! the environment (a `.env` file is honoured by the binary).
//!
//! Configuration is stored at `~/.config/academy-notify/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::directory::Scope;
use crate::models::{BranchId, Locale};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "academy-notify";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Used when neither the config file nor the environment names a backend
const DEFAULT_API_URL: &str = "http://localhost:8000/api";

pub const ENV_API_URL: &str = "ACADEMY_API_URL";
pub const ENV_API_TOKEN: &str = "ACADEMY_API_TOKEN";
pub const ENV_BRANCH_ID: &str = "ACADEMY_BRANCH_ID";
pub const ENV_LOCALE: &str = "ACADEMY_LOCALE";
/// Read by the binary only: directory for daily rolling log files
pub const ENV_LOG_DIR: &str = "ACADEMY_LOG_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    /// Set for branch admins and coaches; unset means the global scope.
    pub branch_id: Option<BranchId>,
    #[serde(default)]
    pub locale: Locale,
    #[serde(skip)]
    pub api_token: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Environment values override the file. Takes a lookup function so
    /// tests do not have to touch the process environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = non_empty(ENV_API_URL) {
            self.api_url = Some(url);
        }
        if let Some(token) = non_empty(ENV_API_TOKEN) {
            self.api_token = Some(token);
        }
        if let Some(branch) = non_empty(ENV_BRANCH_ID) {
            self.branch_id = Some(BranchId::from(branch));
        }
        if let Some(code) = non_empty(ENV_LOCALE) {
            match Locale::from_code(&code) {
                Some(locale) => self.locale = locale,
                None => warn!(locale = %code, "Unknown locale, keeping {:?}", self.locale),
            }
        }
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn scope(&self) -> Scope {
        match &self.branch_id {
            Some(branch) => Scope::Branch(branch.clone()),
            None => Scope::Global,
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url(), DEFAULT_API_URL);
        assert_eq!(config.scope(), Scope::Global);
        assert_eq!(config.locale, Locale::En);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config {
            api_url: Some("https://old.example/api".to_string()),
            ..Default::default()
        };
        config.apply_env(env(&[
            (ENV_API_URL, "https://academy.example/api"),
            (ENV_API_TOKEN, "secret"),
            (ENV_BRANCH_ID, "4"),
            (ENV_LOCALE, "ar"),
        ]));
        assert_eq!(config.api_url(), "https://academy.example/api");
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.scope(), Scope::Branch(BranchId::from("4")));
        assert_eq!(config.locale, Locale::Ar);
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env(env(&[(ENV_BRANCH_ID, "  "), (ENV_LOCALE, "fr")]));
        assert_eq!(config.scope(), Scope::Global);
        assert_eq!(config.locale, Locale::En);
    }

    #[test]
    fn test_token_is_not_serialized() {
        let config = Config {
            api_token: Some("secret".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
