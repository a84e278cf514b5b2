//! Configuration management for Wheels CLI
//!
//! Stores API key, endpoints and the acting user in ~/.config/wheels/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const CONFIG_DIR: &str = "wheels";
const CONFIG_FILE: &str = "config.toml";

/// CLI Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Realtime endpoint; derived from `base_url` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<String>,
    /// Sent as `X-User-Id` on user-scoped calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            ws_url: None,
            user_id: None,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join(CONFIG_DIR);
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory {:?}", dir))?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }

    pub fn set_api_key(&mut self, key: String) {
        self.api_key = Some(key);
    }

    /// The `/ws` URL, scoped to the configured user and carrying the API key
    pub fn realtime_url(&self) -> String {
        let base = match &self.ws_url {
            Some(url) => url.clone(),
            None => {
                let base = self.base_url.trim_end_matches('/');
                let ws_base = if let Some(rest) = base.strip_prefix("https://") {
                    format!("wss://{rest}")
                } else if let Some(rest) = base.strip_prefix("http://") {
                    format!("ws://{rest}")
                } else {
                    base.to_string()
                };
                format!("{ws_base}/ws")
            }
        };

        let mut params = Vec::new();
        if let Some(user) = &self.user_id {
            params.push(format!("userId={}", urlencoding::encode(user)));
        }
        if let Some(key) = &self.api_key {
            params.push(format!("key={}", urlencoding::encode(key)));
        }
        if params.is_empty() {
            return base;
        }

        let separator = if base.contains('?') { '&' } else { '?' };
        format!("{base}{separator}{}", params.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let config = Config::parse("api_key = \"k\"").unwrap();
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.base_url, "http://localhost:8000");
        assert!(config.user_id.is_none());
    }

    #[test]
    fn test_realtime_url_from_base() {
        let config = Config {
            base_url: "https://wheels.shuttle.app/".into(),
            user_id: Some("user 1".into()),
            ..Default::default()
        };
        assert_eq!(config.realtime_url(), "wss://wheels.shuttle.app/ws?userId=user%201");
    }

    #[test]
    fn test_explicit_ws_url_wins() {
        let config = Config {
            ws_url: Some("ws://127.0.0.1:9000/ws".into()),
            ..Default::default()
        };
        assert_eq!(config.realtime_url(), "ws://127.0.0.1:9000/ws");
    }

    #[test]
    fn test_realtime_url_carries_api_key() {
        let config = Config {
            api_key: Some("k+1".into()),
            user_id: Some("u1".into()),
            ws_url: Some("ws://127.0.0.1:9000/ws?debug=1".into()),
            ..Default::default()
        };
        assert_eq!(
            config.realtime_url(),
            "ws://127.0.0.1:9000/ws?debug=1&userId=u1&key=k%2B1"
        );
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = Config {
            api_key: Some("k".into()),
            user_id: Some("u1".into()),
            ..Default::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::parse(&text).unwrap(), config);
    }
}
