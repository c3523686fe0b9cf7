use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::endpoint::Endpoint;

pub const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com";
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Upstream settings used to build a [`crate::WeatherApiClient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// WeatherAPI.com key, sent as the `key` parameter.
    pub token: Option<String>,
    pub base_url: String,
    pub endpoint: Endpoint,
    /// Return an empty map instead of failing when the upstream body is not JSON.
    pub lenient_decode: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoint: Endpoint::default(),
            lenient_decode: false,
        }
    }
}

impl ApiConfig {
    pub fn url(&self) -> String {
        self.endpoint.url(&self.base_url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: DEFAULT_BIND.to_string() }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [api]
/// token = "..."
/// base_url = "http://api.weatherapi.com"
/// endpoint = "forecast"
///
/// [server]
/// bind = "0.0.0.0:8000"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Token from config, failing with a hint when it is absent or blank.
    pub fn require_token(&self) -> Result<&str> {
        self.api.token.as_deref().filter(|t| !t.trim().is_empty()).ok_or_else(|| {
            anyhow!(
                "No API token configured.\n\
                 Hint: run `weather-proxy configure` or pass `--token <KEY>`."
            )
        })
    }

    pub fn set_token(&mut self, token: String) {
        self.api.token = Some(token);
    }

    /// Load config from the platform config dir, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-proxy", "weather-proxy")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
