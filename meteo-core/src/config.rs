use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::PathBuf};

use crate::{
    error::ConfigError,
    model::{QueryOptions, Units},
};

/// Environment variable that overrides the API key stored on disk.
pub const API_KEY_ENV: &str = "OPENWEATHERMAP_API_KEY";

pub const DEFAULT_GEOCODING_URL: &str = "https://api-adresse.data.gouv.fr";
pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5";

/// A validated, non-blank OpenWeatherMap credential.
///
/// Only [`Config::api_key`] hands these out, so holding one means the
/// credential check already passed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Base URLs of the two providers. Overridable for self-hosted mirrors and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub geocoding: String,
    pub weather: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geocoding: DEFAULT_GEOCODING_URL.to_string(),
            weather: DEFAULT_WEATHER_URL.to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// lang = "fr"
/// units = "metric"
///
/// [endpoints]
/// weather = "https://api.openweathermap.org/data/2.5"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub lang: Option<String>,
    pub units: Option<Units>,
    pub suggestion_limit: Option<usize>,
    pub endpoints: Endpoints,
}

impl Config {
    /// Resolve the credential, preferring `OPENWEATHERMAP_API_KEY` over the file.
    pub fn api_key(&self) -> Result<ApiKey, ConfigError> {
        self.api_key_with_env(std::env::var(API_KEY_ENV).ok().as_deref())
    }

    /// Same as [`Config::api_key`] with the environment value passed in.
    pub fn api_key_with_env(&self, env_value: Option<&str>) -> Result<ApiKey, ConfigError> {
        env_value
            .and_then(ApiKey::parse)
            .or_else(|| self.api_key.as_deref().and_then(ApiKey::parse))
            .ok_or(ConfigError::MissingCredential)
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn query_options(&self) -> QueryOptions {
        let defaults = QueryOptions::default();
        QueryOptions {
            lang: self.lang.clone().unwrap_or(defaults.lang),
            units: self.units.unwrap_or(defaults.units),
        }
    }

    pub fn suggestion_limit(&self) -> usize {
        self.suggestion_limit
            .filter(|limit| *limit > 0)
            .unwrap_or(crate::geocoding::DEFAULT_SUGGESTION_LIMIT)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "meteo", "meteo-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
