use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

pub const DEFAULT_GEOCODING_BASE_URL: &str = "https://geocoding-api.open-meteo.com/v1";
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.open-meteo.com/v1";

const GEOCODING_SEARCH_PATH: &str = "/search";
const WEATHER_FORECAST_PATH: &str = "/forecast";

pub const ENV_GEOCODING_URL: &str = "WEATHER_GEOCODING_URL";
pub const ENV_WEATHER_URL: &str = "WEATHER_FORECAST_URL";

/// Tuning for the suggestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocompleteSettings {
    /// Trimmed queries shorter than this never hit the network.
    pub min_query_length: usize,
    /// Candidates below this population (or without one) are dropped.
    pub min_population: u64,
    pub max_suggestions: usize,
    pub debounce_ms: u64,
    /// How many raw matches to request per suggestion search.
    pub fetch_count: u32,
}

impl Default for AutocompleteSettings {
    fn default() -> Self {
        Self {
            min_query_length: 2,
            min_population: 10_000,
            max_suggestions: 3,
            debounce_ms: 300,
            fetch_count: 10,
        }
    }
}

impl AutocompleteSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// geocoding_base_url = "https://geocoding-api.open-meteo.com/v1"
/// weather_base_url = "https://api.open-meteo.com/v1"
///
/// [autocomplete]
/// debounce_ms = 300
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub geocoding_base_url: String,
    pub weather_base_url: String,
    pub request_timeout_secs: u64,
    /// How long successful lookups stay fresh; 0 disables caching.
    pub cache_ttl_secs: u64,
    pub autocomplete: AutocompleteSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geocoding_base_url: DEFAULT_GEOCODING_BASE_URL.to_string(),
            weather_base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
            request_timeout_secs: 10,
            cache_ttl_secs: 300,
            autocomplete: AutocompleteSettings::default(),
        }
    }
}

impl Config {
    /// Full URL of the geocoding search endpoint.
    pub fn geocoding_search_url(&self) -> String {
        join_url(&self.geocoding_base_url, GEOCODING_SEARCH_PATH)
    }

    /// Full URL of the forecast endpoint.
    pub fn weather_forecast_url(&self) -> String {
        join_url(&self.weather_base_url, WEATHER_FORECAST_PATH)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }

    /// Load config from disk (or defaults on first run), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = Self::load_file()?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load_file() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
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

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply base URL overrides from an arbitrary key lookup. Blank values are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_GEOCODING_URL).filter(|v| !v.trim().is_empty()) {
            self.geocoding_base_url = url;
        }
        if let Some(url) = lookup(ENV_WEATHER_URL).filter(|v| !v.trim().is_empty()) {
            self.weather_base_url = url;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.geocoding_base_url.trim().is_empty() {
            return Err(anyhow!("geocoding_base_url must not be empty"));
        }
        if self.weather_base_url.trim().is_empty() {
            return Err(anyhow!("weather_base_url must not be empty"));
        }
        if self.autocomplete.max_suggestions == 0 {
            return Err(anyhow!("autocomplete.max_suggestions must be at least 1"));
        }
        Ok(())
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
