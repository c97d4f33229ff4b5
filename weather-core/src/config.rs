use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::model::{Coordinates, UnitSystem};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_CITY: &str = "London";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Environment variable that overrides [`Config::base_url`].
pub const BASE_URL_ENV: &str = "WEATHER_BASE_URL";

/// Dashboard settings stored on disk.
///
/// The API key is not kept here; it lives in the key-value store
/// (see [`crate::storage::API_KEY_STORAGE_KEY`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// City loaded on start-up.
    pub default_city: String,

    pub units: UnitSystem,

    /// Provider endpoint root, without trailing slash.
    pub base_url: String,

    /// Request timeout for each provider call.
    pub timeout_secs: u64,

    /// Example TOML:
    /// [home]
    /// lat = 51.5072
    /// lon = -0.1276
    pub home: Option<Coordinates>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_city: DEFAULT_CITY.to_string(),
            units: UnitSystem::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            home: None,
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.override_base_url(std::env::var(BASE_URL_ENV).ok());
        Ok(cfg)
    }

    /// Replace the endpoint with `url` unless it is absent or blank.
    pub fn override_base_url(&mut self, url: Option<String>) {
        if let Some(url) = url
            && !url.trim().is_empty()
        {
            self.base_url = url;
        }
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
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

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_run() {
        let cfg = Config::default();

        assert_eq!(cfg.default_city, "London");
        assert_eq!(cfg.units, UnitSystem::Metric);
        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
        assert_eq!(cfg.timeout(), Duration::from_secs(10));
        assert!(cfg.home.is_none());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_file_fills_remaining_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "units = \"imperial\"\n[home]\nlat = 40.7\nlon = -74.0\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();

        assert_eq!(cfg.units, UnitSystem::Imperial);
        assert_eq!(cfg.default_city, "London");
        assert_eq!(cfg.home, Some(Coordinates { lat: 40.7, lon: -74.0 }));
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join("config.toml");

        let cfg = Config {
            default_city: "Oslo".into(),
            units: UnitSystem::Imperial,
            base_url: "http://localhost:9999/".into(),
            timeout_secs: 3,
            home: None,
        };
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.base_url(), "http://localhost:9999");
    }

    #[test]
    fn base_url_override_ignores_blank_values() {
        let mut cfg = Config::default();

        cfg.override_base_url(None);
        cfg.override_base_url(Some("   ".into()));
        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);

        cfg.override_base_url(Some("http://127.0.0.1:8080/".into()));
        assert_eq!(cfg.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "units = 5").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
