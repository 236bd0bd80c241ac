use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{model::Coordinate, provider::ProviderId};

/// Configuration for a single provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    /// Overrides the provider's endpoint, e.g. for a proxy or a mock server.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// The map point shown when no location is given on the command line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for LocationConfig {
    /// Tokyo Station.
    fn default() -> Self {
        Self { latitude: 35.6812, longitude: 139.7671 }
    }
}

impl LocationConfig {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Minimum seconds between two reverse geocodes.
    pub geocode_cooldown_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { geocode_cooldown_secs: 10 }
    }
}

impl SessionConfig {
    pub fn geocode_cooldown(&self) -> Duration {
        Duration::from_secs(self.geocode_cooldown_secs)
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "openmeteo" or "openweather".
    pub default_provider: Option<String>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub location: LocationConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    ///
    /// Falls back to Open-Meteo, which works without credentials.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        match self.default_provider.as_deref() {
            Some(s) => ProviderId::try_from(s),
            None => Ok(ProviderId::OpenMeteo),
        }
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
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

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "otenki", "otenki")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Convenience helper: set/replace a provider API key and optionally set default provider.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.entry(provider_id.as_str().to_string()).or_default().api_key = Some(api_key);

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers.get(provider_id.as_str()).and_then(|cfg| cfg.api_key.as_deref())
    }

    /// A provider is ready when it either needs no key or has one stored.
    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        !provider_id.requires_api_key() || self.provider_api_key(provider_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    #[test]
    fn default_provider_id_falls_back_to_open_meteo() {
        let cfg = Config::default();
        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenMeteo);
    }

    #[test]
    fn default_provider_id_rejects_unknown_names() {
        let cfg = Config { default_provider: Some("darksky".into()), ..Config::default() };
        let err = cfg.default_provider_id().unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn set_api_key_and_default_for_provider() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::OpenWeather);

        let key = cfg.provider_api_key(ProviderId::OpenWeather);
        assert_eq!(key, Some("OPEN_KEY"));
        assert!(cfg.is_provider_configured(ProviderId::OpenWeather));
    }

    #[test]
    fn upsert_keeps_base_url_override() {
        let mut cfg = Config::default();
        cfg.providers.insert(
            "openweather".into(),
            ProviderConfig { api_key: None, base_url: Some("http://localhost:9000".into()) },
        );

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "KEY".into());

        let provider = cfg.provider_config(ProviderId::OpenWeather).unwrap();
        assert_eq!(provider.api_key.as_deref(), Some("KEY"));
        assert_eq!(provider.base_url.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn open_meteo_is_configured_without_a_key() {
        let cfg = Config::default();
        assert!(cfg.is_provider_configured(ProviderId::OpenMeteo));
        assert!(!cfg.is_provider_configured(ProviderId::OpenWeather));
    }

    #[test]
    fn set_default_provider_overrides_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());
        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenWeather);

        cfg.set_default_provider(ProviderId::OpenMeteo);
        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenMeteo);
    }

    #[test]
    fn defaults_point_at_tokyo_station() {
        let cfg = Config::default();
        assert_eq!(cfg.location.coordinate(), Coordinate::new(35.6812, 139.7671));
        assert_eq!(cfg.session.geocode_cooldown(), Duration::from_secs(10));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.default_provider.is_none());
        assert!(cfg.providers.is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "KEY".into());
        cfg.location = LocationConfig { latitude: 34.7025, longitude: 135.4959 };
        cfg.session.geocode_cooldown_secs = 30;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.default_provider_id().unwrap(), ProviderId::OpenWeather);
        assert_eq!(loaded.provider_api_key(ProviderId::OpenWeather), Some("KEY"));
        assert_eq!(loaded.location.coordinate(), Coordinate::new(34.7025, 135.4959));
        assert_eq!(loaded.session.geocode_cooldown_secs, 30);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_provider = \"openmeteo\"\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenMeteo);
        assert_eq!(cfg.session.geocode_cooldown_secs, 10);
        assert_eq!(cfg.location.latitude, 35.6812);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_provider = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
