//! Harness configuration: data/model locations, timeouts and search settings.
//!
//! Values come from defaults, then an optional JSON settings file, then
//! environment variables (highest precedence).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::search::{bing, BingWebSearchAdapter, SearchError};

pub const DEFAULT_DATA_PATH: &str = "Data/MLBBaseballBattersPositionPlayers.csv";
pub const DEFAULT_MODEL_PATH: &str = "Models/InductedToHoF-GeneralizedAdditiveModels.json";
pub const DEFAULT_SETTINGS_FILES: [&str; 2] = ["local.settings.json", "secrets.settings.json"];
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: bing::DEFAULT_BASE_URL.to_string(),
            timeout: bing::DEFAULT_TIMEOUT,
        }
    }
}

impl SearchConfig {
    pub fn build_adapter(&self) -> Result<BingWebSearchAdapter, SearchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SearchError::config("search API key not configured"))?;
        BingWebSearchAdapter::with_config(api_key, &self.base_url, self.timeout)
    }
}

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    /// Bound on the table read and the artifact load.
    pub load_timeout: Duration,
    pub search: SearchConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            search: SearchConfig::default(),
        }
    }
}

/// `{"BingSearch": {"APIKey": "...", "BaseUrl": "..."}}`
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(rename = "BingSearch", default)]
    bing_search: Option<BingSettings>,
    #[serde(rename = "DataPath", default)]
    data_path: Option<PathBuf>,
    #[serde(rename = "ModelPath", default)]
    model_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct BingSettings {
    #[serde(rename = "APIKey", default)]
    api_key: Option<String>,
    #[serde(rename = "BaseUrl", default)]
    base_url: Option<String>,
}

impl HarnessConfig {
    /// Defaults, then the default settings files in the working directory
    /// (when present), then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for name in DEFAULT_SETTINGS_FILES {
            let path = Path::new(name);
            if path.is_file() {
                config.apply_settings_file(path)?;
            }
        }
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Merge a JSON settings file into this config.
    pub fn apply_settings_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: SettingsFile =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(bing) = settings.bing_search {
            if let Some(key) = bing.api_key.filter(|k| !k.trim().is_empty()) {
                self.search.api_key = Some(key);
            }
            if let Some(url) = bing.base_url {
                self.search.base_url = url;
            }
        }
        if let Some(path) = settings.data_path {
            self.data_path = path;
        }
        if let Some(path) = settings.model_path {
            self.model_path = path;
        }
        Ok(())
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let seconds = |key: &str| {
            lookup(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
        };

        if let Some(path) = lookup("HOF_DATA_PATH") {
            self.data_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("HOF_MODEL_PATH") {
            self.model_path = PathBuf::from(path);
        }
        if let Some(timeout) = seconds("HOF_LOAD_TIMEOUT_SECONDS") {
            self.load_timeout = timeout;
        }
        if let Some(key) = lookup("BING_SEARCH_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.search.api_key = Some(key);
        }
        if let Some(url) = lookup("BING_SEARCH_BASE_URL") {
            self.search.base_url = url;
        }
        if let Some(timeout) = seconds("BING_SEARCH_TIMEOUT_SECONDS") {
            self.search.timeout = timeout;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("local.settings.json");
        std::fs::write(
            &settings,
            r#"{"BingSearch": {"APIKey": "from-file", "BaseUrl": "http://file"}, "DataPath": "d.csv"}"#,
        )
        .unwrap();

        let mut config = HarnessConfig::default();
        config.apply_settings_file(&settings).unwrap();
        assert_eq!(config.search.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.search.base_url, "http://file");
        assert_eq!(config.data_path, PathBuf::from("d.csv"));

        let env: HashMap<&str, &str> = HashMap::from([
            ("BING_SEARCH_API_KEY", "from-env"),
            ("HOF_LOAD_TIMEOUT_SECONDS", "5"),
            ("BING_SEARCH_TIMEOUT_SECONDS", "nope"),
        ]);
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.search.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.load_timeout, Duration::from_secs(5));
        assert_eq!(config.search.timeout, bing::DEFAULT_TIMEOUT);
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
    }

    #[test]
    fn missing_key_cannot_build_adapter() {
        let err = SearchConfig::default().build_adapter().unwrap_err();
        assert!(matches!(err, SearchError::Config(_)));
    }

    #[test]
    fn malformed_settings_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("broken.json");
        std::fs::write(&settings, "{").unwrap();
        let err = HarnessConfig::default()
            .apply_settings_file(&settings)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
