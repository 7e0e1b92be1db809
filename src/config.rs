//! Persistent portal configuration model and file-backed manager.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use hcms_api::config::DEFAULT_API_BASE;

/// Backend origin baked in at build time, if any.
pub fn build_time_api_base() -> Option<&'static str> {
    option_env!("HCMS_API_BASE_URL").filter(|value| !value.trim().is_empty())
}

/// Site key baked in at build time for single-site deployments.
pub fn build_time_site_key() -> Option<&'static str> {
    option_env!("HCMS_SITE_KEY").filter(|value| !value.trim().is_empty())
}

fn default_api_base_url() -> String {
    build_time_api_base()
        .unwrap_or(DEFAULT_API_BASE)
        .to_string()
}

fn default_accept_language() -> String {
    "ko-KR".to_string()
}

fn default_sidebar_open() -> bool {
    false
}

/// Application configuration persisted on disk: backend origin, default site key and UI preferences.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    pub site_key: Option<String>,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    #[serde(default = "default_sidebar_open")]
    pub sidebar_open: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            site_key: build_time_site_key().map(str::to_string),
            accept_language: default_accept_language(),
            sidebar_open: default_sidebar_open(),
        }
    }
}

impl Config {
    /// Trims user-edited values and restores defaults for blanks.
    pub fn normalized(mut self) -> Self {
        let base = self.api_base_url.trim().trim_end_matches('/').to_string();
        self.api_base_url = if base.is_empty() {
            default_api_base_url()
        } else {
            base
        };
        self.site_key = self
            .site_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        if self.accept_language.trim().is_empty() {
            self.accept_language = default_accept_language();
        }
        self
    }
}

/// Loads and saves [`Config`] as JSON in the platform-specific config directory.
#[derive(Clone, Debug)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Creates a manager bound to the platform-specific app config path.
    pub fn new() -> Result<Self, String> {
        let dirs = directories::ProjectDirs::from("kr", "hcms", "hcms-portal")
            .ok_or_else(|| "Could not determine config directory".to_string())?;
        let path = dirs.config_dir().join("config.json");
        Ok(Self { path })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads config from disk, falling back to defaults on read/parse errors.
    pub fn load(&self) -> Config {
        if self.path.exists() {
            let content = fs::read_to_string(&self.path).unwrap_or_default();
            serde_json::from_str::<Config>(&content)
                .unwrap_or_default()
                .normalized()
        } else {
            Config::default()
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), std::io::Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
