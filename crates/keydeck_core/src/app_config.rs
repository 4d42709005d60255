use crate::ConsoleError;
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::refresh_policy::RefreshPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

pub(crate) fn app_dir() -> Result<PathBuf, ConsoleError> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        ConsoleError::IoError(std::io::Error::other("Could not find config directory"))
    })?;

    let app_dir = config_dir.join("keydeck");
    fs::create_dir_all(&app_dir).map_err(ConsoleError::IoError)?;
    Ok(app_dir)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default)]
    pub stats_refresh: RefreshPolicy,

    /// Per-request timeout. Requests wait indefinitely when unset.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            stats_refresh: RefreshPolicy::default(),
            request_timeout_secs: None,
        }
    }
}

impl ConsoleConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<(), ConsoleError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConsoleError::InvalidConfig(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }

        if self.page_size == 0 {
            return Err(ConsoleError::InvalidConfig(
                "page_size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

pub struct ConsoleConfigStore {
    path: PathBuf,
}

impl ConsoleConfigStore {
    pub fn new() -> Result<Self, ConsoleError> {
        Ok(Self {
            path: app_dir()?.join("config.json"),
        })
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the config file; a missing file yields the defaults.
    pub fn load(&self) -> Result<ConsoleConfig, ConsoleError> {
        if !self.path.exists() {
            log::debug!("No config at {}, using defaults", self.path.display());
            return Ok(ConsoleConfig::default());
        }

        let content = fs::read_to_string(&self.path).map_err(ConsoleError::IoError)?;
        let config: ConsoleConfig = serde_json::from_str(&content)
            .map_err(|e| ConsoleError::InvalidConfig(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &ConsoleConfig) -> Result<(), ConsoleError> {
        config.validate()?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(ConsoleError::IoError)?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| ConsoleError::InvalidConfig(e.to_string()))?;
        fs::write(&self.path, content).map_err(ConsoleError::IoError)?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
