use crate::ConsoleError;
use crate::app_config::app_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

/// Client-side settings that persist between sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
}

pub trait PreferenceStore: Send + Sync {
    fn load(&self) -> Result<Preferences, ConsoleError>;

    fn save(&self, preferences: &Preferences) -> Result<(), ConsoleError>;
}

/// Preferences kept as JSON in `prefs.json`.
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new() -> Result<Self, ConsoleError> {
        Ok(Self {
            path: app_dir()?.join("prefs.json"),
        })
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> Result<Preferences, ConsoleError> {
        if !self.path.exists() {
            return Ok(Preferences::default());
        }

        let content = fs::read_to_string(&self.path).map_err(ConsoleError::IoError)?;
        match serde_json::from_str(&content) {
            Ok(preferences) => Ok(preferences),
            Err(e) => {
                log::warn!(
                    "Ignoring unreadable preferences at {}: {}",
                    self.path.display(),
                    e
                );
                Ok(Preferences::default())
            }
        }
    }

    fn save(&self, preferences: &Preferences) -> Result<(), ConsoleError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(ConsoleError::IoError)?;
        }

        let content = serde_json::to_string_pretty(preferences)
            .map_err(|e| ConsoleError::InvalidConfig(e.to_string()))?;
        fs::write(&self.path, content).map_err(ConsoleError::IoError)?;

        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPreferenceStore {
    preferences: Mutex<Preferences>,
}

impl MemoryPreferenceStore {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            preferences: Mutex::new(preferences),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Preferences, ConsoleError> {
        Ok(self
            .preferences
            .lock()
            .map(|prefs| prefs.clone())
            .unwrap_or_default())
    }

    fn save(&self, preferences: &Preferences) -> Result<(), ConsoleError> {
        if let Ok(mut stored) = self.preferences.lock() {
            *stored = preferences.clone();
        }
        Ok(())
    }
}
