//! Preferences file save/load operations

use super::EditorPreferences;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PREFERENCES_FILE: &str = "preferences.toml";

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Serialize error: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Could not determine config directory")]
    NoConfigDir,
}

impl EditorPreferences {
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "world_builder", "world_builder")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn preferences_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join(PREFERENCES_FILE))
    }

    /// Load preferences from the config directory, returning defaults on any failure
    pub fn load() -> Self {
        let loaded = Self::preferences_path()
            .ok_or(PreferencesError::NoConfigDir)
            .and_then(|path| Self::load_from_path(&path));
        match loaded {
            Ok(prefs) => prefs,
            Err(e) => {
                log::warn!("Could not load preferences: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Load preferences from a specific file; a missing file yields defaults
    pub fn load_from_path(path: &Path) -> Result<Self, PreferencesError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save preferences to the config directory
    pub fn save(&self) -> Result<(), PreferencesError> {
        let path = Self::preferences_path().ok_or(PreferencesError::NoConfigDir)?;
        self.save_to_path(&path)
    }

    /// Save preferences to a specific file, creating its directory
    pub fn save_to_path(&self, path: &Path) -> Result<(), PreferencesError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        log::info!("Saved preferences to {:?}", path);
        Ok(())
    }
}
