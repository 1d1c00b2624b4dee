//! Editor preferences and persistent settings
//!
//! Stored as `preferences.toml` in the platform config directory:
//! - Windows: %APPDATA%/world_builder/
//! - Linux: ~/.config/world_builder/
//! - macOS: ~/Library/Application Support/world_builder/

mod file;

pub use file::*;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use world_builder_core::{BorderMode, MAX_DIMENSION, MIN_HEIGHT, MIN_WIDTH};

use crate::commands::DEFAULT_HISTORY_LIMIT;

/// Maximum number of recent levels to track
pub const MAX_RECENT_LEVELS: usize = 10;

/// Editor preferences that persist across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorPreferences {
    /// Version for future migrations
    pub version: u32,

    /// Past snapshots kept per view, 0 for unlimited
    pub history_limit: usize,

    // View defaults
    pub border_mode: BorderMode,
    pub show_collisions: bool,
    /// Size of new levels, `[width, height]`
    pub default_level_size: [u32; 2],

    pub recent_levels: Vec<RecentLevel>,
}

/// A recent level entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentLevel {
    pub path: String,
    pub name: String,
    pub last_opened: u64, // Unix timestamp
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            version: 1,
            history_limit: DEFAULT_HISTORY_LIMIT,
            border_mode: BorderMode::Shown,
            show_collisions: false,
            default_level_size: [MIN_WIDTH, MIN_HEIGHT],
            recent_levels: Vec::new(),
        }
    }
}

impl EditorPreferences {
    /// Add a level to the recent list, most recent first
    pub fn add_recent_level(&mut self, path: PathBuf, name: String) {
        use std::time::{SystemTime, UNIX_EPOCH};

        let path_str = path.to_string_lossy().to_string();
        self.recent_levels.retain(|l| l.path != path_str);
        self.recent_levels.insert(
            0,
            RecentLevel {
                path: path_str,
                name,
                last_opened: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0),
            },
        );
        self.recent_levels.truncate(MAX_RECENT_LEVELS);
    }

    /// Remove a level from the recent list (e.g., if the file no longer exists)
    pub fn remove_recent_level(&mut self, path: &str) {
        self.recent_levels.retain(|l| l.path != path);
    }

    pub fn last_level(&self) -> Option<&RecentLevel> {
        self.recent_levels.first()
    }

    /// Size for new levels, clamped to the editor's size range
    pub fn new_level_size(&self) -> (u32, u32) {
        let [w, h] = self.default_level_size;
        (
            w.clamp(MIN_WIDTH, MAX_DIMENSION),
            h.clamp(MIN_HEIGHT, MAX_DIMENSION),
        )
    }
}
