//! Project index: the list of levels making up a world
//!
//! The index is a small JSON file next to the level files. Level paths are
//! stored relative to the index so a project can be moved as a directory.

mod file;

pub use file::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use world_builder_core::{Level, ProjectRegistry};

/// One level listed in the project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelEntry {
    pub name: String,
    /// Path relative to the index file
    pub path: String,
    pub world_pos: [i32; 2],
}

/// Project file listing every level and its world-map placement
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectIndex {
    #[serde(default = "default_version")]
    pub version: u32,
    pub levels: Vec<LevelEntry>,
    #[serde(skip)]
    pub path: Option<PathBuf>,
    #[serde(skip)]
    pub dirty: bool,
}

fn default_version() -> u32 {
    1
}

impl ProjectIndex {
    pub fn new() -> Self {
        Self {
            version: default_version(),
            ..Self::default()
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Directory level paths are resolved against
    pub fn base_dir(&self) -> PathBuf {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    pub fn entry(&self, name: &str) -> Option<&LevelEntry> {
        self.levels.iter().find(|e| e.name == name)
    }

    /// Add or update the entry for a saved level
    ///
    /// Levels flagged `ignore_from_project` are not listed. Returns whether the
    /// index changed.
    pub fn record_level(&mut self, level: &Level, level_path: &Path) -> bool {
        if level.ignore_from_project {
            return false;
        }

        let base = self.base_dir();
        let relative = level_path.strip_prefix(&base).unwrap_or(level_path);
        let entry = LevelEntry {
            name: level.name.clone(),
            path: relative.to_string_lossy().replace('\\', "/"),
            world_pos: level.world_pos,
        };

        match self.levels.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) if *existing == entry => return false,
            Some(existing) => *existing = entry,
            None => self.levels.push(entry),
        }
        self.mark_dirty();
        true
    }

    pub fn remove_level(&mut self, name: &str) -> Option<LevelEntry> {
        let idx = self.levels.iter().position(|e| e.name == name)?;
        self.mark_dirty();
        Some(self.levels.remove(idx))
    }
}

impl ProjectRegistry for ProjectIndex {
    fn world_pos(&self, level_name: &str) -> Option<[i32; 2]> {
        self.entry(level_name).map(|e| e.world_pos)
    }

    fn level_path(&self, level_name: &str) -> Option<PathBuf> {
        self.entry(level_name).map(|e| self.base_dir().join(&e.path))
    }
}
