//! Project index save/load operations

use super::ProjectIndex;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use world_builder_core::to_readable_json;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Level '{0}' is listed more than once")]
    DuplicateLevel(String),
    #[error("No file path set")]
    NoPath,
}

impl ProjectIndex {
    /// Load a project index, rejecting duplicate level names
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let content = std::fs::read_to_string(path)?;
        let mut index: ProjectIndex = serde_json::from_str(&content)?;

        let mut seen = HashSet::new();
        for entry in &index.levels {
            if !seen.insert(entry.name.as_str()) {
                return Err(ProjectError::DuplicateLevel(entry.name.clone()));
            }
        }

        index.path = Some(path.to_path_buf());
        index.dirty = false;
        log::info!("Loaded project with {} levels from {:?}", index.levels.len(), path);
        Ok(index)
    }

    pub fn save(&mut self, path: &Path) -> Result<(), ProjectError> {
        let content = to_readable_json(&*self)?;
        std::fs::write(path, content)?;

        self.path = Some(path.to_path_buf());
        self.dirty = false;
        Ok(())
    }

    /// Save to current path if set
    pub fn save_current(&mut self) -> Result<(), ProjectError> {
        if let Some(path) = self.path.clone() {
            self.save(&path)
        } else {
            Err(ProjectError::NoPath)
        }
    }
}
