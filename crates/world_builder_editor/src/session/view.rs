//! A single open level

use std::path::PathBuf;
use uuid::Uuid;
use world_builder_core::{
    BorderMode, GeometryCatalog, HeightSlice, Level, LoadWarning, ViewMapper,
};

use crate::commands::EditHistory;
use crate::layers::{EditLayer, LayerContext};

/// An open level with its own history and view settings
#[derive(Debug, Clone)]
pub struct LevelView {
    pub id: Uuid,
    pub level: Level,
    pub history: EditHistory,
    /// File the level was loaded from or last saved to
    pub path: Option<PathBuf>,
    pub saved: bool,
    pub layer: EditLayer,
    pub slice: HeightSlice,
    pub border: BorderMode,
    /// Anything reported while loading the level
    pub warnings: Vec<LoadWarning>,
}

impl LevelView {
    pub(crate) fn new(level: Level, history: EditHistory, border: BorderMode) -> Self {
        let mut view = Self {
            id: Uuid::new_v4(),
            level,
            history,
            path: None,
            saved: false,
            layer: EditLayer::default(),
            slice: HeightSlice::All,
            border,
            warnings: Vec::new(),
        };
        view.history.backup(&view.level);
        view
    }

    /// Tab title; unsaved views are prefixed with `*`
    pub fn title(&self) -> String {
        if self.saved {
            self.level.name.clone()
        } else {
            format!("*{}", self.level.name)
        }
    }

    pub fn mark_dirty(&mut self) {
        self.saved = false;
    }

    pub fn is_dirty(&self) -> bool {
        !self.saved
    }

    pub fn context(&self) -> LayerContext {
        LayerContext {
            slice: self.slice,
            border: self.border,
        }
    }

    pub fn mapper(&self) -> ViewMapper {
        ViewMapper::new(self.level.width(), self.level.height(), self.border)
    }

    pub fn rederive(&mut self, catalog: &GeometryCatalog) {
        self.level.rederive_collision(catalog, self.slice);
    }
}
