//! Editing session: the open level views and everything they share
//!
//! The session owns the geometry catalog and the preferences, and wires each
//! view's undo history, dirty flag and collider grid together. Mutations go
//! through a `begin_edit`/`end_edit` bracket so every gesture becomes one
//! undo step.

mod view;

pub use view::LevelView;

use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;
use world_builder_core::format::{load_level, save_level};
use world_builder_core::{
    CatalogError, GeometryCatalog, GridPos, HeightSlice, Level, LevelFormatError, ProjectRegistry,
    ResizeError, TileGrid,
};

use crate::commands::EditHistory;
use crate::layers::{Brush, DrawCommand, EditLayer, LayerBehavior};
use crate::preferences::EditorPreferences;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No open view with id {0}")]
    UnknownView(Uuid),
    #[error("Level '{0}' has never been saved")]
    NoPath(String),
    #[error("Level '{0}' has unsaved changes")]
    Unsaved(String),
    #[error("No active loading zone at ({x}, {y})")]
    NoLoadingZone { x: i32, y: i32 },
    #[error("Level '{0}' is not listed in the project")]
    UnknownLevel(String),
    #[error("No catalog file path set")]
    NoCatalogPath,
    #[error(transparent)]
    Format(#[from] LevelFormatError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Resize(#[from] ResizeError),
}

/// Where following a loading zone leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneTransition {
    pub view: Uuid,
    /// Arrival position `[x, y, z]` in the target level
    pub target_pos: [i32; 3],
}

/// All open views plus the shared catalog
#[derive(Debug)]
pub struct EditorSession {
    pub catalog: GeometryCatalog,
    pub preferences: EditorPreferences,
    catalog_path: Option<PathBuf>,
    catalog_dirty: bool,
    views: Vec<LevelView>,
    active: Option<Uuid>,
}

impl EditorSession {
    pub fn new(catalog: GeometryCatalog, preferences: EditorPreferences) -> Self {
        Self {
            catalog,
            preferences,
            catalog_path: None,
            catalog_dirty: false,
            views: Vec::new(),
            active: None,
        }
    }

    /// Start a session with the catalog loaded from `ids.json`
    pub fn with_catalog_file(
        path: &Path,
        preferences: EditorPreferences,
    ) -> Result<Self, SessionError> {
        let catalog = GeometryCatalog::load(path)?;
        let mut session = Self::new(catalog, preferences);
        session.catalog_path = Some(path.to_path_buf());
        Ok(session)
    }

    pub fn views(&self) -> &[LevelView] {
        &self.views
    }

    pub fn view(&self, id: Uuid) -> Option<&LevelView> {
        self.views.iter().find(|v| v.id == id)
    }

    pub fn view_mut(&mut self, id: Uuid) -> Option<&mut LevelView> {
        self.views.iter_mut().find(|v| v.id == id)
    }

    pub fn active_view(&self) -> Option<&LevelView> {
        self.active.and_then(|id| self.view(id))
    }

    pub fn set_active(&mut self, id: Uuid) -> Result<(), SessionError> {
        self.existing(id)?;
        self.active = Some(id);
        Ok(())
    }

    pub fn title(&self, id: Uuid) -> Option<String> {
        self.view(id).map(LevelView::title)
    }

    /// Draw a view's active layer
    ///
    /// With `show_collisions` set in the preferences the collider cells are
    /// drawn over every other layer as well.
    pub fn draw_view(&self, id: Uuid) -> Result<Vec<DrawCommand>, SessionError> {
        let view = self.existing(id)?;
        let ctx = view.context();
        let mut commands = view.layer.draw_full(&view.level, &self.catalog, &ctx);
        if self.preferences.show_collisions && view.layer != EditLayer::Collision {
            commands.extend(EditLayer::Collision.draw_full(&view.level, &self.catalog, &ctx));
        }
        Ok(commands)
    }

    /// Whether in-session collision painting changed the catalog
    pub fn catalog_dirty(&self) -> bool {
        self.catalog_dirty
    }

    fn existing(&self, id: Uuid) -> Result<&LevelView, SessionError> {
        self.view(id).ok_or(SessionError::UnknownView(id))
    }

    fn view_and_catalog(
        &mut self,
        id: Uuid,
    ) -> Result<(&mut LevelView, &mut GeometryCatalog), SessionError> {
        let view = self
            .views
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or(SessionError::UnknownView(id))?;
        Ok((view, &mut self.catalog))
    }

    fn history(&self) -> EditHistory {
        EditHistory::with_limit(self.preferences.history_limit)
    }

    fn push_view(&mut self, mut view: LevelView) -> Uuid {
        view.rederive(&self.catalog);
        let id = view.id;
        self.views.push(view);
        self.active = Some(id);
        id
    }

    /// Open an empty, untitled level
    pub fn new_view(&mut self) -> Uuid {
        let (width, height) = self.preferences.new_level_size();
        let level = Level::with_tiles("Untitled", TileGrid::new(width, height));
        let view = LevelView::new(level, self.history(), self.preferences.border_mode);
        log::info!("Opened new view {}", view.id);
        self.push_view(view)
    }

    /// Open a level file in a new view
    ///
    /// A level that is already open is activated instead of loaded twice. If
    /// loading fails no view is added.
    pub fn open_level(
        &mut self,
        path: &Path,
        registry: Option<&dyn ProjectRegistry>,
    ) -> Result<Uuid, SessionError> {
        if let Some(view) = self.views.iter().find(|v| v.path.as_deref() == Some(path)) {
            let id = view.id;
            self.active = Some(id);
            return Ok(id);
        }

        let loaded = load_level(path, &self.catalog, registry)?;
        let mut view = LevelView::new(loaded.level, self.history(), self.preferences.border_mode);
        view.path = Some(path.to_path_buf());
        view.saved = true;
        view.warnings = loaded.warnings;

        self.preferences
            .add_recent_level(path.to_path_buf(), view.level.name.clone());
        log::info!("Opened '{}' in view {}", view.level.name, view.id);
        Ok(self.push_view(view))
    }

    /// Save a view to the file it came from
    pub fn save_view(&mut self, id: Uuid) -> Result<(), SessionError> {
        let view = self.existing(id)?;
        let path = view
            .path
            .clone()
            .ok_or_else(|| SessionError::NoPath(view.level.name.clone()))?;
        self.save_view_as(id, &path)
    }

    /// Save a view to a new file, which becomes its path
    pub fn save_view_as(&mut self, id: Uuid, path: &Path) -> Result<(), SessionError> {
        let (view, catalog) = self.view_and_catalog(id)?;
        view.level.decos.sort();
        view.rederive(catalog);
        save_level(&view.level, path)?;

        view.path = Some(path.to_path_buf());
        view.saved = true;
        let name = view.level.name.clone();
        self.preferences.add_recent_level(path.to_path_buf(), name);
        Ok(())
    }

    /// Close a view, refusing while it has unsaved changes unless `force`
    pub fn close_view(&mut self, id: Uuid, force: bool) -> Result<LevelView, SessionError> {
        let idx = self
            .views
            .iter()
            .position(|v| v.id == id)
            .ok_or(SessionError::UnknownView(id))?;
        if self.views[idx].is_dirty() && !force {
            return Err(SessionError::Unsaved(self.views[idx].level.name.clone()));
        }

        let view = self.views.remove(idx);
        if self.active == Some(id) {
            self.active = self.views.last().map(|v| v.id);
        }
        log::info!("Closed view {} ('{}')", id, view.level.name);
        Ok(view)
    }

    /// Snapshot a view before an edit gesture
    pub fn begin_edit(&mut self, id: Uuid) -> Result<(), SessionError> {
        let (view, _) = self.view_and_catalog(id)?;
        view.history.backup(&view.level);
        Ok(())
    }

    /// Snapshot a view after an edit gesture
    ///
    /// Returns whether the gesture changed anything.
    pub fn end_edit(&mut self, id: Uuid) -> Result<bool, SessionError> {
        let (view, catalog) = self.view_and_catalog(id)?;
        let changed = view.history.backup(&view.level);
        if changed {
            view.mark_dirty();
            view.rederive(catalog);
        }
        Ok(changed)
    }

    pub fn undo(&mut self, id: Uuid) -> Result<bool, SessionError> {
        let (view, catalog) = self.view_and_catalog(id)?;
        let changed = view.history.undo(&mut view.level);
        if changed {
            view.mark_dirty();
            view.rederive(catalog);
        }
        Ok(changed)
    }

    pub fn redo(&mut self, id: Uuid) -> Result<bool, SessionError> {
        let (view, catalog) = self.view_and_catalog(id)?;
        let changed = view.history.redo(&mut view.level);
        if changed {
            view.mark_dirty();
            view.rederive(catalog);
        }
        Ok(changed)
    }

    /// Paint one cell on the view's active layer
    pub fn paint(&mut self, id: Uuid, x: i32, y: i32, brush: &Brush) -> Result<bool, SessionError> {
        let (view, catalog) = self.view_and_catalog(id)?;
        let ctx = view.context();
        let changed = view.layer.paint(&mut view.level, catalog, &ctx, x, y, brush);
        self.after_stroke(id, changed);
        Ok(changed)
    }

    /// Erase one cell on the view's active layer
    pub fn erase(&mut self, id: Uuid, x: i32, y: i32) -> Result<bool, SessionError> {
        let (view, catalog) = self.view_and_catalog(id)?;
        let ctx = view.context();
        let changed = view.layer.erase(&mut view.level, catalog, &ctx, x, y);
        self.after_stroke(id, changed);
        Ok(changed)
    }

    fn after_stroke(&mut self, id: Uuid, changed: bool) {
        if !changed {
            return;
        }
        let Some(view) = self.views.iter_mut().find(|v| v.id == id) else {
            return;
        };
        view.mark_dirty();
        if view.layer == EditLayer::Collision {
            // The fine cell is already previewed; the catalog carries the edit
            self.catalog_dirty = true;
        } else {
            view.rederive(&self.catalog);
        }
    }

    pub fn set_layer(&mut self, id: Uuid, layer: EditLayer) -> Result<(), SessionError> {
        let (view, _) = self.view_and_catalog(id)?;
        view.layer = layer;
        Ok(())
    }

    /// Change the height slice and re-derive collision for it
    pub fn set_height_slice(&mut self, id: Uuid, slice: HeightSlice) -> Result<(), SessionError> {
        let (view, catalog) = self.view_and_catalog(id)?;
        view.slice = slice;
        view.rederive(catalog);
        Ok(())
    }

    /// Resize a view's level as one undoable step
    pub fn resize_view(
        &mut self,
        id: Uuid,
        left: i32,
        right: i32,
        up: i32,
        down: i32,
    ) -> Result<(), SessionError> {
        self.begin_edit(id)?;
        let (view, _) = self.view_and_catalog(id)?;
        view.level.resize(left, right, up, down)?;
        self.end_edit(id)?;
        Ok(())
    }

    /// Open the level a loading zone points at
    pub fn follow_loading_zone(
        &mut self,
        id: Uuid,
        x: i32,
        y: i32,
        registry: &dyn ProjectRegistry,
    ) -> Result<ZoneTransition, SessionError> {
        let view = self.existing(id)?;
        let zone = view
            .level
            .loading_zones
            .get(&GridPos::new(x, y))
            .filter(|z| z.is_active())
            .cloned()
            .ok_or(SessionError::NoLoadingZone { x, y })?;

        let path = registry
            .level_path(&zone.target_level)
            .ok_or_else(|| SessionError::UnknownLevel(zone.target_level.clone()))?;
        let target = self.open_level(&path, Some(registry))?;
        Ok(ZoneTransition {
            view: target,
            target_pos: zone.target_pos,
        })
    }

    /// Write the catalog back if collision painting changed it
    pub fn save_catalog(&mut self) -> Result<bool, SessionError> {
        if !self.catalog_dirty {
            return Ok(false);
        }
        let path = self.catalog_path.as_deref().ok_or(SessionError::NoCatalogPath)?;
        self.catalog.save(path)?;
        self.catalog_dirty = false;
        Ok(true)
    }

    pub fn set_catalog_path(&mut self, path: PathBuf) {
        self.catalog_path = Some(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use world_builder_core::{GeoMask, LoadingZone, TileEntry};

    fn session() -> EditorSession {
        let mut catalog = GeometryCatalog::new();
        catalog
            .insert_tile(TileEntry {
                id: 5,
                tex: "wall.png".to_string(),
                geo: Some(GeoMask([true, false, false, true])),
            })
            .unwrap();
        EditorSession::new(catalog, EditorPreferences::default())
    }

    #[test]
    fn test_new_view_is_untitled_and_unsaved() {
        let mut session = session();
        let id = session.new_view();
        assert_eq!(session.title(id).unwrap(), "*Untitled");
        assert_eq!(session.active_view().unwrap().id, id);
        let view = session.view(id).unwrap();
        assert_eq!((view.level.width(), view.level.height()), (18, 11));
        assert_eq!(view.history.past_len(), 1);
    }

    #[test]
    fn test_edit_bracket_undo_redo() {
        let mut session = session();
        let id = session.new_view();
        session.view_mut(id).unwrap().saved = true;

        session.begin_edit(id).unwrap();
        assert!(session.paint(id, 0, 0, &Brush::Tile(5)).unwrap());
        assert!(session.end_edit(id).unwrap());
        assert_eq!(session.title(id).unwrap(), "*Untitled");
        assert_eq!(session.view(id).unwrap().level.collider().solid_count(), 2);

        assert!(session.undo(id).unwrap());
        let view = session.view(id).unwrap();
        assert_eq!(view.level.tiles.get(0, 0), Some(0));
        assert_eq!(view.level.collider().solid_count(), 0);

        assert!(session.redo(id).unwrap());
        assert_eq!(session.view(id).unwrap().level.tiles.get(0, 0), Some(5));
        assert!(!session.redo(id).unwrap());
    }

    #[test]
    fn test_collision_overlay_follows_preferences() {
        let mut session = session();
        let id = session.new_view();
        session.paint(id, 0, 0, &Brush::Tile(5)).unwrap();
        let fine_cells = |commands: &[DrawCommand]| {
            commands
                .iter()
                .filter(|c| matches!(c, DrawCommand::FineCell { .. }))
                .count()
        };

        let plain = session.draw_view(id).unwrap();
        assert_eq!(fine_cells(&plain), 0);
        assert!(!plain.is_empty());

        session.preferences.show_collisions = true;
        let overlaid = session.draw_view(id).unwrap();
        assert_eq!(fine_cells(&overlaid), 2);
        assert_eq!(overlaid.len(), plain.len() + 2);

        session.set_layer(id, EditLayer::Collision).unwrap();
        assert_eq!(fine_cells(&session.draw_view(id).unwrap()), 2);
    }

    #[test]
    fn test_empty_gesture_is_not_recorded() {
        let mut session = session();
        let id = session.new_view();
        session.begin_edit(id).unwrap();
        assert!(!session.end_edit(id).unwrap());
        assert!(!session.undo(id).unwrap());
    }

    #[test]
    fn test_close_refuses_unsaved() {
        let mut session = session();
        let id = session.new_view();
        assert!(matches!(
            session.close_view(id, false),
            Err(SessionError::Unsaved(_))
        ));
        assert!(session.close_view(id, true).is_ok());
        assert!(session.views().is_empty());
        assert!(session.active_view().is_none());
    }

    #[test]
    fn test_save_without_path() {
        let mut session = session();
        let id = session.new_view();
        assert!(matches!(session.save_view(id), Err(SessionError::NoPath(_))));
    }

    #[test]
    fn test_unknown_view() {
        let mut session = session();
        let missing = Uuid::new_v4();
        assert!(matches!(
            session.undo(missing),
            Err(SessionError::UnknownView(_))
        ));
    }

    #[test]
    fn test_resize_is_one_undo_step() {
        let mut session = session();
        let id = session.new_view();
        session.resize_view(id, 0, 2, 0, 0).unwrap();
        assert_eq!(session.view(id).unwrap().level.width(), 20);
        assert!(session.resize_view(id, -10, 0, 0, 0).is_err());

        assert!(session.undo(id).unwrap());
        assert_eq!(session.view(id).unwrap().level.width(), 18);
    }

    #[test]
    fn test_collision_paint_marks_catalog_dirty() {
        let mut session = session();
        let id = session.new_view();
        session.paint(id, 0, 0, &Brush::Tile(5)).unwrap();
        session.set_layer(id, EditLayer::Collision).unwrap();

        assert!(session.paint(id, 1, 0, &Brush::Solid(true)).unwrap());
        assert!(session.catalog_dirty());
        assert_eq!(
            session.catalog.tile_geo(5),
            Some(GeoMask([true, false, true, true]))
        );
        assert!(matches!(
            session.save_catalog(),
            Err(SessionError::NoCatalogPath)
        ));
    }

    #[test]
    fn test_loading_zone_needs_target() {
        struct NoLevels;
        impl ProjectRegistry for NoLevels {
            fn world_pos(&self, _: &str) -> Option<[i32; 2]> {
                None
            }
            fn level_path(&self, _: &str) -> Option<PathBuf> {
                None
            }
        }

        let mut session = session();
        let id = session.new_view();
        assert!(matches!(
            session.follow_loading_zone(id, 2, 2, &NoLevels),
            Err(SessionError::NoLoadingZone { x: 2, y: 2 })
        ));

        session
            .view_mut(id)
            .unwrap()
            .level
            .loading_zones
            .insert(GridPos::new(2, 2), LoadingZone::new("cave", [1, 1, 0]));
        assert!(matches!(
            session.follow_loading_zone(id, 2, 2, &NoLevels),
            Err(SessionError::UnknownLevel(name)) if name == "cave"
        ));
    }
}
