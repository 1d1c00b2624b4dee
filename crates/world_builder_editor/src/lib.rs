//! world_builder_editor - Headless level editor built on world_builder_core
//!
//! This crate provides everything an editor front end drives:
//! - Editing sessions with multiple open level views
//! - Snapshot undo/redo per view
//! - Editing layers (tiles, decorations, collision, zones, lights)
//! - Project index with world-map placement of levels
//! - Persistent editor preferences
//!
//! # Usage
//!
//! ```rust,ignore
//! use world_builder_editor::layers::Brush;
//! use world_builder_editor::preferences::EditorPreferences;
//! use world_builder_editor::session::EditorSession;
//!
//! let mut session = EditorSession::with_catalog_file("ids.json".as_ref(), EditorPreferences::load())?;
//! let view = session.open_level("levels/cave.json".as_ref(), None)?;
//! session.begin_edit(view)?;
//! session.paint(view, 3, 4, &Brush::Tile(2))?;
//! session.end_edit(view)?;
//! session.save_view(view)?;
//! ```

pub mod commands;
pub mod layers;
pub mod preferences;
pub mod project;
pub mod session;

pub use world_builder_core;

pub use commands::EditHistory;
pub use layers::{Brush, DrawCommand, EditLayer, LayerBehavior, LayerContext, PaneOption};
pub use preferences::EditorPreferences;
pub use project::{ProjectError, ProjectIndex};
pub use session::{EditorSession, LevelView, SessionError, ZoneTransition};
