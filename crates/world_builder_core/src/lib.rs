//! Core data model for world_builder levels
//!
//! This crate holds everything about a level that does not depend on a UI:
//! - `TileGrid` - dense grid of tile ids
//! - `Decomap` - decoration placements with render-order keys
//! - `ZoneMap` - loading zones, lights and height zones keyed by position
//! - `GeometryCatalog` - per-asset collision masks loaded from `ids.json`
//! - `derive_colliders` - double-resolution collider grid derivation
//! - `Level` - the aggregate of all of the above
//! - `format` - JSON level documents, including the legacy decomap format
//! - `coords` - pointer-to-cell mapping for coarse and fine views

mod catalog;
mod collision;
pub mod coords;
mod decomap;
pub mod format;
mod json;
mod level;
mod registry;
mod tile_grid;
mod zones;

pub use catalog::{
    AssetKind, CatalogError, DecoEntry, GeoMask, GeometryCatalog, TileEntry, BOTTOM_LEFT,
    BOTTOM_RIGHT, TOP_LEFT, TOP_RIGHT,
};
pub use collision::{
    collision_owner, derive_colliders, paint_collision, ColliderGrid, CollisionOwner, HeightSlice,
};
pub use coords::{BorderMode, Resolution, ViewMapper};
pub use decomap::{Deco, Decomap};
pub use format::{LevelFormatError, LoadWarning, LoadedLevel};
pub use json::{to_readable_json, ReadableFormatter};
pub use level::Level;
pub use registry::ProjectRegistry;
pub use tile_grid::{
    GridShapeError, GridShift, ResizeError, TileGrid, EMPTY_TILE, MAX_DIMENSION, MIN_HEIGHT,
    MIN_WIDTH,
};
pub use zones::{
    ColorFade, GridPos, HeightZone, HeightZoneMap, Light, LightMap, LightPos, LoadingZone,
    LoadingZoneMap, SlicePos, ZoneKey, ZoneMap,
};
