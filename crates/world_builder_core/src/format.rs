//! Level file format
//!
//! A level is stored as a JSON object:
//!
//! ```json
//! {
//!     "tilemap": [[0, 1, 1], [0, 0, 2]],
//!     "decomap": [[9, 1, 0, 2, 0]],
//!     "loading_zones": [{ "zone": [2, 1], "target_level": "cave", "target_pos": [3, 4, 0] }],
//!     "lightmap": [{ "pos": [1.0, 1.0], "diameter": 3.0, "blacklight": false,
//!                    "red": { "amplitude": 1.0, "inner_diameter": 0.0, "outer_diameter": 3.0 },
//!                    "green": { ... }, "blue": { ... } }],
//!     "height_zones": [{ "zone": [0, 1, 2], "target_height": 1 }],
//!     "spawn": [1, 1],
//!     "world_pos": [0, 0],
//!     "name": "entrance"
//! }
//! ```
//!
//! Decorations are written as `(deco_id, x, y, height, render_offset)` in
//! render order. Older files store `(deco_id, x, y)` and take their height
//! from the geometry catalog. The collider grid is never stored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::catalog::GeometryCatalog;
use crate::json::to_readable_json;
use crate::level::Level;
use crate::registry::ProjectRegistry;
use crate::tile_grid::{GridShapeError, TileGrid};
use crate::zones::{ColorFade, GridPos, HeightZone, Light, LightPos, LoadingZone, SlicePos};

/// Keys every level document must carry
pub const REQUIRED_KEYS: [&str; 7] = [
    "tilemap",
    "decomap",
    "loading_zones",
    "lightmap",
    "height_zones",
    "spawn",
    "name",
];

/// Errors that abort loading or saving a level
#[derive(Debug, Error)]
pub enum LevelFormatError {
    #[error("failed to access level file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed level document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("level document is not a JSON object")]
    NotAnObject,
    #[error("level document is missing required key '{0}'")]
    MissingKey(&'static str),
    #[error("invalid tilemap: {0}")]
    Tilemap(#[from] GridShapeError),
}

/// Recoverable oddities found while loading
#[derive(Debug, Clone, PartialEq)]
pub enum LoadWarning {
    /// Neither the project nor the file placed the level; it was put at `[0, 0]`
    MissingWorldPos { level: String },
    /// A legacy decoration entry referenced an id the catalog does not know
    UnknownDecoration { deco_id: u32, x: i32, y: i32 },
    /// Two lights shared a position; the later entry was kept
    DuplicateLight { x: f64, y: f64 },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::MissingWorldPos { level } => {
                write!(f, "no world position for level '{level}', using [0, 0]")
            }
            LoadWarning::UnknownDecoration { deco_id, x, y } => write!(
                f,
                "decoration {deco_id} at ({x}, {y}) is not in the catalog, using height 0"
            ),
            LoadWarning::DuplicateLight { x, y } => {
                write!(f, "more than one light at ({x}, {y}), keeping the last")
            }
        }
    }
}

/// A successfully loaded level and anything worth telling the user about it
#[derive(Debug, Clone)]
pub struct LoadedLevel {
    pub level: Level,
    pub warnings: Vec<LoadWarning>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum DecoRecord {
    Current(u32, i32, i32, i32, i32),
    Legacy(u32, i32, i32),
}

#[derive(Debug, Serialize, Deserialize)]
struct LoadingZoneRecord {
    zone: [i32; 2],
    target_level: String,
    target_pos: [i32; 3],
}

#[derive(Debug, Serialize, Deserialize)]
struct LightRecord {
    pos: [f64; 2],
    diameter: f32,
    blacklight: bool,
    red: ColorFade,
    green: ColorFade,
    blue: ColorFade,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
struct HeightZoneRecord {
    zone: [i32; 3],
    target_height: i32,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Serialize, Deserialize)]
struct LevelDocument {
    tilemap: Vec<Vec<u32>>,
    decomap: Vec<DecoRecord>,
    loading_zones: Vec<LoadingZoneRecord>,
    lightmap: Vec<LightRecord>,
    height_zones: Vec<HeightZoneRecord>,
    spawn: [i32; 2],
    #[serde(default)]
    world_pos: Option<[i32; 2]>,
    name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    ignore_from_project: bool,
}

impl From<&Level> for LevelDocument {
    fn from(level: &Level) -> Self {
        Self {
            tilemap: level.tiles.rows().map(|row| row.to_vec()).collect(),
            decomap: level
                .decos
                .render_order()
                .into_iter()
                .map(|d| DecoRecord::Current(d.deco_id, d.x, d.y, d.height, d.render_offset))
                .collect(),
            loading_zones: level
                .loading_zones
                .iter()
                .map(|(pos, zone)| LoadingZoneRecord {
                    zone: [pos.x, pos.y],
                    target_level: zone.target_level.clone(),
                    target_pos: zone.target_pos,
                })
                .collect(),
            lightmap: level
                .lights
                .iter()
                .map(|(pos, light)| LightRecord {
                    pos: [pos.x, pos.y],
                    diameter: light.diameter,
                    blacklight: light.blacklight,
                    red: light.red,
                    green: light.green,
                    blue: light.blue,
                    active: light.active,
                })
                .collect(),
            height_zones: level
                .height_zones
                .iter()
                .map(|(pos, zone)| HeightZoneRecord {
                    zone: [pos.x, pos.y, pos.z],
                    target_height: zone.target_height,
                })
                .collect(),
            spawn: level.spawn,
            world_pos: Some(level.world_pos),
            name: level.name.clone(),
            ignore_from_project: level.ignore_from_project,
        }
    }
}

impl LevelDocument {
    fn into_level(
        self,
        catalog: &GeometryCatalog,
        registry: Option<&dyn ProjectRegistry>,
    ) -> Result<LoadedLevel, LevelFormatError> {
        let tiles = TileGrid::from_rows(self.tilemap)?;
        let mut level = Level::with_tiles(self.name, tiles);
        let mut warnings = Vec::new();

        for record in self.decomap {
            match record {
                DecoRecord::Current(deco_id, x, y, height, render_offset) => {
                    level.decos.add(deco_id, x, y, height, render_offset);
                }
                DecoRecord::Legacy(deco_id, x, y) => {
                    let height = match catalog.decoration_height(deco_id) {
                        Some(height) => height,
                        None => {
                            if deco_id != 0 {
                                warnings.push(LoadWarning::UnknownDecoration { deco_id, x, y });
                            }
                            0
                        }
                    };
                    level.decos.add(deco_id, x, y, height, 0);
                }
            }
        }

        for record in self.loading_zones {
            level.loading_zones.insert(
                GridPos::new(record.zone[0], record.zone[1]),
                LoadingZone::new(record.target_level, record.target_pos),
            );
        }

        for record in self.lightmap {
            let [x, y] = record.pos;
            let light = Light {
                diameter: record.diameter,
                red: record.red,
                green: record.green,
                blue: record.blue,
                blacklight: record.blacklight,
                active: record.active,
            };
            if level.lights.insert(LightPos::new(x, y), light).is_some() {
                warnings.push(LoadWarning::DuplicateLight { x, y });
            }
        }

        for record in self.height_zones {
            let [x, y, z] = record.zone;
            level.height_zones.insert(
                SlicePos::new(x, y, z),
                HeightZone {
                    target_height: record.target_height,
                },
            );
        }

        level.spawn = self.spawn;
        level.ignore_from_project = self.ignore_from_project;
        level.world_pos = match registry.and_then(|r| r.world_pos(&level.name)) {
            Some(pos) => pos,
            None => match self.world_pos {
                Some(pos) => pos,
                None => {
                    warnings.push(LoadWarning::MissingWorldPos {
                        level: level.name.clone(),
                    });
                    [0, 0]
                }
            },
        };

        for warning in &warnings {
            log::warn!("Level '{}': {}", level.name, warning);
        }

        Ok(LoadedLevel { level, warnings })
    }
}

/// Serialize a level to its JSON document
pub fn level_to_string(level: &Level) -> Result<String, LevelFormatError> {
    let document = LevelDocument::from(level);
    Ok(to_readable_json(&document)?)
}

/// Parse a level document
///
/// `catalog` supplies heights for legacy decoration entries; `registry`, when
/// present, overrides the level's world position.
pub fn level_from_str(
    json: &str,
    catalog: &GeometryCatalog,
    registry: Option<&dyn ProjectRegistry>,
) -> Result<LoadedLevel, LevelFormatError> {
    let value: Value = serde_json::from_str(json)?;
    let object = value.as_object().ok_or(LevelFormatError::NotAnObject)?;
    if let Some(missing) = REQUIRED_KEYS.iter().find(|key| !object.contains_key(**key)) {
        return Err(LevelFormatError::MissingKey(*missing));
    }

    let document: LevelDocument = serde_json::from_value(value)?;
    document.into_level(catalog, registry)
}

/// Load a level file
pub fn load_level(
    path: &Path,
    catalog: &GeometryCatalog,
    registry: Option<&dyn ProjectRegistry>,
) -> Result<LoadedLevel, LevelFormatError> {
    let content = std::fs::read_to_string(path)?;
    let loaded = level_from_str(&content, catalog, registry)?;
    log::info!(
        "Loaded level '{}' ({}x{}) from {:?}",
        loaded.level.name,
        loaded.level.width(),
        loaded.level.height(),
        path
    );
    Ok(loaded)
}

/// Write a level file
pub fn save_level(level: &Level, path: &Path) -> Result<(), LevelFormatError> {
    std::fs::write(path, level_to_string(level)?)?;
    log::info!("Saved level '{}' to {:?}", level.name, path);
    Ok(())
}
