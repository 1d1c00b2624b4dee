//! Geometry catalog: per-asset solidity masks and default decoration heights
//!
//! The catalog is loaded from `ids.json`, owned by the editing session and
//! passed by reference to anything that needs geometry. Levels only store
//! asset ids.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::json::to_readable_json;

/// Index of the top-left quadrant in a [`GeoMask`]
pub const TOP_LEFT: usize = 0;
/// Index of the bottom-left quadrant in a [`GeoMask`]
pub const BOTTOM_LEFT: usize = 1;
/// Index of the top-right quadrant in a [`GeoMask`]
pub const TOP_RIGHT: usize = 2;
/// Index of the bottom-right quadrant in a [`GeoMask`]
pub const BOTTOM_RIGHT: usize = 3;

/// Four-quadrant solidity mask, ordered `[topLeft, bottomLeft, topRight, bottomRight]`
///
/// Quadrant `(sub_x, sub_y)` lives at index `sub_x * 2 + sub_y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[i64; 4]", into = "[u8; 4]")]
pub struct GeoMask(pub [bool; 4]);

impl GeoMask {
    pub const EMPTY: GeoMask = GeoMask([false; 4]);
    pub const SOLID: GeoMask = GeoMask([true; 4]);

    pub fn quadrant_index(sub_x: i32, sub_y: i32) -> usize {
        (sub_x.rem_euclid(2) * 2 + sub_y.rem_euclid(2)) as usize
    }

    /// Fine-cell offset `(sub_x, sub_y)` of a quadrant index
    pub fn quadrant_offset(index: usize) -> (i32, i32) {
        ((index / 2) as i32, (index % 2) as i32)
    }

    pub fn is_solid(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    pub fn toggle(&mut self, index: usize) {
        if let Some(q) = self.0.get_mut(index) {
            *q = !*q;
        }
    }

    pub fn xor(self, other: GeoMask) -> GeoMask {
        let mut out = self;
        for (q, o) in out.0.iter_mut().zip(other.0) {
            *q ^= o;
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|q| !q)
    }
}

impl From<[i64; 4]> for GeoMask {
    fn from(raw: [i64; 4]) -> Self {
        GeoMask(raw.map(|q| q != 0))
    }
}

impl From<GeoMask> for [u8; 4] {
    fn from(mask: GeoMask) -> Self {
        mask.0.map(u8::from)
    }
}

/// Which list of the catalog an id belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Tile,
    Decoration,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Tile => write!(f, "tile_ids"),
            AssetKind::Decoration => write!(f, "deco_ids"),
        }
    }
}

/// Errors that can occur when loading or editing the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate id {id} in {kind}")]
    DuplicateId { kind: AssetKind, id: u32 },
}

/// Catalog entry for a tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileEntry {
    pub id: u32,
    /// Texture reference, opaque to the core
    pub tex: String,
    #[serde(default)]
    pub geo: Option<GeoMask>,
}

/// Catalog entry for a decoration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoEntry {
    pub id: u32,
    pub tex: String,
    #[serde(default)]
    pub geo: Option<GeoMask>,
    /// Default stacking height for new placements
    #[serde(default)]
    pub height: i32,
}

/// On-disk layout of `ids.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogFile {
    tile_ids: Vec<TileEntry>,
    deco_ids: Vec<DecoEntry>,
}

/// Lookup table from asset id to geometry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryCatalog {
    tiles: BTreeMap<u32, TileEntry>,
    decos: BTreeMap<u32, DecoEntry>,
}

impl GeometryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from an `ids.json` file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&content)?;
        log::info!(
            "Loaded geometry catalog {:?}: {} tiles, {} decorations",
            path,
            catalog.tiles.len(),
            catalog.decos.len()
        );
        Ok(catalog)
    }

    /// Parse a catalog, rejecting duplicate ids within either list
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for entry in file.tile_ids {
            catalog.insert_tile(entry)?;
        }
        for entry in file.deco_ids {
            catalog.insert_decoration(entry)?;
        }
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String, CatalogError> {
        let file = CatalogFile {
            tile_ids: self.tiles.values().cloned().collect(),
            deco_ids: self.decos.values().cloned().collect(),
        };
        Ok(to_readable_json(&file)?)
    }

    /// Write the catalog back to disk
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved geometry catalog to {:?}", path);
        Ok(())
    }

    pub fn insert_tile(&mut self, entry: TileEntry) -> Result<(), CatalogError> {
        if self.tiles.contains_key(&entry.id) {
            return Err(CatalogError::DuplicateId {
                kind: AssetKind::Tile,
                id: entry.id,
            });
        }
        self.tiles.insert(entry.id, entry);
        Ok(())
    }

    pub fn insert_decoration(&mut self, entry: DecoEntry) -> Result<(), CatalogError> {
        if self.decos.contains_key(&entry.id) {
            return Err(CatalogError::DuplicateId {
                kind: AssetKind::Decoration,
                id: entry.id,
            });
        }
        self.decos.insert(entry.id, entry);
        Ok(())
    }

    /// Append an imported tile under the next free id
    pub fn import_tile(&mut self, tex: impl Into<String>, geo: Option<GeoMask>) -> u32 {
        let id = next_id(self.tiles.keys());
        self.tiles.insert(
            id,
            TileEntry {
                id,
                tex: tex.into(),
                geo,
            },
        );
        id
    }

    /// Append an imported decoration under the next free id
    pub fn import_decoration(
        &mut self,
        tex: impl Into<String>,
        geo: Option<GeoMask>,
        height: i32,
    ) -> u32 {
        let id = next_id(self.decos.keys());
        self.decos.insert(
            id,
            DecoEntry {
                id,
                tex: tex.into(),
                geo,
                height,
            },
        );
        id
    }

    pub fn tile(&self, id: u32) -> Option<&TileEntry> {
        self.tiles.get(&id)
    }

    pub fn decoration(&self, id: u32) -> Option<&DecoEntry> {
        self.decos.get(&id)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &TileEntry> {
        self.tiles.values()
    }

    pub fn decorations(&self) -> impl Iterator<Item = &DecoEntry> {
        self.decos.values()
    }

    /// Solidity mask of a tile, if the catalog defines one
    pub fn tile_geo(&self, id: u32) -> Option<GeoMask> {
        self.tiles.get(&id).and_then(|e| e.geo)
    }

    /// Solidity mask of a decoration, if the catalog defines one
    pub fn decoration_geo(&self, id: u32) -> Option<GeoMask> {
        self.decos.get(&id).and_then(|e| e.geo)
    }

    /// Default placement height of a decoration
    pub fn decoration_height(&self, id: u32) -> Option<i32> {
        self.decos.get(&id).map(|e| e.height)
    }

    /// Flip one quadrant of an asset's mask, creating an empty mask if needed
    ///
    /// Returns `false` when the id has no catalog entry.
    pub fn toggle_quadrant(&mut self, kind: AssetKind, id: u32, quadrant: usize) -> bool {
        let geo = match kind {
            AssetKind::Tile => self.tiles.get_mut(&id).map(|e| &mut e.geo),
            AssetKind::Decoration => self.decos.get_mut(&id).map(|e| &mut e.geo),
        };
        match geo {
            Some(geo) => {
                geo.get_or_insert(GeoMask::EMPTY).toggle(quadrant);
                true
            }
            None => false,
        }
    }
}

fn next_id<'a>(ids: impl Iterator<Item = &'a u32>) -> u32 {
    ids.max().map_or(1, |max| max + 1)
}
