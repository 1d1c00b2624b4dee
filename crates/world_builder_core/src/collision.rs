//! Collision grid derived from tile and decoration geometry
//!
//! The collider grid has twice the tile grid's resolution on each axis. Every
//! tile cell `(x, y)` owns the four fine cells `(2x + sub_x, 2y + sub_y)`,
//! addressed through the quadrant order of [`GeoMask`].
//!
//! Derivation is a pure function of the tile grid, the decomap and the
//! catalog:
//! 1. all fine cells start empty,
//! 2. each tile's mask is assigned to its four quadrants,
//! 3. each decoration on the selected height slice is XORed on top, so a
//!    decoration can cancel a quadrant its floor tile made solid.

use serde::{Deserialize, Serialize};

use crate::catalog::{AssetKind, GeoMask, GeometryCatalog};
use crate::decomap::{Deco, Decomap};
use crate::level::Level;
use crate::tile_grid::{TileGrid, EMPTY_TILE};

/// Height filter applied to decorations and height zones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HeightSlice {
    /// No filter: every height is visible and editable
    #[default]
    All,
    /// Only placements at this height
    Only(i32),
}

impl HeightSlice {
    /// Convert the editor's raw slice selector, where `0` means "all heights"
    pub fn from_raw(raw: i32) -> Self {
        if raw == 0 {
            HeightSlice::All
        } else {
            HeightSlice::Only(raw)
        }
    }

    pub fn matches(&self, height: i32) -> bool {
        match self {
            HeightSlice::All => true,
            HeightSlice::Only(h) => *h == height,
        }
    }
}

/// Double-resolution solidity grid
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColliderGrid {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl ColliderGrid {
    /// Empty collider grid for a tile grid of the given size
    pub fn for_tiles(tile_width: u32, tile_height: u32) -> Self {
        let (width, height) = (tile_width.saturating_mul(2), tile_height.saturating_mul(2));
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    /// Width in fine cells
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in fine cells
    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, fx: i32, fy: i32) -> Option<usize> {
        (fx >= 0 && fy >= 0 && (fx as u32) < self.width && (fy as u32) < self.height)
            .then(|| fy as usize * self.width as usize + fx as usize)
    }

    pub fn get(&self, fx: i32, fy: i32) -> Option<bool> {
        self.index(fx, fy).map(|i| self.cells[i])
    }

    /// Overwrite one fine cell; out-of-range cells are ignored
    pub fn set(&mut self, fx: i32, fy: i32, solid: bool) -> bool {
        match self.index(fx, fy) {
            Some(i) => {
                self.cells[i] = solid;
                true
            }
            None => false,
        }
    }

    /// Mask currently stored for a tile cell's four quadrants
    pub fn quadrants(&self, x: i32, y: i32) -> GeoMask {
        let mut mask = GeoMask::EMPTY;
        for (q, solid) in mask.0.iter_mut().enumerate() {
            let (sx, sy) = GeoMask::quadrant_offset(q);
            *solid = self.get(2 * x + sx, 2 * y + sy).unwrap_or(false);
        }
        mask
    }

    fn assign(&mut self, x: i32, y: i32, mask: GeoMask) {
        for (q, solid) in mask.0.into_iter().enumerate() {
            let (sx, sy) = GeoMask::quadrant_offset(q);
            self.set(2 * x + sx, 2 * y + sy, solid);
        }
    }

    fn xor(&mut self, x: i32, y: i32, mask: GeoMask) {
        for (q, solid) in mask.0.into_iter().enumerate() {
            if !solid {
                continue;
            }
            let (sx, sy) = GeoMask::quadrant_offset(q);
            if let Some(i) = self.index(2 * x + sx, 2 * y + sy) {
                self.cells[i] = !self.cells[i];
            }
        }
    }

    /// Number of solid fine cells
    pub fn solid_count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    /// Render as text, `#` for solid and `.` for open, one line per fine row
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() + self.height as usize);
        for row in self.cells.chunks(self.width.max(1) as usize) {
            out.extend(row.iter().map(|&c| if c { '#' } else { '.' }));
            out.push('\n');
        }
        out
    }
}

/// Recompute the full collider grid
///
/// Every non-empty tile assigns its catalog mask to its four fine cells, then
/// each decoration on the slice XORs its mask in. Cells holding
/// [`EMPTY_TILE`] stay open even if the catalog lists a mask for id `0`.
pub fn derive_colliders(
    tiles: &TileGrid,
    decos: &Decomap,
    catalog: &GeometryCatalog,
    slice: HeightSlice,
) -> ColliderGrid {
    let mut grid = ColliderGrid::for_tiles(tiles.width(), tiles.height());

    for (x, y, id) in tiles.cells() {
        if id == EMPTY_TILE {
            continue;
        }
        if let Some(mask) = catalog.tile_geo(id) {
            grid.assign(x, y, mask);
        }
    }

    // Insertion order, not render order: XOR is order-independent
    for deco in decos.iter().filter(|d| slice.matches(d.height)) {
        if let Some(mask) = catalog.decoration_geo(deco.deco_id) {
            grid.xor(deco.x, deco.y, mask);
        }
    }

    grid
}

/// Asset whose geometry owns a painted collision cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionOwner {
    Tile { id: u32 },
    Decoration { deco_id: u32 },
}

/// Pick the asset that should absorb an edit to cell `(x, y)`
///
/// The topmost decoration on the active slice wins; otherwise the tile, unless
/// the cell is empty.
pub fn collision_owner(
    level: &Level,
    x: i32,
    y: i32,
    slice: HeightSlice,
) -> Option<CollisionOwner> {
    let topmost = level
        .decos
        .query(x, y)
        .into_iter()
        .flatten()
        .filter(|d| slice.matches(d.height))
        .max_by_key(|d| d.render_key())
        .map(|d: &Deco| CollisionOwner::Decoration { deco_id: d.deco_id });

    topmost.or_else(|| match level.tiles.get(x, y) {
        Some(id) if id != EMPTY_TILE => Some(CollisionOwner::Tile { id }),
        _ => None,
    })
}

/// Paint one fine collision cell and write the change back into the catalog
///
/// The cell is set immediately as a preview. When its derived value differs
/// from `solid`, the matching quadrant of the owning asset's mask is flipped so
/// the next derivation agrees. Because masks are shared, every placement of
/// that asset changes with it. Returns the owner that was edited, if any.
pub fn paint_collision(
    level: &mut Level,
    catalog: &mut GeometryCatalog,
    fx: i32,
    fy: i32,
    solid: bool,
    slice: HeightSlice,
) -> Option<CollisionOwner> {
    if !level.collider_mut().set(fx, fy, solid) {
        return None;
    }

    let (x, y) = (fx.div_euclid(2), fy.div_euclid(2));
    let quadrant = GeoMask::quadrant_index(fx.rem_euclid(2), fy.rem_euclid(2));
    let derived = derive_cell(level, catalog, x, y, quadrant, slice);
    if derived == solid {
        return None;
    }

    let owner = collision_owner(level, x, y, slice)?;
    let (kind, id) = match owner {
        CollisionOwner::Tile { id } => (AssetKind::Tile, id),
        CollisionOwner::Decoration { deco_id } => (AssetKind::Decoration, deco_id),
    };
    if catalog.toggle_quadrant(kind, id, quadrant) {
        Some(owner)
    } else {
        log::debug!("No catalog entry for {} id {}; collision edit is preview only", kind, id);
        None
    }
}

fn derive_cell(
    level: &Level,
    catalog: &GeometryCatalog,
    x: i32,
    y: i32,
    quadrant: usize,
    slice: HeightSlice,
) -> bool {
    let mut solid = match level.tiles.get(x, y) {
        Some(id) if id != EMPTY_TILE => catalog
            .tile_geo(id)
            .map_or(false, |mask| mask.is_solid(quadrant)),
        _ => false,
    };
    for deco in level.decos.iter() {
        if deco.x == x && deco.y == y && slice.matches(deco.height) {
            if let Some(mask) = catalog.decoration_geo(deco.deco_id) {
                solid ^= mask.is_solid(quadrant);
            }
        }
    }
    solid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DecoEntry, TileEntry, BOTTOM_LEFT, TOP_LEFT};

    fn catalog() -> GeometryCatalog {
        let mut catalog = GeometryCatalog::new();
        catalog
            .insert_tile(TileEntry {
                id: 5,
                tex: "wall.png".to_string(),
                geo: Some(GeoMask([true, false, false, true])),
            })
            .unwrap();
        catalog
            .insert_tile(TileEntry {
                id: 6,
                tex: "floor.png".to_string(),
                geo: None,
            })
            .unwrap();
        catalog
            .insert_decoration(DecoEntry {
                id: 9,
                tex: "rock.png".to_string(),
                geo: Some(GeoMask([true, true, false, false])),
                height: 1,
            })
            .unwrap();
        catalog
            .insert_decoration(DecoEntry {
                id: 12,
                tex: "post.png".to_string(),
                geo: Some(GeoMask([true, false, false, false])),
                height: 1,
            })
            .unwrap();
        catalog
    }

    fn fine_cells(grid: &ColliderGrid) -> [(i32, i32, bool); 4] {
        [
            (0, 0, grid.get(0, 0).unwrap()),
            (0, 1, grid.get(0, 1).unwrap()),
            (1, 0, grid.get(1, 0).unwrap()),
            (1, 1, grid.get(1, 1).unwrap()),
        ]
    }

    #[test]
    fn test_tile_mask_is_assigned_in_quadrant_order() {
        let mut level = Level::new("Test");
        level.tiles.set(0, 0, 5);
        let grid = derive_colliders(&level.tiles, &level.decos, &catalog(), HeightSlice::All);

        assert_eq!((grid.width(), grid.height()), (36, 22));
        assert_eq!(
            fine_cells(&grid),
            [(0, 0, true), (0, 1, false), (1, 0, false), (1, 1, true)]
        );
        assert_eq!(grid.quadrants(0, 0), GeoMask([true, false, false, true]));
    }

    #[test]
    fn test_empty_tile_ignores_catalog_mask() {
        let mut catalog = catalog();
        catalog
            .insert_tile(TileEntry {
                id: EMPTY_TILE,
                tex: "void.png".to_string(),
                geo: Some(GeoMask::SOLID),
            })
            .unwrap();
        let level = Level::new("Test");
        let grid = derive_colliders(&level.tiles, &level.decos, &catalog, HeightSlice::All);
        assert_eq!(grid.solid_count(), 0);
    }

    #[test]
    fn test_decoration_xors_over_tile() {
        let mut level = Level::new("Test");
        level.tiles.set(0, 0, 5);
        level.decos.add(9, 0, 0, 1, 0);
        let grid = derive_colliders(&level.tiles, &level.decos, &catalog(), HeightSlice::Only(1));

        // [1,0,0,1] xor [1,1,0,0] = [0,1,0,1]
        assert_eq!(grid.quadrants(0, 0), GeoMask([false, true, false, true]));
        assert_eq!(
            fine_cells(&grid),
            [(0, 0, false), (0, 1, true), (1, 0, false), (1, 1, true)]
        );
    }

    #[test]
    fn test_slice_filters_decorations() {
        let mut level = Level::new("Test");
        level.tiles.set(0, 0, 5);
        level.decos.add(9, 0, 0, 1, 0);
        let grid = derive_colliders(&level.tiles, &level.decos, &catalog(), HeightSlice::Only(2));
        assert_eq!(grid.quadrants(0, 0), GeoMask([true, false, false, true]));
    }

    #[test]
    fn test_add_then_remove_decoration_restores_tile() {
        let catalog = catalog();
        let mut level = Level::new("Test");
        level.tiles.set(3, 2, 5);
        let before = derive_colliders(&level.tiles, &level.decos, &catalog, HeightSlice::All);

        level.decos.add(12, 3, 2, 1, 0);
        let during = derive_colliders(&level.tiles, &level.decos, &catalog, HeightSlice::All);
        assert!(!during.quadrants(3, 2).is_solid(TOP_LEFT));

        level.decos.remove(3, 2, Some(12));
        let after = derive_colliders(&level.tiles, &level.decos, &catalog, HeightSlice::All);
        assert_eq!(before, after);
        assert!(after.quadrants(3, 2).is_solid(TOP_LEFT));
    }

    #[test]
    fn test_derivation_is_deterministic_and_ignores_unused_entries() {
        let mut catalog = catalog();
        let mut level = Level::new("Test");
        level.tiles.set(1, 1, 5);
        level.decos.add(9, 4, 4, 1, 0);

        let first = derive_colliders(&level.tiles, &level.decos, &catalog, HeightSlice::All);
        let second = derive_colliders(&level.tiles, &level.decos, &catalog, HeightSlice::All);
        assert_eq!(first, second);

        // Tile 6 is not placed anywhere
        catalog.toggle_quadrant(AssetKind::Tile, 6, TOP_LEFT);
        let third = derive_colliders(&level.tiles, &level.decos, &catalog, HeightSlice::All);
        assert_eq!(first, third);
    }

    #[test]
    fn test_paint_writes_back_to_decoration() {
        let mut catalog = catalog();
        let mut level = Level::new("Test");
        level.tiles.set(0, 0, 5);
        level.decos.add(9, 0, 0, 1, 0);

        // Derived bottom-left is solid via the rock; clear it
        let owner = paint_collision(&mut level, &mut catalog, 0, 1, false, HeightSlice::All);
        assert_eq!(owner, Some(CollisionOwner::Decoration { deco_id: 9 }));
        assert!(!catalog.decoration_geo(9).unwrap().is_solid(BOTTOM_LEFT));

        level.rederive_collision(&catalog, HeightSlice::All);
        assert_eq!(level.collider().get(0, 1), Some(false));
    }

    #[test]
    fn test_paint_falls_back_to_tile_outside_slice() {
        let mut catalog = catalog();
        let mut level = Level::new("Test");
        level.tiles.set(0, 0, 5);
        level.decos.add(9, 0, 0, 1, 0);

        let owner = paint_collision(&mut level, &mut catalog, 1, 0, true, HeightSlice::Only(3));
        assert_eq!(owner, Some(CollisionOwner::Tile { id: 5 }));
        assert_eq!(
            catalog.tile_geo(5),
            Some(GeoMask([true, false, true, true]))
        );
    }

    #[test]
    fn test_paint_on_empty_cell_is_preview_only() {
        let mut catalog = catalog();
        let mut level = Level::new("Test");
        level.rederive_collision(&catalog, HeightSlice::All);

        let owner = paint_collision(&mut level, &mut catalog, 4, 4, true, HeightSlice::All);
        assert_eq!(owner, None);
        assert_eq!(level.collider().get(4, 4), Some(true));

        level.rederive_collision(&catalog, HeightSlice::All);
        assert_eq!(level.collider().get(4, 4), Some(false));
    }

    #[test]
    fn test_paint_out_of_range_is_ignored() {
        let mut catalog = catalog();
        let mut level = Level::new("Test");
        assert_eq!(
            paint_collision(&mut level, &mut catalog, -1, 0, true, HeightSlice::All),
            None
        );
        assert_eq!(
            paint_collision(&mut level, &mut catalog, 36, 0, true, HeightSlice::All),
            None
        );
    }

    #[test]
    fn test_height_slice_from_raw() {
        assert_eq!(HeightSlice::from_raw(0), HeightSlice::All);
        assert_eq!(HeightSlice::from_raw(2), HeightSlice::Only(2));
        assert!(HeightSlice::All.matches(0));
        assert!(!HeightSlice::Only(2).matches(0));
    }

    #[test]
    fn test_ascii_rendering() {
        let mut level = Level::new("Test");
        level.tiles.set(0, 0, 5);
        let grid = derive_colliders(&level.tiles, &level.decos, &catalog(), HeightSlice::All);
        let text = grid.to_ascii();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 22);
        assert!(lines[0].starts_with("#."));
        assert!(lines[1].starts_with(".#"));
    }
}
