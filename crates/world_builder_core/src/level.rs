//! Level aggregate: tile grid, decorations, zones and the derived collider grid

use crate::catalog::GeometryCatalog;
use crate::collision::{derive_colliders, ColliderGrid, HeightSlice};
use crate::decomap::Decomap;
use crate::tile_grid::{ResizeError, TileGrid, MIN_HEIGHT, MIN_WIDTH};
use crate::zones::{HeightZoneMap, LightMap, LoadingZoneMap};

/// A single level being edited
///
/// Grids and maps are public so editing tools can mutate them directly. The
/// collider grid is derived data: it is excluded from equality and must be
/// refreshed with [`Level::rederive_collision`] after geometry changes.
#[derive(Debug, Clone)]
pub struct Level {
    pub name: String,
    pub tiles: TileGrid,
    pub decos: Decomap,
    pub loading_zones: LoadingZoneMap,
    pub lights: LightMap,
    pub height_zones: HeightZoneMap,
    /// Default spawn cell `[x, y]`
    pub spawn: [i32; 2],
    /// Placement in the world map
    pub world_pos: [i32; 2],
    /// Excluded from the project's level listing
    pub ignore_from_project: bool,
    collider: ColliderGrid,
}

impl Default for Level {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl Level {
    /// Create an empty level of the minimum size
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_tiles(name, TileGrid::new(MIN_WIDTH, MIN_HEIGHT))
    }

    /// Create a level around an existing tile grid
    pub fn with_tiles(name: impl Into<String>, tiles: TileGrid) -> Self {
        let collider = ColliderGrid::for_tiles(tiles.width(), tiles.height());
        Self {
            name: name.into(),
            tiles,
            decos: Decomap::new(),
            loading_zones: LoadingZoneMap::new(),
            lights: LightMap::new(),
            height_zones: HeightZoneMap::new(),
            spawn: [0, 0],
            world_pos: [0, 0],
            ignore_from_project: false,
            collider,
        }
    }

    pub fn width(&self) -> u32 {
        self.tiles.width()
    }

    pub fn height(&self) -> u32 {
        self.tiles.height()
    }

    pub fn collider(&self) -> &ColliderGrid {
        &self.collider
    }

    /// Direct access for preview painting of single fine cells
    pub fn collider_mut(&mut self) -> &mut ColliderGrid {
        &mut self.collider
    }

    /// Recompute the collider grid from tiles, decorations and the catalog
    pub fn rederive_collision(&mut self, catalog: &GeometryCatalog, slice: HeightSlice) {
        self.collider = derive_colliders(&self.tiles, &self.decos, catalog, slice);
    }

    /// Place a decoration using the catalog's default height
    pub fn place_decoration(&mut self, catalog: &GeometryCatalog, deco_id: u32, x: i32, y: i32) -> bool {
        if !self.tiles.contains(x, y) {
            return false;
        }
        let height = catalog.decoration_height(deco_id).unwrap_or(0);
        self.decos.add(deco_id, x, y, height, 0)
    }

    /// Grow or shrink the level at its edges
    ///
    /// Overlays follow the tile grid: entries are translated with the cells
    /// they sit on and dropped if their cell is removed. The collider grid is
    /// cleared to the new size and needs re-deriving.
    pub fn resize(&mut self, left: i32, right: i32, up: i32, down: i32) -> Result<(), ResizeError> {
        let shift = match self.tiles.resize(left, right, up, down) {
            Ok(shift) => shift,
            Err(e) => {
                log::warn!("Level '{}': {}", self.name, e);
                return Err(e);
            }
        };
        let (width, height) = (self.tiles.width(), self.tiles.height());

        self.decos.shift_and_clip(shift, width, height);
        self.loading_zones.shift_and_clip(shift, width, height);
        self.lights.shift_and_clip(shift, width, height);
        self.height_zones.shift_and_clip(shift, width, height);
        self.spawn = [
            self.spawn[0].saturating_add(shift.dx),
            self.spawn[1].saturating_add(shift.dy),
        ];
        self.collider = ColliderGrid::for_tiles(width, height);

        log::debug!("Level '{}' resized to {}x{}", self.name, width, height);
        Ok(())
    }
}

/// Structural equality over the authored content; the collider grid is derived
/// and does not take part.
impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.tiles == other.tiles
            && self.decos == other.decos
            && self.loading_zones == other.loading_zones
            && self.lights == other.lights
            && self.height_zones == other.height_zones
            && self.spawn == other.spawn
            && self.world_pos == other.world_pos
            && self.ignore_from_project == other.ignore_from_project
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::{GridPos, Light, LightPos, LoadingZone};

    #[test]
    fn test_new_level() {
        let level = Level::new("Test Level");
        assert_eq!(level.name, "Test Level");
        assert_eq!((level.width(), level.height()), (18, 11));
        assert!(level.decos.is_empty());
        assert!(level.loading_zones.is_empty());
        assert_eq!(
            (level.collider().width(), level.collider().height()),
            (36, 22)
        );
    }

    #[test]
    fn test_clone_is_deep() {
        let mut level = Level::new("Test");
        level.tiles.set(1, 1, 4);
        let snapshot = level.clone();

        level.tiles.set(1, 1, 8);
        level.decos.add(2, 1, 1, 0, 0);
        assert_eq!(snapshot.tiles.get(1, 1), Some(4));
        assert!(snapshot.decos.is_empty());
        assert_ne!(snapshot, level);
    }

    #[test]
    fn test_equality_ignores_collider() {
        let mut a = Level::new("Test");
        let b = a.clone();
        a.collider_mut().set(0, 0, true);
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_sees_zone_changes() {
        let a = Level::new("Test");
        let mut b = a.clone();
        b.lights.insert(LightPos::at_cell(2, 2), Light::new(3.0));
        assert_ne!(a, b);

        let mut c = a.clone();
        c.loading_zones
            .insert(GridPos::new(0, 0), LoadingZone::new("", [0, 0, 0]));
        assert_ne!(a, c);
    }

    #[test]
    fn test_resize_shifts_overlays() {
        let mut level = Level::new("Test");
        level.decos.add(3, 0, 0, 0, 0);
        level.decos.add(4, 5, 5, 0, 0);
        level
            .loading_zones
            .insert(GridPos::new(5, 5), LoadingZone::new("next", [1, 1, 0]));
        level.spawn = [5, 5];

        level.resize(1, 0, 2, 0).unwrap();
        assert_eq!((level.width(), level.height()), (19, 13));
        assert!(level.decos.get(3, 1, 2).is_some());
        assert!(level.loading_zones.contains(&GridPos::new(6, 7)));
        assert_eq!(level.spawn, [6, 7]);
        assert_eq!(level.collider().width(), 38);

        level.resize(-1, 0, -2, 0).unwrap();
        assert!(level.decos.get(3, 0, 0).is_some());

        // Dropping the left column removes what sat on it
        level.resize(-1, 1, 0, 0).unwrap();
        assert_eq!(level.decos.len(), 1);
        assert!(level.decos.get(4, 4, 5).is_some());
    }

    #[test]
    fn test_resize_rejection_leaves_level_untouched() {
        let mut level = Level::new("Test");
        level.decos.add(3, 0, 0, 0, 0);
        let before = level.clone();
        assert!(level.resize(-100, 0, 0, 0).is_err());
        assert_eq!(level, before);
        assert_eq!(level.width(), 18);
    }

    #[test]
    fn test_oversized_resize_is_rejected() {
        let mut level = Level::new("t");
        level.decos.add(3, 2, 2, 0, 0);
        let before = level.clone();
        assert!(matches!(
            level.resize(i32::MAX, i32::MAX, 0, 0),
            Err(ResizeError::TooLarge { .. })
        ));
        assert_eq!(level, before);
        assert_eq!(level.collider().width(), 36);
    }

    #[test]
    fn test_place_decoration_uses_catalog_height() {
        let mut catalog = GeometryCatalog::new();
        let id = catalog.import_decoration("tree.png", None, 3);
        let mut level = Level::new("Test");
        assert!(level.place_decoration(&catalog, id, 2, 2));
        assert_eq!(level.decos.get(id, 2, 2).unwrap().height, 3);
        assert!(!level.place_decoration(&catalog, id, -1, 2));
    }
}
