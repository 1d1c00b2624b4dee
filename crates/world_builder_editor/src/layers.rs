//! Editing layers
//!
//! Each layer decides what a level looks like while it is active and what a
//! paint or erase at a cell does. Drawing produces plain [`DrawCommand`]s for
//! whatever renderer sits on top.

use serde::{Deserialize, Serialize};
use world_builder_core::{
    paint_collision, AssetKind, BorderMode, GeoMask, GeometryCatalog, GridPos, HeightSlice,
    HeightZone, Level, Light, LightPos, LoadingZone, Resolution, SlicePos, ZoneKey, EMPTY_TILE,
};

/// Layer currently receiving edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EditLayer {
    #[default]
    Tiles,
    Decorations,
    Collision,
    HeightZones,
    LoadingZones,
    Lights,
}

impl EditLayer {
    pub const ALL: [EditLayer; 6] = [
        EditLayer::Tiles,
        EditLayer::Decorations,
        EditLayer::Collision,
        EditLayer::HeightZones,
        EditLayer::LoadingZones,
        EditLayer::Lights,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EditLayer::Tiles => "Tiles",
            EditLayer::Decorations => "Decorations",
            EditLayer::Collision => "Collision",
            EditLayer::HeightZones => "Height Zones",
            EditLayer::LoadingZones => "Loading Zones",
            EditLayer::Lights => "Lights",
        }
    }

    /// Grid that pointer positions resolve against on this layer
    pub fn resolution(&self) -> Resolution {
        match self {
            EditLayer::Collision => Resolution::Fine,
            _ => Resolution::Coarse,
        }
    }

    /// Whether the height slice selector applies
    pub fn uses_height_slice(&self) -> bool {
        matches!(
            self,
            EditLayer::Decorations | EditLayer::Collision | EditLayer::HeightZones
        )
    }
}

/// View state a layer draws and edits under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayerContext {
    pub slice: HeightSlice,
    pub border: BorderMode,
}

/// Something for the renderer to draw
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Asset texture on a tile cell
    Sprite {
        kind: AssetKind,
        id: u32,
        tex: String,
        x: i32,
        y: i32,
    },
    /// Solid collider cell
    FineCell { fx: i32, fy: i32 },
    /// Loading or height zone outline with a caption
    ZoneMarker {
        x: i32,
        y: i32,
        label: String,
        active: bool,
    },
    /// Light at its exact position in tile units
    LightMarker {
        x: f64,
        y: f64,
        diameter: f32,
        color: [f32; 3],
        blacklight: bool,
    },
}

/// Entry in the layer's selection pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneOption {
    pub id: u32,
    pub label: String,
}

/// What a paint stroke puts down
#[derive(Debug, Clone, PartialEq)]
pub enum Brush {
    Tile(u32),
    Decoration(u32),
    /// Collision painting; `true` makes the fine cell solid
    Solid(bool),
    HeightZone(i32),
    LoadingZone(LoadingZone),
    Light(Light),
}

/// Per-layer drawing and editing behaviour
///
/// Paint and erase coordinates are in the layer's [`Resolution`]: fine cells
/// for collision, tile cells otherwise. They return whether the level (or
/// catalog) changed; out-of-range cells are ignored.
pub trait LayerBehavior {
    /// Everything the layer shows for a level
    fn draw_full(
        &self,
        level: &Level,
        catalog: &GeometryCatalog,
        ctx: &LayerContext,
    ) -> Vec<DrawCommand>;

    /// What the layer shows on one tile cell, for partial redraws
    fn draw_individual(
        &self,
        level: &Level,
        catalog: &GeometryCatalog,
        ctx: &LayerContext,
        x: i32,
        y: i32,
    ) -> Vec<DrawCommand>;

    fn pane_options(&self, catalog: &GeometryCatalog) -> Vec<PaneOption>;

    fn paint(
        &self,
        level: &mut Level,
        catalog: &mut GeometryCatalog,
        ctx: &LayerContext,
        x: i32,
        y: i32,
        brush: &Brush,
    ) -> bool;

    fn erase(
        &self,
        level: &mut Level,
        catalog: &mut GeometryCatalog,
        ctx: &LayerContext,
        x: i32,
        y: i32,
    ) -> bool;
}

fn editable(level: &Level, ctx: &LayerContext, x: i32, y: i32) -> bool {
    level.tiles.contains(x, y) && ctx.border.is_editable(x, y, level.width(), level.height())
}

fn visible_cells(level: &Level, ctx: &LayerContext) -> impl Iterator<Item = (i32, i32)> {
    let (w, h) = (level.width(), level.height());
    let border = ctx.border;
    (0..h as i32)
        .flat_map(move |y| (0..w as i32).map(move |x| (x, y)))
        .filter(move |&(x, y)| border.is_editable(x, y, w, h))
}

fn tile_sprite(level: &Level, catalog: &GeometryCatalog, x: i32, y: i32) -> Option<DrawCommand> {
    let id = level.tiles.get(x, y).filter(|&id| id != EMPTY_TILE)?;
    let tex = catalog.tile(id).map(|t| t.tex.clone()).unwrap_or_default();
    Some(DrawCommand::Sprite {
        kind: AssetKind::Tile,
        id,
        tex,
        x,
        y,
    })
}

fn deco_sprites(
    level: &Level,
    catalog: &GeometryCatalog,
    ctx: &LayerContext,
    cell: Option<(i32, i32)>,
) -> Vec<DrawCommand> {
    level
        .decos
        .render_order()
        .into_iter()
        .filter(|d| ctx.slice.matches(d.height))
        .filter(|d| cell.map_or(true, |(x, y)| d.x == x && d.y == y))
        .map(|d| DrawCommand::Sprite {
            kind: AssetKind::Decoration,
            id: d.deco_id,
            tex: catalog
                .decoration(d.deco_id)
                .map(|e| e.tex.clone())
                .unwrap_or_default(),
            x: d.x,
            y: d.y,
        })
        .collect()
}

fn fine_cells(level: &Level, x: i32, y: i32) -> Vec<DrawCommand> {
    let mask = level.collider().quadrants(x, y);
    (0..4)
        .filter(|&q| mask.is_solid(q))
        .map(|q| {
            let (sx, sy) = GeoMask::quadrant_offset(q);
            DrawCommand::FineCell {
                fx: 2 * x + sx,
                fy: 2 * y + sy,
            }
        })
        .collect()
}

fn height_markers(level: &Level, ctx: &LayerContext, cell: Option<(i32, i32)>) -> Vec<DrawCommand> {
    level
        .height_zones
        .iter()
        .filter(|(pos, _)| ctx.slice.matches(pos.z))
        .filter(|(pos, _)| cell.map_or(true, |(x, y)| pos.x == x && pos.y == y))
        .map(|(pos, zone)| DrawCommand::ZoneMarker {
            x: pos.x,
            y: pos.y,
            label: format!("{:+}", zone.target_height),
            active: zone.target_height != 0,
        })
        .collect()
}

fn loading_markers(level: &Level, cell: Option<(i32, i32)>) -> Vec<DrawCommand> {
    level
        .loading_zones
        .iter()
        .filter(|(pos, _)| cell.map_or(true, |(x, y)| pos.x == x && pos.y == y))
        .map(|(pos, zone)| DrawCommand::ZoneMarker {
            x: pos.x,
            y: pos.y,
            label: zone.target_level.clone(),
            active: zone.is_active(),
        })
        .collect()
}

fn light_markers(level: &Level, cell: Option<(i32, i32)>) -> Vec<DrawCommand> {
    level
        .lights
        .iter()
        .filter(|(pos, _)| cell.map_or(true, |c| pos.cell() == c))
        .map(|(pos, light)| DrawCommand::LightMarker {
            x: pos.x,
            y: pos.y,
            diameter: light.diameter,
            color: [
                light.red.amplitude,
                light.green.amplitude,
                light.blue.amplitude,
            ],
            blacklight: light.blacklight,
        })
        .collect()
}

impl LayerBehavior for EditLayer {
    fn draw_full(
        &self,
        level: &Level,
        catalog: &GeometryCatalog,
        ctx: &LayerContext,
    ) -> Vec<DrawCommand> {
        match self {
            EditLayer::Tiles => visible_cells(level, ctx)
                .filter_map(|(x, y)| tile_sprite(level, catalog, x, y))
                .collect(),
            EditLayer::Decorations => deco_sprites(level, catalog, ctx, None),
            EditLayer::Collision => visible_cells(level, ctx)
                .flat_map(|(x, y)| fine_cells(level, x, y))
                .collect(),
            EditLayer::HeightZones => height_markers(level, ctx, None),
            EditLayer::LoadingZones => loading_markers(level, None),
            EditLayer::Lights => light_markers(level, None),
        }
    }

    fn draw_individual(
        &self,
        level: &Level,
        catalog: &GeometryCatalog,
        ctx: &LayerContext,
        x: i32,
        y: i32,
    ) -> Vec<DrawCommand> {
        if !editable(level, ctx, x, y) {
            return Vec::new();
        }
        match self {
            EditLayer::Tiles => tile_sprite(level, catalog, x, y).into_iter().collect(),
            EditLayer::Decorations => deco_sprites(level, catalog, ctx, Some((x, y))),
            EditLayer::Collision => fine_cells(level, x, y),
            EditLayer::HeightZones => height_markers(level, ctx, Some((x, y))),
            EditLayer::LoadingZones => loading_markers(level, Some((x, y))),
            EditLayer::Lights => light_markers(level, Some((x, y))),
        }
    }

    fn pane_options(&self, catalog: &GeometryCatalog) -> Vec<PaneOption> {
        match self {
            EditLayer::Tiles => catalog
                .tiles()
                .map(|t| PaneOption {
                    id: t.id,
                    label: t.tex.clone(),
                })
                .collect(),
            EditLayer::Decorations => catalog
                .decorations()
                .map(|d| PaneOption {
                    id: d.id,
                    label: d.tex.clone(),
                })
                .collect(),
            EditLayer::Collision => vec![
                PaneOption {
                    id: 0,
                    label: "Open".to_string(),
                },
                PaneOption {
                    id: 1,
                    label: "Solid".to_string(),
                },
            ],
            EditLayer::HeightZones | EditLayer::LoadingZones | EditLayer::Lights => Vec::new(),
        }
    }

    fn paint(
        &self,
        level: &mut Level,
        catalog: &mut GeometryCatalog,
        ctx: &LayerContext,
        x: i32,
        y: i32,
        brush: &Brush,
    ) -> bool {
        if *self == EditLayer::Collision {
            let Brush::Solid(solid) = brush else {
                return false;
            };
            if !editable(level, ctx, x.div_euclid(2), y.div_euclid(2)) {
                return false;
            }
            let before = level.collider().get(x, y);
            paint_collision(level, catalog, x, y, *solid, ctx.slice);
            return before != Some(*solid);
        }

        if !editable(level, ctx, x, y) {
            return false;
        }
        match (self, brush) {
            (EditLayer::Tiles, Brush::Tile(id)) => {
                let changed = level.tiles.get(x, y) != Some(*id);
                changed && level.tiles.set(x, y, *id)
            }
            (EditLayer::Decorations, Brush::Decoration(id)) => {
                if !level.place_decoration(catalog, *id, x, y) {
                    return false;
                }
                if let (HeightSlice::Only(h), Some(deco)) = (ctx.slice, level.decos.get_mut(*id, x, y)) {
                    deco.height = h;
                }
                true
            }
            (EditLayer::HeightZones, Brush::HeightZone(target_height)) => {
                let HeightSlice::Only(z) = ctx.slice else {
                    log::debug!("Height zones need a height slice selected");
                    return false;
                };
                let zone = HeightZone {
                    target_height: *target_height,
                };
                level.height_zones.insert(SlicePos::new(x, y, z), zone) != Some(zone)
            }
            (EditLayer::LoadingZones, Brush::LoadingZone(zone)) => {
                let previous = level.loading_zones.insert(GridPos::new(x, y), zone.clone());
                previous.as_ref() != Some(zone)
            }
            (EditLayer::Lights, Brush::Light(light)) => {
                level.lights.insert(LightPos::at_cell(x, y), *light) != Some(*light)
            }
            _ => false,
        }
    }

    fn erase(
        &self,
        level: &mut Level,
        catalog: &mut GeometryCatalog,
        ctx: &LayerContext,
        x: i32,
        y: i32,
    ) -> bool {
        match self {
            EditLayer::Collision => self.paint(level, catalog, ctx, x, y, &Brush::Solid(false)),
            _ if !editable(level, ctx, x, y) => false,
            EditLayer::Tiles => {
                let changed = level.tiles.get(x, y) != Some(EMPTY_TILE);
                changed && level.tiles.set(x, y, EMPTY_TILE)
            }
            EditLayer::Decorations => {
                let ids: Vec<u32> = level
                    .decos
                    .query(x, y)
                    .into_iter()
                    .flatten()
                    .filter(|d| ctx.slice.matches(d.height))
                    .map(|d| d.deco_id)
                    .collect();
                for id in &ids {
                    level.decos.remove(x, y, Some(*id));
                }
                !ids.is_empty()
            }
            EditLayer::HeightZones => match ctx.slice {
                HeightSlice::Only(z) => level
                    .height_zones
                    .remove(&SlicePos::new(x, y, z))
                    .is_some(),
                HeightSlice::All => level.height_zones.remove_at_cell(x, y) > 0,
            },
            EditLayer::LoadingZones => level.loading_zones.remove(&GridPos::new(x, y)).is_some(),
            EditLayer::Lights => level.lights.remove_at_cell(x, y) > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use world_builder_core::{DecoEntry, TileEntry};

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
            .insert_decoration(DecoEntry {
                id: 9,
                tex: "crate.png".to_string(),
                geo: Some(GeoMask([true, true, false, false])),
                height: 1,
            })
            .unwrap();
        catalog
    }

    #[test]
    fn test_tile_paint_and_draw() {
        let mut catalog = catalog();
        let mut level = Level::new("Test");
        let ctx = LayerContext::default();

        assert!(EditLayer::Tiles.paint(&mut level, &mut catalog, &ctx, 2, 3, &Brush::Tile(5)));
        assert!(!EditLayer::Tiles.paint(&mut level, &mut catalog, &ctx, 2, 3, &Brush::Tile(5)));
        assert!(!EditLayer::Tiles.paint(&mut level, &mut catalog, &ctx, 99, 3, &Brush::Tile(5)));

        let draws = EditLayer::Tiles.draw_full(&level, &catalog, &ctx);
        assert_eq!(
            draws,
            vec![DrawCommand::Sprite {
                kind: AssetKind::Tile,
                id: 5,
                tex: "wall.png".to_string(),
                x: 2,
                y: 3
            }]
        );

        assert!(EditLayer::Tiles.erase(&mut level, &mut catalog, &ctx, 2, 3));
        assert_eq!(level.tiles.get(2, 3), Some(EMPTY_TILE));
    }

    #[test]
    fn test_hidden_border_blocks_outer_ring() {
        let mut catalog = catalog();
        let mut level = Level::new("Test");
        let ctx = LayerContext {
            border: BorderMode::Hidden,
            ..Default::default()
        };
        assert!(!EditLayer::Tiles.paint(&mut level, &mut catalog, &ctx, 0, 3, &Brush::Tile(5)));
        assert!(EditLayer::Tiles.paint(&mut level, &mut catalog, &ctx, 1, 3, &Brush::Tile(5)));
    }

    #[test]
    fn test_mismatched_brush_is_ignored() {
        let mut catalog = catalog();
        let mut level = Level::new("Test");
        let ctx = LayerContext::default();
        assert!(!EditLayer::Tiles.paint(&mut level, &mut catalog, &ctx, 1, 1, &Brush::Decoration(9)));
        assert!(!EditLayer::Collision.paint(&mut level, &mut catalog, &ctx, 1, 1, &Brush::Tile(5)));
    }

    #[test]
    fn test_decorations_follow_slice() {
        let mut catalog = catalog();
        let mut level = Level::new("Test");
        let all = LayerContext::default();
        let slice2 = LayerContext {
            slice: HeightSlice::Only(2),
            ..Default::default()
        };

        assert!(EditLayer::Decorations.paint(&mut level, &mut catalog, &all, 1, 1, &Brush::Decoration(9)));
        assert_eq!(level.decos.get(9, 1, 1).unwrap().height, 1);
        assert!(EditLayer::Decorations.paint(&mut level, &mut catalog, &slice2, 2, 1, &Brush::Decoration(9)));
        assert_eq!(level.decos.get(9, 2, 1).unwrap().height, 2);

        assert_eq!(EditLayer::Decorations.draw_full(&level, &catalog, &all).len(), 2);
        assert_eq!(EditLayer::Decorations.draw_full(&level, &catalog, &slice2).len(), 1);

        // Erasing on slice 2 leaves the height-1 decoration alone
        assert!(!EditLayer::Decorations.erase(&mut level, &mut catalog, &slice2, 1, 1));
        assert!(EditLayer::Decorations.erase(&mut level, &mut catalog, &all, 1, 1));
        assert_eq!(level.decos.len(), 1);
    }

    #[test]
    fn test_collision_paint_writes_catalog() {
        let mut catalog = catalog();
        let mut level = Level::new("Test");
        level.tiles.set(0, 0, 5);
        level.rederive_collision(&catalog, HeightSlice::All);
        let ctx = LayerContext::default();

        // Fine (1, 0) is the tile's top-right quadrant, open in the mask
        assert!(EditLayer::Collision.paint(&mut level, &mut catalog, &ctx, 1, 0, &Brush::Solid(true)));
        assert_eq!(catalog.tile_geo(5), Some(GeoMask([true, false, true, true])));

        let cells = EditLayer::Collision.draw_individual(&level, &catalog, &ctx, 0, 0);
        assert_eq!(cells.len(), 3);

        assert!(EditLayer::Collision.erase(&mut level, &mut catalog, &ctx, 1, 0));
        assert_eq!(catalog.tile_geo(5), Some(GeoMask([true, false, false, true])));
    }

    #[test]
    fn test_height_zones_need_slice() {
        let mut catalog = catalog();
        let mut level = Level::new("Test");
        let all = LayerContext::default();
        let slice = LayerContext {
            slice: HeightSlice::Only(1),
            ..Default::default()
        };

        assert!(!EditLayer::HeightZones.paint(&mut level, &mut catalog, &all, 3, 3, &Brush::HeightZone(1)));
        assert!(EditLayer::HeightZones.paint(&mut level, &mut catalog, &slice, 3, 3, &Brush::HeightZone(1)));
        assert!(level.height_zones.contains(&SlicePos::new(3, 3, 1)));
        assert_eq!(EditLayer::HeightZones.draw_full(&level, &catalog, &all).len(), 1);
        assert!(EditLayer::HeightZones.erase(&mut level, &mut catalog, &all, 3, 3));
        assert!(level.height_zones.is_empty());
    }

    #[test]
    fn test_zone_and_light_layers() {
        let mut catalog = catalog();
        let mut level = Level::new("Test");
        let ctx = LayerContext::default();
        let zone = LoadingZone::new("cave", [1, 2, 0]);

        assert!(EditLayer::LoadingZones.paint(&mut level, &mut catalog, &ctx, 4, 4, &Brush::LoadingZone(zone.clone())));
        assert!(!EditLayer::LoadingZones.paint(&mut level, &mut catalog, &ctx, 4, 4, &Brush::LoadingZone(zone)));
        assert!(EditLayer::Lights.paint(&mut level, &mut catalog, &ctx, 4, 4, &Brush::Light(Light::new(2.0))));

        let markers = EditLayer::LoadingZones.draw_individual(&level, &catalog, &ctx, 4, 4);
        assert_eq!(
            markers,
            vec![DrawCommand::ZoneMarker {
                x: 4,
                y: 4,
                label: "cave".to_string(),
                active: true
            }]
        );
        assert_eq!(EditLayer::Lights.draw_full(&level, &catalog, &ctx).len(), 1);
        assert!(EditLayer::Lights.erase(&mut level, &mut catalog, &ctx, 4, 4));
        assert!(!EditLayer::Lights.erase(&mut level, &mut catalog, &ctx, 4, 4));
    }

    #[test]
    fn test_lights_off_grid_draw_and_erase_by_nearest_cell() {
        let mut catalog = catalog();
        let mut level = Level::new("Test");
        let ctx = LayerContext::default();
        level.lights.insert(LightPos::new(4.4, 3.6), Light::new(2.0));

        let markers = EditLayer::Lights.draw_individual(&level, &catalog, &ctx, 4, 4);
        assert!(matches!(
            markers.as_slice(),
            [DrawCommand::LightMarker { x, y, .. }] if *x == 4.4 && *y == 3.6
        ));
        assert!(EditLayer::Lights.erase(&mut level, &mut catalog, &ctx, 4, 4));
        assert!(level.lights.is_empty());
    }

    #[test]
    fn test_pane_options() {
        let catalog = catalog();
        let tiles = EditLayer::Tiles.pane_options(&catalog);
        assert_eq!(
            tiles,
            vec![PaneOption {
                id: 5,
                label: "wall.png".to_string()
            }]
        );
        assert_eq!(EditLayer::Decorations.pane_options(&catalog)[0].id, 9);
        assert!(EditLayer::Lights.pane_options(&catalog).is_empty());
    }
}
