//! Mapping between view pixels and grid cells
//!
//! Tiles are drawn at 64 pixels per cell and the collision layer at 32 pixels
//! per fine cell. With the border hidden, the outermost ring of tiles is not
//! drawn, so pointer positions are offset by one coarse cell (two fine cells).

use serde::{Deserialize, Serialize};

/// Pixel size of a tile-grid cell
pub const COARSE_CELL_PX: u32 = 64;
/// Pixel size of a collider-grid cell
pub const FINE_CELL_PX: u32 = 32;

/// Whether the outer ring of tiles is shown and editable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderMode {
    #[default]
    Shown,
    Hidden,
}

impl BorderMode {
    /// Number of cells at `scale` hidden on each side
    pub fn border_cells(self, scale: u32) -> i32 {
        match self {
            BorderMode::Shown => 0,
            BorderMode::Hidden => (COARSE_CELL_PX / scale.max(1)) as i32,
        }
    }

    /// Whether tile `(x, y)` of a `width`×`height` grid can be edited
    pub fn is_editable(self, x: i32, y: i32, width: u32, height: u32) -> bool {
        let b = self.border_cells(COARSE_CELL_PX);
        x >= b && y >= b && x < width as i32 - b && y < height as i32 - b
    }
}

/// Which grid a pointer position is resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Coarse,
    Fine,
}

impl Resolution {
    pub fn cell_px(self) -> u32 {
        match self {
            Resolution::Coarse => COARSE_CELL_PX,
            Resolution::Fine => FINE_CELL_PX,
        }
    }

    /// Cells per tile along one axis
    pub fn factor(self) -> u32 {
        match self {
            Resolution::Coarse => 1,
            Resolution::Fine => 2,
        }
    }
}

/// Resolve one axis of a pointer position to a cell index
///
/// `view_fraction` is the scroll position of the view's leading edge as a
/// fraction of the drawn extent, `pixel_offset` the pointer offset inside the
/// viewport, `grid_dimension` the number of cells along the axis at `scale`
/// pixels per cell.
pub fn tile_coordinate(
    view_fraction: f64,
    pixel_offset: f64,
    grid_dimension: u32,
    scale: u32,
    border: BorderMode,
) -> i32 {
    let scale = scale.max(1);
    let border_cells = border.border_cells(scale);
    let drawn_cells = (grid_dimension as i32 - 2 * border_cells).max(0);
    let extent = f64::from(drawn_cells) * f64::from(scale);
    ((view_fraction * extent + pixel_offset) / f64::from(scale)).floor() as i32 + border_cells
}

/// Pointer mapping for one level view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewMapper {
    pub width: u32,
    pub height: u32,
    pub border: BorderMode,
}

impl ViewMapper {
    pub fn new(width: u32, height: u32, border: BorderMode) -> Self {
        Self {
            width,
            height,
            border,
        }
    }

    /// Cell under the pointer, or `None` when it falls outside the addressable area
    pub fn cell_at(
        &self,
        resolution: Resolution,
        scroll: (f64, f64),
        pointer: (f64, f64),
    ) -> Option<(i32, i32)> {
        let scale = resolution.cell_px();
        let (cols, rows) = (
            self.width * resolution.factor(),
            self.height * resolution.factor(),
        );
        let x = tile_coordinate(scroll.0, pointer.0, cols, scale, self.border);
        let y = tile_coordinate(scroll.1, pointer.1, rows, scale, self.border);

        let b = self.border.border_cells(scale);
        let inside = x >= b && y >= b && x < cols as i32 - b && y < rows as i32 - b;
        inside.then_some((x, y))
    }

    pub fn coarse_cell(&self, scroll: (f64, f64), pointer: (f64, f64)) -> Option<(i32, i32)> {
        self.cell_at(Resolution::Coarse, scroll, pointer)
    }

    pub fn fine_cell(&self, scroll: (f64, f64), pointer: (f64, f64)) -> Option<(i32, i32)> {
        self.cell_at(Resolution::Fine, scroll, pointer)
    }

    /// Drawn size of the level in pixels
    pub fn view_size_px(&self) -> (u32, u32) {
        let hidden = 2 * self.border.border_cells(COARSE_CELL_PX) as u32;
        (
            self.width.saturating_sub(hidden) * COARSE_CELL_PX,
            self.height.saturating_sub(hidden) * COARSE_CELL_PX,
        )
    }

    /// Pixel position of a cell's top-left corner in the drawn view
    pub fn cell_origin(&self, resolution: Resolution, x: i32, y: i32) -> (i32, i32) {
        let scale = resolution.cell_px() as i32;
        let b = self.border.border_cells(resolution.cell_px());
        ((x - b) * scale, (y - b) * scale)
    }
}
