//! Dense tile identifier grid

use thiserror::Error;

/// Identifier stored in empty cells
pub const EMPTY_TILE: u32 = 0;
/// Smallest width a resize may produce
pub const MIN_WIDTH: u32 = 18;
/// Smallest height a resize may produce
pub const MIN_HEIGHT: u32 = 11;
/// Largest width or height a resize or load may produce
pub const MAX_DIMENSION: u32 = 4096;

/// Error returned when a resize would leave the grid outside the editor's size range
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResizeError {
    #[error("resize to {width}x{height} rejected: minimum level size is {}x{}", MIN_WIDTH, MIN_HEIGHT)]
    TooSmall { width: i64, height: i64 },
    #[error("resize to {width}x{height} rejected: maximum level size is {}x{}", MAX_DIMENSION, MAX_DIMENSION)]
    TooLarge { width: i64, height: i64 },
}

/// Error returned when rows handed to [`TileGrid::from_rows`] do not form a rectangle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridShapeError {
    #[error("tilemap has no rows")]
    Empty,
    #[error("tilemap is {width}x{height}, larger than {}x{}", MAX_DIMENSION, MAX_DIMENSION)]
    TooLarge { width: usize, height: usize },
    #[error("tilemap row {row} has {found} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Translation applied to the grid's contents by a resize
///
/// Inserting columns on the left edge moves every existing cell right by
/// `dx`; removing them moves cells left. Overlays keyed by grid position
/// (decorations, zones, spawn) must be shifted by the same amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridShift {
    pub dx: i32,
    pub dy: i32,
}

impl GridShift {
    /// Shifted position, `None` when it falls outside the `i32` range
    pub fn apply(&self, x: i32, y: i32) -> Option<(i32, i32)> {
        Some((x.checked_add(self.dx)?, y.checked_add(self.dy)?))
    }
}

/// Row-major grid of tile identifiers, `0` meaning empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<u32>,
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::new(MIN_WIDTH, MIN_HEIGHT)
    }
}

impl TileGrid {
    /// Create an empty grid
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![EMPTY_TILE; width as usize * height as usize],
        }
    }

    /// Build a grid from rows, taking its dimensions from the rows' own shape
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self, GridShapeError> {
        let expected = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.is_empty() || expected == 0 {
            return Err(GridShapeError::Empty);
        }

        let height = rows.len();
        if expected > MAX_DIMENSION as usize || height > MAX_DIMENSION as usize {
            return Err(GridShapeError::TooLarge {
                width: expected,
                height,
            });
        }
        let mut tiles = Vec::with_capacity(expected * height);
        for (row, cells) in rows.into_iter().enumerate() {
            if cells.len() != expected {
                return Err(GridShapeError::Ragged {
                    row,
                    expected,
                    found: cells.len(),
                });
            }
            tiles.extend(cells);
        }

        Ok(Self {
            width: expected as u32,
            height: height as u32,
            tiles,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Check whether a cell lies on the grid
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        self.contains(x, y)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    /// Get the tile at column `x`, row `y`
    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.tiles[i])
    }

    /// Set the tile at column `x`, row `y`
    ///
    /// Out-of-range coordinates are ignored; returns whether a cell was written.
    pub fn set(&mut self, x: i32, y: i32, tile: u32) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.tiles[i] = tile;
                true
            }
            None => false,
        }
    }

    /// Iterate rows from top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[u32]> {
        self.tiles.chunks(self.width.max(1) as usize)
    }

    /// Iterate every cell as `(x, y, tile)`
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32, u32)> + '_ {
        let width = self.width.max(1) as usize;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, &tile)| ((i % width) as i32, (i / width) as i32, tile))
    }

    /// Insert (positive) or remove (negative) whole columns/rows at each edge
    ///
    /// The grid is left untouched when the result would be smaller than
    /// [`MIN_WIDTH`] x [`MIN_HEIGHT`] or wider or taller than [`MAX_DIMENSION`].
    pub fn resize(
        &mut self,
        left: i32,
        right: i32,
        up: i32,
        down: i32,
    ) -> Result<GridShift, ResizeError> {
        let new_width = self.width as i64 + left as i64 + right as i64;
        let new_height = self.height as i64 + up as i64 + down as i64;
        if new_width < MIN_WIDTH as i64 || new_height < MIN_HEIGHT as i64 {
            return Err(ResizeError::TooSmall {
                width: new_width,
                height: new_height,
            });
        }

        let (width, height) = match (u32::try_from(new_width), u32::try_from(new_height)) {
            (Ok(w), Ok(h)) if w <= MAX_DIMENSION && h <= MAX_DIMENSION => (w, h),
            _ => {
                return Err(ResizeError::TooLarge {
                    width: new_width,
                    height: new_height,
                })
            }
        };

        let shift = GridShift { dx: left, dy: up };
        let mut resized = TileGrid::new(width, height);
        for (x, y, tile) in self.cells() {
            if let Some((x, y)) = shift.apply(x, y) {
                resized.set(x, y, tile);
            }
        }
        *self = resized;
        Ok(shift)
    }
}
