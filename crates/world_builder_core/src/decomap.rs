//! Sparse decoration overlay
//!
//! Decorations are stored in insertion order. Drawing and saving use the
//! painter's-algorithm order from [`Decomap::render_order`], which has to be
//! recomputed whenever a placement's height or offset changes.

use crate::tile_grid::GridShift;

/// A single decoration placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Deco {
    pub deco_id: u32,
    pub x: i32,
    pub y: i32,
    /// Base stacking value, editable per placement
    pub height: i32,
    /// Manual tie-breaker for overlapping decorations
    pub render_offset: i32,
}

impl Deco {
    pub fn new(deco_id: u32, x: i32, y: i32, height: i32) -> Self {
        Self {
            deco_id,
            x,
            y,
            height,
            render_offset: 0,
        }
    }

    /// Painter's-algorithm key: lower keys are drawn first
    pub fn render_key(&self) -> i64 {
        self.height as i64 + self.y as i64 + self.render_offset as i64
    }

    fn sort_identity(&self) -> (u32, i32, i32, i32, i32) {
        (self.deco_id, self.x, self.y, self.height, self.render_offset)
    }
}

/// Collection of decoration placements, unique per `(deco_id, x, y)`
#[derive(Debug, Clone, Default)]
pub struct Decomap {
    entries: Vec<Deco>,
}

impl Decomap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Place a decoration
    ///
    /// Id `0` is never stored, and placing an id already present at the same
    /// cell leaves the existing entry untouched. Returns whether an entry was added.
    pub fn add(&mut self, deco_id: u32, x: i32, y: i32, height: i32, render_offset: i32) -> bool {
        if deco_id == 0 || self.get(deco_id, x, y).is_some() {
            return false;
        }
        self.entries.push(Deco {
            deco_id,
            x,
            y,
            height,
            render_offset,
        });
        true
    }

    /// Remove every decoration at a cell, or only `deco_id` when given
    ///
    /// Returns the number of entries removed.
    pub fn remove(&mut self, x: i32, y: i32, deco_id: Option<u32>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|d| {
            !(d.x == x && d.y == y && deco_id.map_or(true, |id| id == d.deco_id))
        });
        before - self.entries.len()
    }

    /// All decorations at a cell, or `None` when the cell is bare
    pub fn query(&self, x: i32, y: i32) -> Option<Vec<&Deco>> {
        let found: Vec<&Deco> = self
            .entries
            .iter()
            .filter(|d| d.x == x && d.y == y)
            .collect();
        (!found.is_empty()).then_some(found)
    }

    /// All decorations inside an inclusive rectangle, in insertion order
    pub fn query_area(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<&Deco> {
        let (min_x, max_x) = (x0.min(x1), x0.max(x1));
        let (min_y, max_y) = (y0.min(y1), y0.max(y1));
        self.entries
            .iter()
            .filter(|d| (min_x..=max_x).contains(&d.x) && (min_y..=max_y).contains(&d.y))
            .collect()
    }

    pub fn get(&self, deco_id: u32, x: i32, y: i32) -> Option<&Deco> {
        self.entries
            .iter()
            .find(|d| d.deco_id == deco_id && d.x == x && d.y == y)
    }

    /// Mutable access for adjusting height or render offset after placement
    pub fn get_mut(&mut self, deco_id: u32, x: i32, y: i32) -> Option<&mut Deco> {
        self.entries
            .iter_mut()
            .find(|d| d.deco_id == deco_id && d.x == x && d.y == y)
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Deco> {
        self.entries.iter()
    }

    /// Stable-sort the stored entries into render order
    pub fn sort(&mut self) {
        self.entries.sort_by_key(Deco::render_key);
    }

    /// Entries in render order without reordering the map itself
    pub fn render_order(&self) -> Vec<Deco> {
        let mut sorted = self.entries.clone();
        sorted.sort_by_key(Deco::render_key);
        sorted
    }

    /// Move every entry by a grid shift and drop those that leave the grid
    pub fn shift_and_clip(&mut self, shift: GridShift, width: u32, height: u32) {
        self.entries.retain_mut(|d| match shift.apply(d.x, d.y) {
            Some((x, y)) if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height => {
                (d.x, d.y) = (x, y);
                true
            }
            _ => false,
        });
    }
}

/// Two decomaps are equal when they hold the same placements; storage order
/// is a render detail and does not count.
impl PartialEq for Decomap {
    fn eq(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        let mut a: Vec<_> = self.entries.iter().map(Deco::sort_identity).collect();
        let mut b: Vec<_> = other.entries.iter().map(Deco::sort_identity).collect();
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }
}

impl Eq for Decomap {}
