//! Sparse coordinate-keyed overlays: loading zones, lights and height zones
//!
//! Each overlay is its own typed map. Loading zones are keyed by a 2D
//! [`GridPos`], lights by an exact [`LightPos`] that may sit between cells,
//! and height zones by a 3D [`SlicePos`], so a key of the wrong shape cannot
//! be constructed.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::tile_grid::GridShift;

/// Cell coordinate on the tile grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Cell coordinate plus height slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlicePos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl SlicePos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Light position in tile units
///
/// Lights are not snapped to the grid. Keys compare with a total order over
/// the raw coordinates, so two lights share a key only when both coordinates
/// are identical.
#[derive(Debug, Clone, Copy)]
pub struct LightPos {
    pub x: f64,
    pub y: f64,
}

impl LightPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Position on the origin of a cell
    pub fn at_cell(x: i32, y: i32) -> Self {
        Self::new(x as f64, y as f64)
    }
}

impl From<GridPos> for LightPos {
    fn from(pos: GridPos) -> Self {
        Self::at_cell(pos.x, pos.y)
    }
}

impl PartialEq for LightPos {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LightPos {}

impl PartialOrd for LightPos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LightPos {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }
}

/// Keys that sit on a grid cell and move with it on resize
pub trait ZoneKey: Copy + Ord {
    fn cell(&self) -> (i32, i32);
    /// Key moved by a resize shift, `None` if it leaves the coordinate range
    fn shifted(&self, shift: GridShift) -> Option<Self>;
}

impl ZoneKey for GridPos {
    fn cell(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    fn shifted(&self, shift: GridShift) -> Option<Self> {
        let (x, y) = shift.apply(self.x, self.y)?;
        Some(Self::new(x, y))
    }
}

impl ZoneKey for SlicePos {
    fn cell(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    fn shifted(&self, shift: GridShift) -> Option<Self> {
        let (x, y) = shift.apply(self.x, self.y)?;
        Some(Self::new(x, y, self.z))
    }
}

impl ZoneKey for LightPos {
    /// Nearest cell, halves rounding away from zero
    fn cell(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }

    fn shifted(&self, shift: GridShift) -> Option<Self> {
        Some(Self::new(self.x + shift.dx as f64, self.y + shift.dy as f64))
    }
}

/// Ordered sparse map from a grid key to an overlay value
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneMap<K: ZoneKey, V> {
    entries: BTreeMap<K, V>,
}

impl<K: ZoneKey, V> Default for ZoneMap<K, V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: ZoneKey, V> ZoneMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    /// Entries whose key sits on the given cell
    pub fn at_cell(&self, x: i32, y: i32) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().filter(move |(k, _)| k.cell() == (x, y))
    }

    /// Remove every entry sitting on a cell, returning how many were removed
    pub fn remove_at_cell(&mut self, x: i32, y: i32) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| k.cell() != (x, y));
        before - self.entries.len()
    }

    /// Move every key by a grid shift and drop entries that leave the grid
    pub fn shift_and_clip(&mut self, shift: GridShift, width: u32, height: u32) {
        let entries = std::mem::take(&mut self.entries);
        self.entries = entries
            .into_iter()
            .filter_map(|(k, v)| Some((k.shifted(shift)?, v)))
            .filter(|(k, _)| {
                let (x, y) = k.cell();
                x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height
            })
            .collect();
    }
}

impl<K: ZoneKey, V> FromIterator<(K, V)> for ZoneMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Transition to another level
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadingZone {
    /// Target level name; empty means the zone is inactive
    pub target_level: String,
    /// Arrival position `[x, y, z]` in the target level
    pub target_pos: [i32; 3],
}

impl LoadingZone {
    pub fn new(target_level: impl Into<String>, target_pos: [i32; 3]) -> Self {
        Self {
            target_level: target_level.into(),
            target_pos,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.target_level.is_empty()
    }
}

/// Radial falloff for one color channel of a light
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorFade {
    pub amplitude: f32,
    pub inner_diameter: f32,
    pub outer_diameter: f32,
}

impl ColorFade {
    pub fn new(amplitude: f32, inner_diameter: f32, outer_diameter: f32) -> Self {
        Self {
            amplitude,
            inner_diameter,
            outer_diameter,
        }
    }

    /// Channel intensity at a distance from the light's center
    pub fn intensity_at(&self, distance: f32) -> f32 {
        let inner = self.inner_diameter / 2.0;
        let outer = self.outer_diameter / 2.0;
        if distance <= inner {
            self.amplitude
        } else if distance >= outer || outer <= inner {
            0.0
        } else {
            self.amplitude * (outer - distance) / (outer - inner)
        }
    }
}

/// Point light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub diameter: f32,
    pub red: ColorFade,
    pub green: ColorFade,
    pub blue: ColorFade,
    pub blacklight: bool,
    pub active: bool,
}

impl Light {
    /// White light fading linearly to zero at its diameter
    pub fn new(diameter: f32) -> Self {
        let fade = ColorFade::new(1.0, 0.0, diameter);
        Self {
            diameter,
            red: fade,
            green: fade,
            blue: fade,
            blacklight: false,
            active: true,
        }
    }

    pub fn with_channels(mut self, red: ColorFade, green: ColorFade, blue: ColorFade) -> Self {
        self.red = red;
        self.green = green;
        self.blue = blue;
        self
    }

    pub fn with_blacklight(mut self, blacklight: bool) -> Self {
        self.blacklight = blacklight;
        self
    }
}

/// Height change applied when entering a cell on a given slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeightZone {
    pub target_height: i32,
}

pub type LoadingZoneMap = ZoneMap<GridPos, LoadingZone>;
pub type LightMap = ZoneMap<LightPos, Light>;
pub type HeightZoneMap = ZoneMap<SlicePos, HeightZone>;

impl ZoneMap<SlicePos, HeightZone> {
    /// Height zones belonging to one height slice
    pub fn in_slice(&self, z: i32) -> impl Iterator<Item = (&SlicePos, &HeightZone)> {
        self.entries.iter().filter(move |(k, _)| k.z == z)
    }
}
