//! Project registry collaborator
//!
//! The project file that lists every level lives outside this crate. Level
//! loading only needs two answers from it, so it is reached through this trait.

use std::path::PathBuf;

/// Lookup of per-level data held by the surrounding project
pub trait ProjectRegistry {
    /// World-map placement recorded for a level, overriding the level file's own
    fn world_pos(&self, level_name: &str) -> Option<[i32; 2]>;

    /// File path of a level, used to follow loading zones
    fn level_path(&self, level_name: &str) -> Option<PathBuf>;
}
