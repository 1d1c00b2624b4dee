//! Snapshot-based undo/redo

use std::collections::VecDeque;
use world_builder_core::Level;

/// Default number of past snapshots kept per view
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Undo history made of whole-level snapshots
///
/// Callers take a [`backup`](EditHistory::backup) around every edit gesture.
/// Backups of an unchanged level are coalesced, so the past stack only holds
/// distinct states.
#[derive(Debug, Clone)]
pub struct EditHistory {
    past: VecDeque<Level>,
    future: Vec<Level>,
    /// Maximum past depth, 0 for unbounded
    limit: usize,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// History that keeps at most `limit` past snapshots (0 keeps all)
    pub fn with_limit(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            limit,
        }
    }

    /// Record the current level state
    ///
    /// Pushes a copy only when `level` differs from the latest snapshot.
    /// Always discards the redo stack. Returns whether a snapshot was pushed.
    pub fn backup(&mut self, level: &Level) -> bool {
        self.future.clear();
        if self.past.back() == Some(level) {
            return false;
        }
        self.push_past(level.clone());
        true
    }

    /// Step back to the previous distinct state
    ///
    /// When `current` is identical to the latest snapshot (a backup was taken
    /// right after the edit), that snapshot is consumed so the undo lands on a
    /// different state. If it was the only snapshot, the past empties and
    /// `current` moves onto the redo stack unchanged.
    /// Returns whether `current` changed.
    pub fn undo(&mut self, current: &mut Level) -> bool {
        if self.past.back() == Some(&*current) {
            self.past.pop_back();
            if self.past.is_empty() {
                self.future.push(current.clone());
                return false;
            }
        }
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        self.future.push(std::mem::replace(current, previous));
        true
    }

    /// Reapply the most recently undone state
    pub fn redo(&mut self, current: &mut Level) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        let previous = std::mem::replace(current, next);
        self.push_past(previous);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    fn push_past(&mut self, level: Level) {
        self.past.push_back(level);
        if self.limit > 0 {
            while self.past.len() > self.limit {
                self.past.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painted(level: &Level, x: i32, tile: u32) -> Level {
        let mut next = level.clone();
        next.tiles.set(x, 0, tile);
        next
    }

    #[test]
    fn test_backup_coalesces_unchanged_level() {
        let level = Level::new("Test");
        let mut history = EditHistory::new();
        assert!(history.backup(&level));
        assert!(!history.backup(&level));
        assert_eq!(history.past_len(), 1);
    }

    #[test]
    fn test_backup_clears_future() {
        let seed = Level::new("Test");
        let mut history = EditHistory::new();
        history.backup(&seed);
        let mut current = painted(&seed, 0, 1);
        history.backup(&current);
        history.undo(&mut current);
        assert!(history.can_redo());

        history.backup(&current);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_skips_identical_snapshot() {
        let seed = Level::new("Test");
        let mut history = EditHistory::new();
        history.backup(&seed);

        // Edit, then back up the result
        let mut current = painted(&seed, 0, 1);
        history.backup(&current);

        assert!(history.undo(&mut current));
        assert_eq!(current, seed);
    }

    #[test]
    fn test_undo_without_trailing_backup() {
        let seed = Level::new("Test");
        let mut history = EditHistory::new();
        history.backup(&seed);

        let mut current = painted(&seed, 0, 1);
        assert!(history.undo(&mut current));
        assert_eq!(current, seed);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_undo_of_lone_seed_moves_it_to_future() {
        let seed = Level::new("Test");
        let mut history = EditHistory::new();
        history.backup(&seed);

        let mut current = seed.clone();
        assert!(!history.undo(&mut current));
        assert_eq!(current, seed);
        assert_eq!(history.past_len(), 0);
        assert_eq!(history.future_len(), 1);
        assert!(!history.can_undo());
        assert!(history.can_redo());

        assert!(history.redo(&mut current));
        assert_eq!(current, seed);
        assert_eq!(history.past_len(), 1);
        assert_eq!(history.future_len(), 0);
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut history = EditHistory::new();
        let mut current = Level::new("Test");
        assert!(!history.undo(&mut current));
        assert!(!history.redo(&mut current));
    }

    #[test]
    fn test_undo_then_redo_restores_state() {
        let seed = Level::new("Test");
        let mut history = EditHistory::new();
        history.backup(&seed);

        let mut current = seed.clone();
        for x in 0..4 {
            current = painted(&current, x, x as u32 + 1);
            history.backup(&current);
        }

        let before = current.clone();
        assert!(history.undo(&mut current));
        assert_ne!(current, before);
        assert!(history.redo(&mut current));
        assert_eq!(current, before);
        assert!(!history.redo(&mut current));
        assert_eq!(current, before);
    }

    #[test]
    fn test_repeated_undo_walks_back_through_states() {
        let seed = Level::new("Test");
        let mut history = EditHistory::new();
        history.backup(&seed);

        let one = painted(&seed, 0, 1);
        history.backup(&one);
        let two = painted(&one, 1, 2);
        history.backup(&two);

        let mut current = two.clone();
        history.undo(&mut current);
        assert_eq!(current, one);
        history.undo(&mut current);
        assert_eq!(current, seed);
        history.redo(&mut current);
        assert_eq!(current, one);
        history.redo(&mut current);
        assert_eq!(current, two);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = EditHistory::with_limit(3);
        let mut current = Level::new("Test");
        for x in 0..6 {
            current = painted(&current, x, 7);
            history.backup(&current);
        }
        assert_eq!(history.past_len(), 3);

        let unbounded = {
            let mut h = EditHistory::with_limit(0);
            let mut level = Level::new("Test");
            for x in 0..6 {
                level = painted(&level, x, 7);
                h.backup(&level);
            }
            h
        };
        assert_eq!(unbounded.past_len(), 6);
    }

    #[test]
    fn test_clear() {
        let mut history = EditHistory::new();
        let level = Level::new("Test");
        history.backup(&level);
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
