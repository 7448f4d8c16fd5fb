//! Snapshot-based undo history for the rectangle set.
//!
//! Every mutating operation pushes the full rectangle set *before* the change
//! is applied; undo pops the most recent snapshot and restores it. Snapshots
//! are `Arc` slices, so pushing one shares the live set instead of copying it.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_UNDO_CAPACITY;
use crate::model::DrawnRectangle;

/// Immutable, cheaply clonable rectangle set.
pub type RectangleSet = Arc<[DrawnRectangle]>;

// ============================================================================
// Undo Stack
// ============================================================================

/// Configuration for the undo stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoConfig {
    /// Maximum number of snapshots to keep in history
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_UNDO_CAPACITY
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// Bounded, oldest-first history of snapshots.
///
/// When full, pushing evicts the oldest snapshot (FIFO by age). Popping an
/// empty stack is a no-op that returns `None`.
#[derive(Debug, Clone)]
pub struct UndoStack<T: Clone = RectangleSet> {
    /// Snapshots, oldest at the front
    snapshots: VecDeque<T>,
    /// Configuration
    config: UndoConfig,
}

impl<T: Clone> Default for UndoStack<T> {
    fn default() -> Self {
        Self::with_config(UndoConfig::default())
    }
}

impl<T: Clone> UndoStack<T> {
    /// Create a new empty undo stack with the default capacity
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: UndoConfig) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(config.capacity.min(DEFAULT_UNDO_CAPACITY)),
            config,
        }
    }

    /// Push a snapshot (call this BEFORE making a change).
    pub fn push(&mut self, snapshot: T) {
        if self.config.capacity == 0 {
            return;
        }
        self.snapshots.push_back(snapshot);

        // Limit history size
        while self.snapshots.len() > self.config.capacity {
            self.snapshots.pop_front();
        }
        log::debug!("📝 Undo: pushed snapshot ({} in history)", self.snapshots.len());
    }

    /// Pop the most recent snapshot, or None if there is nothing to undo.
    pub fn pop(&mut self) -> Option<T> {
        let snapshot = self.snapshots.pop_back()?;
        log::debug!("⏪ Undo: restored snapshot ({} left)", self.snapshots.len());
        Some(snapshot)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.snapshots.is_empty()
    }

    /// Most recent snapshot without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.snapshots.back()
    }

    /// Get the number of snapshots in history
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Snapshots from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.snapshots.iter()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.snapshots.clear();
        log::debug!("🗑️ Undo history cleared");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoxLabel, NormalizedBbox, RectangleId};

    fn set_of(ids: &[u64]) -> RectangleSet {
        ids.iter()
            .map(|&id| {
                DrawnRectangle::new(
                    RectangleId(id),
                    NormalizedBbox::new(0.1, 0.1, 0.2, 0.2),
                    BoxLabel::Unreviewed,
                )
            })
            .collect()
    }

    #[test]
    fn test_undo_stack_basic() {
        let mut stack: UndoStack = UndoStack::new();
        assert!(!stack.can_undo());

        stack.push(set_of(&[1]));
        assert!(stack.can_undo());

        let restored = stack.pop().expect("snapshot");
        assert_eq!(restored.len(), 1);
        assert!(!stack.can_undo());
    }

    #[test]
    fn test_pop_empty_is_noop() {
        let mut stack: UndoStack<u32> = UndoStack::new();
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.len(), 0);
    }

    #[test]
    fn test_pop_returns_most_recent_first() {
        let mut stack = UndoStack::new();
        stack.push(1);
        stack.push(2);
        stack.push(3);
        assert_eq!(stack.pop(), Some(3));
        assert_eq!(stack.pop(), Some(2));
        assert_eq!(stack.peek(), Some(&1));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut stack = UndoStack::with_config(UndoConfig { capacity: 50 });
        for i in 0..60 {
            stack.push(i);
        }
        assert_eq!(stack.len(), 50);
        let kept: Vec<i32> = stack.iter().copied().collect();
        assert_eq!(kept.first(), Some(&10), "the 10 oldest are evicted");
        assert_eq!(kept.last(), Some(&59));
    }

    #[test]
    fn test_snapshots_share_storage() {
        let live = set_of(&[1, 2, 3]);
        let mut stack: UndoStack = UndoStack::new();
        stack.push(Arc::clone(&live));
        assert!(Arc::ptr_eq(stack.peek().expect("snapshot"), &live));
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut stack = UndoStack::with_config(UndoConfig { capacity: 0 });
        stack.push(1);
        assert!(!stack.can_undo());
    }
}
