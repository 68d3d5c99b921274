// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history over copy-on-write graph snapshots.
//!
//! Snapshots are shared `Arc<Graph>` values, so recording an operation costs
//! one reference count rather than a serialized copy.

use crate::graph::Graph;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;

/// Maximum undo history depth
pub const MAX_HISTORY: usize = 100;

/// History errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,
}

#[derive(Debug, Clone)]
struct Entry {
    description: String,
    graph: Arc<Graph>,
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct History {
    /// Snapshots before each recorded operation
    undo_stack: VecDeque<Entry>,
    /// Snapshots before each undone operation
    redo_stack: Vec<Entry>,
    /// Maximum history depth
    max_depth: usize,
}

impl History {
    /// Create a new history manager
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// Record the snapshot taken before an operation
    pub fn record(&mut self, description: impl Into<String>, before: Arc<Graph>) {
        self.redo_stack.clear();
        self.undo_stack.push_back(Entry {
            description: description.into(),
            graph: before,
        });

        // Enforce history limit
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Step back; returns the snapshot to restore
    pub fn undo(&mut self, current: Arc<Graph>) -> Result<Arc<Graph>, HistoryError> {
        let entry = self
            .undo_stack
            .pop_back()
            .ok_or(HistoryError::NothingToUndo)?;
        self.redo_stack.push(Entry {
            description: entry.description,
            graph: current,
        });
        Ok(entry.graph)
    }

    /// Step forward; returns the snapshot to restore
    pub fn redo(&mut self, current: Arc<Graph>) -> Result<Arc<Graph>, HistoryError> {
        let entry = self
            .redo_stack
            .pop()
            .ok_or(HistoryError::NothingToRedo)?;
        self.undo_stack.push_back(Entry {
            description: entry.description,
            graph: current,
        });
        Ok(entry.graph)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Get description of next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.description.as_str())
    }

    /// Get description of next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.description.as_str())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
