//! Bounded undo/redo log of simulation snapshots
//!
//! The log holds deep copies of [`SimulationState`]; `cursor` points at the
//! entry that matches the live state. Recording after an undo discards the
//! redo branch. When the log is full the oldest entry is dropped and the
//! cursor stays on the newest one, so it never drifts from the log.

use std::collections::VecDeque;

use crate::error::{Result, SimError};
use crate::simulation::states::SimulationState;

#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: VecDeque<SimulationState>,
    cursor: usize,
    capacity: usize,
}

impl HistoryManager {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            cursor: 0,
            capacity,
        }
    }

    /// Push a deep copy of `state` as the new current entry
    pub fn snapshot(&mut self, state: &SimulationState) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push_back(state.clone());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one entry and return it for restoring
    pub fn undo(&mut self) -> Result<&SimulationState> {
        if self.cursor == 0 || self.entries.is_empty() {
            return Err(SimError::NoHistory);
        }
        self.cursor -= 1;
        Ok(&self.entries[self.cursor])
    }

    /// Step forward one entry and return it for restoring
    pub fn redo(&mut self) -> Result<&SimulationState> {
        if self.cursor + 1 >= self.entries.len() {
            return Err(SimError::NoHistory);
        }
        self.cursor += 1;
        Ok(&self.entries[self.cursor])
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Entry matching the live state, if any has been recorded
    pub fn current(&self) -> Option<&SimulationState> {
        self.entries.get(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
