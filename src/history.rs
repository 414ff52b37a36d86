//! Linear undo/redo history.
//!
//! A snapshot has two halves with different lifetimes:
//!
//! - [`EditState`] — small, serializable, persisted between runs.
//! - [`SnapshotBitmaps`] — the baseline the entry was rendered from plus the
//!   rendered bitmap exactly as committed (JPEG bytes). Ephemeral: bitmaps
//!   dominate the session size, so they are never written into the
//!   persisted history.
//!
//! Keeping the halves in separate collections (rather than base64-encoding
//! images into one JSON blob) is what lets [`StateHistory`] serialize whole.
//!
//! Committing while positioned before the last entry discards everything
//! after the current index — the redo branch is lost. That is the intended
//! transition rule, not an accident, and the tests pin it.

use crate::state::EditState;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Bitmap payload for one history entry.
///
/// Consecutive entries usually share a baseline (only crop/rotate/reset
/// produce a new one), so it is reference-counted rather than cloned.
#[derive(Debug, Clone)]
pub struct SnapshotBitmaps {
    /// The baseline the entry was rendered from.
    pub baseline: Arc<RgbaImage>,
    /// The rendered bitmap exactly as committed, JPEG-encoded. Undo/redo
    /// restore these bytes; they never re-run the filter pipeline.
    pub rendered_jpeg: Vec<u8>,
}

/// The serializable shape of a history: states plus the current position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateHistory {
    pub states: Vec<EditState>,
    pub index: usize,
}

/// In-memory history: a non-empty list of snapshots and a cursor.
///
/// Invariant: `states` and `bitmaps` have equal length ≥ 1, and
/// `index < states.len()`. Entries rehydrated from a [`StateHistory`] have
/// no bitmaps; callers recompute when they land on one.
#[derive(Debug)]
pub struct HistoryStore {
    states: Vec<EditState>,
    bitmaps: Vec<Option<SnapshotBitmaps>>,
    index: usize,
}

impl HistoryStore {
    /// Start a fresh history from the initial snapshot.
    pub fn new(state: EditState, bitmaps: SnapshotBitmaps) -> Self {
        Self {
            states: vec![state],
            bitmaps: vec![Some(bitmaps)],
            index: 0,
        }
    }

    /// Rebuild from a persisted history; bitmap payloads are gone.
    ///
    /// Returns `None` when the persisted shape violates the invariant
    /// (empty list or out-of-range index) — callers fall back to a fresh
    /// session rather than trusting it.
    pub fn from_persisted(persisted: StateHistory) -> Option<Self> {
        if persisted.states.is_empty() || persisted.index >= persisted.states.len() {
            return None;
        }
        let bitmaps = vec![None; persisted.states.len()];
        Some(Self {
            states: persisted.states,
            bitmaps,
            index: persisted.index,
        })
    }

    /// The serializable half of every snapshot, for the session store.
    pub fn to_persisted(&self) -> StateHistory {
        StateHistory {
            states: self.states.clone(),
            index: self.index,
        }
    }

    /// Number of snapshots; at least 1 by construction.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the cursor sits on the most recent snapshot.
    pub fn is_at_latest(&self) -> bool {
        self.index == self.states.len() - 1
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.states.len() - 1
    }

    pub fn current_state(&self) -> &EditState {
        &self.states[self.index]
    }

    pub fn current_bitmaps(&self) -> Option<&SnapshotBitmaps> {
        self.bitmaps[self.index].as_ref()
    }

    /// Refill the bitmap payload of the current entry (after a recompute
    /// fallback on a rehydrated history).
    pub fn restore_current_bitmaps(&mut self, bitmaps: SnapshotBitmaps) {
        self.bitmaps[self.index] = Some(bitmaps);
    }

    /// Append a snapshot, discarding any redo branch first.
    pub fn commit(&mut self, state: EditState, bitmaps: SnapshotBitmaps) {
        self.states.truncate(self.index + 1);
        self.bitmaps.truncate(self.index + 1);
        self.states.push(state);
        self.bitmaps.push(Some(bitmaps));
        self.index = self.states.len() - 1;
    }

    /// Step back one snapshot. No-op at the beginning.
    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Step forward one snapshot. No-op at the end.
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Collapse to a single snapshot (the untouched-original state).
    pub fn reset(&mut self, state: EditState, bitmaps: SnapshotBitmaps) {
        self.states = vec![state];
        self.bitmaps = vec![Some(bitmaps)];
        self.index = 0;
    }
}
