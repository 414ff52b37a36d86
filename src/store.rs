//! Session persistence port.
//!
//! The editor never touches storage directly: it calls a [`SessionStore`]
//! injected at construction, once per committed change. This keeps the
//! editing pipeline free of I/O and lets tests swap in a recording mock.
//!
//! # Two stores, two size classes
//!
//! Persisted session state is split by size:
//!
//! - **State** (`session.json`): the bitmap-free history — filter flags,
//!   slider values, tool state, cursor position. Small, versioned JSON,
//!   refused above [`MAX_STATE_BYTES`].
//! - **Baseline** (`baseline.jpg`): the working baseline image bytes,
//!   stored separately because bitmaps dominate the payload. On resume the
//!   baseline is rehydrated and the rendered bitmap regenerated by a full
//!   recompute.
//!
//! Loading is tolerant: a missing, corrupt, oversize, or version-mismatched
//! state file loads as `None` and the session starts fresh — never a crash.

use crate::history::StateHistory;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Ceiling for the serialized state payload, mirroring the product's 4MB
/// local-store limit.
pub const MAX_STATE_BYTES: usize = 4 * 1024 * 1024;

const STATE_FILENAME: &str = "session.json";
const BASELINE_FILENAME: &str = "baseline.jpg";

/// Version of the persisted state format. Bump to invalidate existing
/// sessions when the shape or semantics change.
const STATE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize session state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything the session persists between runs, minus bitmap payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub version: u32,
    pub history: StateHistory,
}

impl PersistedSession {
    pub fn new(history: StateHistory) -> Self {
        Self {
            version: STATE_VERSION,
            history,
        }
    }
}

/// Where a session keeps its state between runs.
///
/// Every backend must implement all five operations so the editor is
/// storage-agnostic. `load_*` return `Option` rather than `Result`: any
/// failure to produce usable data means "no saved session".
pub trait SessionStore {
    /// Persist the bitmap-free session state. Oversize payloads are
    /// dropped (and any stale file removed), not an error.
    fn save_state(&self, session: &PersistedSession) -> Result<(), StoreError>;

    /// Load the persisted state, or `None` if absent/unusable.
    fn load_state(&self) -> Option<PersistedSession>;

    /// Persist the working baseline image bytes.
    fn save_baseline(&self, jpeg: &[u8]) -> Result<(), StoreError>;

    /// Load the baseline bytes, or `None` if absent.
    fn load_baseline(&self) -> Option<Vec<u8>>;

    /// Remove everything persisted for this session.
    fn clear(&self) -> Result<(), StoreError>;
}

/// File-backed store: versioned JSON state plus a sibling baseline image.
pub struct JsonSessionStore {
    dir: PathBuf,
}

impl JsonSessionStore {
    /// Store under `dir`, creating it on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILENAME)
    }

    fn baseline_path(&self) -> PathBuf {
        self.dir.join(BASELINE_FILENAME)
    }
}

impl SessionStore for JsonSessionStore {
    fn save_state(&self, session: &PersistedSession) -> Result<(), StoreError> {
        let json = serde_json::to_string(session)?;
        if json.len() > MAX_STATE_BYTES {
            // Too large to persist; drop any stale state so a resume
            // doesn't revive an older session.
            let _ = std::fs::remove_file(self.state_path());
            return Ok(());
        }
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.state_path(), json)?;
        Ok(())
    }

    fn load_state(&self) -> Option<PersistedSession> {
        let content = std::fs::read_to_string(self.state_path()).ok()?;
        if content.len() > MAX_STATE_BYTES {
            return None;
        }
        let session: PersistedSession = serde_json::from_str(&content).ok()?;
        if session.version != STATE_VERSION {
            return None;
        }
        Some(session)
    }

    fn save_baseline(&self, jpeg: &[u8]) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.baseline_path(), jpeg)?;
        Ok(())
    }

    fn load_baseline(&self) -> Option<Vec<u8>> {
        std::fs::read(self.baseline_path()).ok()
    }

    fn clear(&self) -> Result<(), StoreError> {
        for path in [self.state_path(), self.baseline_path()] {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

/// Store that keeps nothing — for one-shot batch runs where persistence
/// would only leave litter behind.
pub struct DiscardStore;

impl SessionStore for DiscardStore {
    fn save_state(&self, _session: &PersistedSession) -> Result<(), StoreError> {
        Ok(())
    }

    fn load_state(&self) -> Option<PersistedSession> {
        None
    }

    fn save_baseline(&self, _jpeg: &[u8]) -> Result<(), StoreError> {
        Ok(())
    }

    fn load_baseline(&self) -> Option<Vec<u8>> {
        None
    }

    fn clear(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
