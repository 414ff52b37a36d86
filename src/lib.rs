//! # Robeautify
//!
//! A headless photo-editing engine: named filters, tonal adjustments,
//! crop/rotate geometry, and a linear undo history, behind one session
//! object. The rendering shell around it (canvas, pointer events, upload
//! forms) is deliberately out of scope — this crate is the part that
//! computes pixels and remembers what you did.
//!
//! # Architecture: Recompute From the Baseline
//!
//! Every state change re-renders the visible bitmap from the session
//! *baseline*, never from the previous frame:
//!
//! ```text
//! baseline ──► enabled filters (fixed order) ──► adjustments ──► rendered
//!     ▲                                                            │
//!     └── replaced only by crop / rotate / reset          snapshot │
//!                                                                  ▼
//!                                                       history + store
//! ```
//!
//! This keeps filters idempotent under re-render: toggling `sepia` off
//! reproduces the exact pre-sepia pixels because nothing ever compounds
//! onto the rendered frame. Crop and rotate are the deliberate exceptions —
//! they bake a new baseline and are undone only through history.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`state`] | Filter set, slider values, tool state — the serializable snapshot half |
//! | [`filters`] | Per-pixel transforms and the seedable noise source |
//! | [`geometry`] | Crop-rect solving, handle hit-testing, rotation bookkeeping |
//! | [`pipeline`] | Decode/validate/downscale on load, the recompute pass, JPEG export |
//! | [`history`] | Undo/redo: serializable states + ephemeral bitmap cache |
//! | [`store`] | `SessionStore` port: versioned JSON state + baseline image file |
//! | [`editor`] | `EditorSession` — the single owner of all mutable editing state |
//! | [`output`] | CLI output formatting (pure `format_*` + `print_*` wrappers) |
//!
//! # Design Decisions
//!
//! ## Snapshots Split Two Ways
//!
//! A history snapshot is state plus bitmaps, but the two halves live in
//! separate collections: [`history::StateHistory`] serializes whole (small
//! JSON, persisted), while bitmap payloads stay in an in-memory cache keyed
//! by history index. Nothing base64-encodes image bytes into JSON, and the
//! persisted state stays under a hard 4MB ceiling.
//!
//! ## Undo Restores, Never Recomputes
//!
//! Each snapshot stores the rendered bitmap exactly as committed. Undo and
//! redo hand those bytes back; the filter pipeline does not run again. The
//! one exception is a session resumed from disk, where old entries have no
//! cached bitmaps and stepping onto one regenerates it.
//!
//! ## Deterministic "Randomness"
//!
//! The grain and decoration filters draw from a per-coordinate hash seeded
//! at the session level, not a stateful RNG. Re-rendering a restored
//! session reproduces the exact grain, and regression tests can pin a seed.
//!
//! ## Persistence Is a Port
//!
//! The session never touches storage directly; it calls the injected
//! [`store::SessionStore`] after each commit. The shipped implementation
//! writes two files (state JSON + baseline JPEG); tests inject a recording
//! mock; one-shot CLI runs inject a discard store.

pub mod editor;
pub mod filters;
pub mod geometry;
pub mod history;
pub mod output;
pub mod pipeline;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
