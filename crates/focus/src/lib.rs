//! # focus
//!
//! Snapshots of "what had focus, and where" that survive a DOM replacement.
//!
//! This crate provides:
//! - [`FocusCapsule`]: re-discoverable description of the focused element,
//!   its selection and its scroll offsets
//! - [`ViewportCursor`]: scroll offsets of one scrollable element, used to
//!   revive scroll state after an element was relocated
//! - [`SavedStates`]: per-key caches of capsules and scroll positions
//! - [`FocusOption`] and [`ScrollOption`]: what a render should do with focus
//!   and scroll once new content is in place
//!
//! Everything here is best-effort: when a snapshot no longer matches the
//! document, restoring it silently does nothing.

mod capsule;
mod options;
mod saved;
mod viewport;

pub use capsule::FocusCapsule;
pub use dom::SelectionRange;
pub use options::{FocusOption, ScrollOption};
pub use saved::SavedStates;
pub use viewport::{ViewportCursor, capture_viewports, revive_viewports};
