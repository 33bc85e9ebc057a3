// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. align::AlignmentReport)
    clippy::module_name_repetitions
)]

//! # Alignsync
//!
//! A mutation-driven text-alignment synchronizer for DOM-like document
//! trees.
//!
//! Rich-text editors encode per-block text alignment declaratively, as a
//! block-type attribute or a marker class, and expect something else to
//! project that onto inline styles. Alignsync is that something else: it
//! re-discovers every editor in a document, strips the alignment styles it
//! owns, resolves each content block's alignment from its nearest marked
//! ancestor, and writes the result onto the block and all of its
//! descendants. Passes are full recomputations, so the applied styles are
//! always derivable from the markers alone.
//!
//! ## Modules
//!
//! - [`document`]: DOM-like arena tree, markup parsing and serialization
//! - [`align`]: the synchronization pass and consistency checks
//! - [`scheduler`]: startup/re-check/debounce pass scheduling
//! - [`watcher`]: file watching for live re-synchronization
//! - [`app`]: CLI application loop
//! - [`config`]: saved default flags

pub mod align;
pub mod app;
pub mod config;
pub mod document;
pub mod scheduler;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::align::{Alignment, check_stale, synchronize};
    pub use crate::document::{Document, NodeId};
    pub use crate::scheduler::{PassReason, SyncScheduler};
}
