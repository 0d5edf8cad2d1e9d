//! Merge engines for the supported settings formats.
//!
//! Each engine reconciles one fragment file into one target file, in place:
//! values defined by the fragment win, everything the fragment does not
//! mention is preserved. Engines are selected by format name, so the
//! orchestrator never needs to know which formats exist.

mod keyvalue;
mod xml;

pub use keyvalue::KeyValueMerge;
pub use xml::XmlMerge;

use std::path::Path;

/// Merge errors
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// A format-specific reconciliation algorithm.
///
/// `merge` reads both files, applies the fragment's settings on top of the
/// target's, and rewrites the target. One call is one full
/// read-modify-write pass; nothing is retained between calls.
pub trait MergeEngine {
    fn merge(&self, source: &Path, target: &Path) -> Result<(), MergeError>;
}

/// Look up the engine for a format name (case-insensitive).
///
/// Returns `None` for unknown formats; callers treat that as "nothing to
/// merge" rather than an error.
pub fn engine_for(kind: &str) -> Option<Box<dyn MergeEngine>> {
    match kind.to_ascii_lowercase().as_str() {
        "keyvalue" => Some(Box::new(KeyValueMerge)),
        "xml" => Some(Box::new(XmlMerge)),
        _ => None,
    }
}
