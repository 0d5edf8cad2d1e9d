//! Bootstrap configuration merge for appliance settings files.
//!
//! This crate merges operator-supplied "bootstrap" fragment files into a
//! writable settings file without discarding settings the fragments do not
//! mention. Two on-disk formats are supported: flat `key=value` text and
//! attribute-based XML (`<type name=".." value=".."/>` entries).

pub mod backup;
pub mod merge;
pub mod pipeline;

pub use backup::{backup_path, create_backup, BackupError};
pub use merge::{engine_for, KeyValueMerge, MergeEngine, MergeError, XmlMerge};
pub use pipeline::{Pipeline, PipelineConfig, PipelineError, PipelineReport};
