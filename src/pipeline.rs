//! Pipeline orchestration for bootstrap merges.
//!
//! One run applies every matching fragment to one target file:
//! - optionally back the target up first (numbered `.bak<N>` sibling)
//! - look up the merge engine for the requested settings format
//! - scan the bootstrap directory (non-recursive) for files named
//!   `bootstrap.<target-basename>*`, in lexicographic filename order
//! - run one full merge pass per fragment, each mutating the target in
//!   place, so later fragments see earlier fragments' effects
//!
//! There is no transactionality across fragments: a failure partway through
//! leaves the target in the state the last successful pass produced.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use walkdir::WalkDir;

use crate::backup::{create_backup, BackupError};
use crate::merge::{engine_for, MergeError};

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("backup error: {0}")]
    Backup(#[from] BackupError),

    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Settings format of the target file (`keyvalue` or `xml`)
    pub format: String,

    /// Directory scanned (non-recursively) for fragment files
    pub bootstrap_dir: PathBuf,

    /// Configuration file updated in place
    pub target: PathBuf,

    /// Back the target up before the first merge pass
    pub backup: bool,

    /// Verbose output
    pub verbose: bool,
}

/// What a pipeline run did.
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Backup file created before the merge passes, if requested
    pub backup: Option<PathBuf>,

    /// Fragment files applied to the target, in application order
    pub fragments: Vec<PathBuf>,
}

/// Pipeline execution context
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the backup and every matching fragment merge, in order.
    pub fn run(&self) -> PipelineResult<PipelineReport> {
        let mut report = PipelineReport::default();

        if self.config.backup {
            let backup = create_backup(&self.config.target)?;
            if self.config.verbose {
                eprintln!("Backup: {}", backup.display());
            }
            report.backup = Some(backup);
        }

        let engine = match engine_for(&self.config.format) {
            Some(engine) => engine,
            None => {
                eprintln!(
                    "Warning: unknown data structure '{}', no fragments applied",
                    self.config.format
                );
                return Ok(report);
            }
        };

        let base_name = self
            .config
            .target
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                PipelineError::Config(format!(
                    "target has no file name: {}",
                    self.config.target.display()
                ))
            })?;
        let prefix = format!("bootstrap.{}", base_name);

        for entry in WalkDir::new(&self.config.bootstrap_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(&prefix) {
                continue;
            }

            if self.config.verbose {
                eprintln!(
                    "Merging {} into {}",
                    entry.path().display(),
                    self.config.target.display()
                );
            }
            engine.merge(entry.path(), &self.config.target)?;
            report.fragments.push(entry.into_path());
        }

        Ok(report)
    }
}
