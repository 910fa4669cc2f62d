use std::path::PathBuf;

use thiserror::Error;

/// Error taxonomy for change-set mapping, materialization, and lint runs.
///
/// Only `Config`, `Copy`, and `Report` are meant to stop a run. The others are
/// scoped to a single token, unit, or task and are downgraded to log lines by
/// their callers.
#[derive(Debug, Error)]
pub enum BinmapError {
    /// Missing or malformed manifest/config input.
    #[error("Config error for {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    /// A path or token with no mapping-table entry.
    #[error("No mapping for {0}")]
    ResolutionGap(String),

    /// Filesystem copy failure; aborts the run.
    #[error("Failed to copy {src} to {dst}: {source}")]
    Copy {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// External VCS fetch failure; aborts only the affected unit.
    #[error("Checkout of {url} failed: {reason}")]
    Checkout { url: String, reason: String },

    /// A single file's analysis failed.
    #[error("Analysis of {path} failed: {reason}")]
    AnalysisTask { path: PathBuf, reason: String },

    /// The analysis was stopped through its cancellation token.
    #[error("Analysis of {0} was cancelled")]
    Cancelled(PathBuf),

    /// HTML report could not be written.
    #[error("Failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BinmapError {
    pub fn config(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Config { path: path.into(), reason: reason.to_string() }
    }
}

/// Convenience result type for core operations.
pub type Result<T> = std::result::Result<T, BinmapError>;
