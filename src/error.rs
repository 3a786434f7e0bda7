//! Error type of the crate.
//!
//! The coordinator itself never fails: curves without work are skipped.
//! Writing the statistics report is the only fallible operation.

use std::path::PathBuf;

/// Errors raised while writing reports.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A report file could not be created or written.
    #[error("could not write report file {path}: {source}")]
    Report {
        /// The file that was written.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
    /// Writing to a report stream failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type of the crate.
pub type Result<T> = std::result::Result<T, Error>;
