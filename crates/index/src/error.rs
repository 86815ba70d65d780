//! Index Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// An index error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The package inventory could not be enumerated at all.
    #[display("package inventory unavailable")]
    Inventory,
    /// A package needs its prebuilt archive, but doesn't have one.
    #[display("no prebuilt archive available for {_0}")]
    MissingArchive(#[error(not(source))] String),
    /// Downloading an archive failed.
    #[display("failed to fetch archive: {_0}")]
    Fetch(#[error(not(source))] String),
    /// A downloaded archive couldn't be read.
    #[display("unreadable archive: {}", _0.display())]
    Archive(#[error(not(source))] PathBuf),
    /// The index file could not be written into place.
    #[display("failed to persist index to {}", _0.display())]
    Persist(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Fetch(_))
    }
}
