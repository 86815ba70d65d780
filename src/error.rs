//! Command Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A command error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for command execution.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    /// The index could not be loaded, updated or saved.
    #[display("index error: {}", _0.display())]
    Index(#[error(not(source))] PathBuf),
    #[display("lookup failed for '{_0}'")]
    Lookup(#[error(not(source))] String),
    /// The remote index or an archive could not be downloaded.
    #[display("download failed")]
    Fetch,
    #[display("Homebrew is unavailable")]
    Brew,
    /// `git commit` failed; the index has been saved but not committed.
    #[display("failed to commit {}", _0.display())]
    Commit(#[error(not(source))] PathBuf),
    #[display("unsupported shell: {_0}")]
    UnsupportedShell(#[error(not(source))] String),
    #[display("I/O error: {_0}")]
    Io(std::io::Error),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch | Self::Io(_))
    }
}
