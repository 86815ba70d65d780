//! Homebrew Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A Homebrew error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for Homebrew operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No `brew` executable was configured or found on `PATH`.
    #[display("brew not found; install Homebrew or set brew.executable")]
    NotFound,
    /// `brew` could not be started.
    #[display("failed to run {}", _0.display())]
    Spawn(#[error(not(source))] PathBuf),
    /// `brew` ran but reported failure.
    #[display("`brew {command}` failed: {message}")]
    Failed { command: String, message: String },
    /// `brew` printed something other than what was asked for.
    #[display("unexpected output from `brew {_0}`")]
    Output(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
