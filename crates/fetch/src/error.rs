//! Fetch Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A fetch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The HTTP client could not be constructed (TLS backend, bad settings).
    #[display("failed to initialise HTTP client")]
    Client,
    /// The server could not be reached.
    #[display("failed to connect to {_0}")]
    Connect(#[error(not(source))] String),
    /// A request exceeded its overall time limit.
    #[display("request to {_0} timed out")]
    Timeout(#[error(not(source))] String),
    /// A transfer fell below the minimum speed for too long.
    #[display("transfer from {_0} was too slow")]
    SlowTransfer(#[error(not(source))] String),
    /// Any other failure to send a request or read its response.
    #[display("request to {_0} failed")]
    Request(#[error(not(source))] String),
    /// The server answered with an unexpected status.
    #[display("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    /// The downloaded payload isn't the one that was asked for.
    #[display("checksum mismatch for {url}: expected {expected}, got {actual}")]
    Checksum { url: String, expected: String, actual: String },
    /// A configured header value can't be sent.
    #[display("invalid {_0} header value")]
    InvalidHeader(#[error(not(source))] &'static str),
    /// A downloaded file couldn't be moved into place.
    #[display("failed to write {}", _0.display())]
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
        match self {
            Self::Connect(_) | Self::Timeout(_) | Self::SlowTransfer(_) | Self::Request(_) | Self::Io(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Client | Self::Checksum { .. } | Self::InvalidHeader(_) | Self::Persist(_) => false,
        }
    }
}
