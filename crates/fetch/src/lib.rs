//! Blocking HTTP downloads.
//!
//! - [`HttpClient`]: a `reqwest` client with per-attempt timeouts, bounded
//!   retries with backoff, and a low-speed floor for stalled transfers.
//! - [`BottleFetcher`]: an [`ArchiveFetcher`](whence_index::ArchiveFetcher)
//!   that downloads package archives into a checksum-verified cache.
//! - [`RemoteIndex`]: mirrors a published executables index to a local file
//!   with conditional requests.

mod bottle;
mod client;
pub mod error;
mod low_speed;
mod remote;

pub use crate::bottle::BottleFetcher;
pub use crate::client::{ClientOptions, HttpClient};
pub use crate::low_speed::LowSpeedReader;
pub use crate::remote::{RemoteIndex, SyncOutcome};
