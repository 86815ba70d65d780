//! Answering "which package provides this command?".
//!
//! Lookups run against a parsed [`Index`](whence_index::Index) via
//! [`search()`], or straight against the raw index text via [`search_text()`]
//! and [`search_file()`], which avoid parsing lines that can't possibly match.
//! [`explain()`] turns the results into install advice for a shell's
//! command-not-found hook.

pub mod error;
mod explain;
mod search;

pub use crate::explain::{PackageStatus, Status, explain, installable};
pub use crate::search::{search, search_file, search_text};
