//! The package → executables index.
//!
//! An [`Index`] maps every known package name to the executables it ships.
//! It is persisted as a sorted, line-oriented text file (see [`format`]) so
//! that regenerating it produces minimal diffs under version control.
//!
//! [`update()`] refreshes an index from an [`Inventory`] of packages, fetching
//! prebuilt archives through an [`ArchiveFetcher`] where a package isn't
//! installed locally, and reports what changed as a [`ChangeSet`].

mod changes;
pub mod error;
pub mod executables;
pub mod format;
mod index;
mod inventory;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod stats;
mod store;
mod update;

pub use crate::changes::{Change, ChangeSet};
pub use crate::index::{Index, IndexEntry};
pub use crate::inventory::{Archive, ArchiveFetcher, Inventory, Package};
pub use crate::stats::Stats;
pub use crate::update::{PackageFailure, UpdateOptions, UpdateReport, update};
