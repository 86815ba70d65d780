//! Homebrew as a package source for whence.
//!
//! [`BrewInventory`] feeds index updates from `brew info --json=v2`, and
//! [`BrewStatus`] tells the lookup engine which formulae are worth suggesting.

mod brew;
pub mod error;
mod inventory;
pub mod json;
mod status;

pub use crate::brew::{Brew, Selection, parse_formulae};
pub use crate::inventory::{BrewInventory, Catalog, default_bottle_tag};
pub use crate::status::BrewStatus;
