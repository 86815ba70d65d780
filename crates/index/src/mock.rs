//! In-memory inventory and archive fetcher for testing.
//!
//! Panics here are deliberate: these types only exist for tests, and broken
//! test setup should never let a test pass.

use crate::error::{ErrorKind, Result};
use crate::inventory::{Archive, ArchiveFetcher, Inventory, Package};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tar::{Builder, EntryType, Header};
use tempfile::TempDir;
use whence_compress::Compression;

enum EntryKind {
    File,
    Directory,
    Symlink(PathBuf),
}

/// One member of a generated tar archive.
pub struct ArchiveEntry {
    path: PathBuf,
    kind: EntryKind,
    mode: u32,
}
impl ArchiveEntry {
    pub fn file(path: impl Into<PathBuf>, mode: u32) -> Self {
        Self { path: path.into(), kind: EntryKind::File, mode }
    }

    pub fn executable(path: impl Into<PathBuf>) -> Self {
        Self::file(path, 0o755)
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), kind: EntryKind::Directory, mode: 0o755 }
    }

    pub fn symlink(path: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), kind: EntryKind::Symlink(target.into()), mode: 0o755 }
    }
}

/// Write a tar archive of `entries` to `path`, wrapped in `compression`.
pub fn write_archive(path: &Path, compression: Compression, entries: &[ArchiveEntry]) {
    let file = File::create(path).unwrap_or_else(|e| panic!("write_archive: create {}: {e}", path.display()));
    let writer = compression.wrap_writer(file).unwrap_or_else(|e| panic!("write_archive: encoder: {e:?}"));
    let mut builder = Builder::new(writer);
    for entry in entries {
        let mut header = Header::new_gnu();
        header.set_mode(entry.mode);
        let result = match &entry.kind {
            EntryKind::File => {
                let contents = b"#!/bin/sh\nexit 0\n";
                header.set_entry_type(EntryType::Regular);
                header.set_size(contents.len() as u64);
                builder.append_data(&mut header, &entry.path, &contents[..])
            },
            EntryKind::Directory => {
                header.set_entry_type(EntryType::Directory);
                header.set_size(0);
                builder.append_data(&mut header, &entry.path, io::empty())
            },
            EntryKind::Symlink(target) => {
                header.set_entry_type(EntryType::Symlink);
                header.set_size(0);
                builder.append_link(&mut header, &entry.path, target)
            },
        };
        result.unwrap_or_else(|e| panic!("write_archive: append {}: {e}", entry.path.display()));
    }
    // Dropping the returned writer finishes the compression stream.
    builder.into_inner().unwrap_or_else(|e| panic!("write_archive: finish: {e}"));
}

/// Fixed inventory of packages.
#[derive(Default)]
pub struct MockInventory {
    packages: Vec<Package>,
    incomplete: bool,
    unavailable: bool,
}
impl MockInventory {
    pub fn new(packages: impl IntoIterator<Item = Package>) -> Self {
        Self { packages: packages.into_iter().collect(), ..Default::default() }
    }

    /// Report the inventory as a subset of all packages.
    pub fn incomplete(mut self) -> Self {
        self.incomplete = true;
        self
    }

    /// Fail enumeration entirely.
    pub fn unavailable() -> Self {
        Self { unavailable: true, ..Default::default() }
    }
}
impl Inventory for MockInventory {
    fn packages(&self) -> Result<Vec<Package>> {
        if self.unavailable {
            exn::bail!(ErrorKind::Inventory);
        }
        Ok(self.packages.clone())
    }

    fn is_complete(&self) -> bool {
        !self.incomplete
    }
}

/// Serves generated archives by URL and records every fetch.
pub struct MockFetcher {
    directory: TempDir,
    archives: HashMap<String, Vec<ArchiveEntry>>,
    failing: HashSet<String>,
    fetched: RefCell<Vec<String>>,
}
impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}
impl MockFetcher {
    pub fn new() -> Self {
        Self {
            directory: tempfile::tempdir().unwrap_or_else(|e| panic!("MockFetcher: tempdir: {e}")),
            archives: HashMap::new(),
            failing: HashSet::new(),
            fetched: RefCell::new(Vec::new()),
        }
    }

    pub fn with_archive(mut self, url: impl Into<String>, entries: Vec<ArchiveEntry>) -> Self {
        self.archives.insert(url.into(), entries);
        self
    }

    /// Make fetches of `url` fail as if the network were down.
    pub fn failing(mut self, url: impl Into<String>) -> Self {
        self.failing.insert(url.into());
        self
    }

    /// URLs fetched so far, in order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.borrow().clone()
    }
}
impl ArchiveFetcher for MockFetcher {
    fn fetch(&self, archive: &Archive) -> Result<PathBuf> {
        let count = {
            let mut fetched = self.fetched.borrow_mut();
            fetched.push(archive.url.clone());
            fetched.len()
        };
        if self.failing.contains(&archive.url) {
            exn::bail!(ErrorKind::Fetch(format!("connection reset fetching {}", archive.url)));
        }
        let Some(entries) = self.archives.get(&archive.url) else {
            exn::bail!(ErrorKind::Fetch(format!("404 Not Found: {}", archive.url)));
        };
        let path = self.directory.path().join(format!("{count}.tar.gz"));
        write_archive(&path, Compression::Gzip, entries);
        Ok(path)
    }
}
