//! Refreshing an index from a package inventory.

use crate::changes::{Change, ChangeSet};
use crate::error::{ErrorKind, Result};
use crate::executables;
use crate::index::{Index, IndexEntry};
use crate::inventory::{Archive, ArchiveFetcher, Inventory, Package};
use exn::ResultExt;
use std::collections::{BTreeSet, HashSet};
use tracing::instrument;

/// Policy knobs for a single update pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Fetch archives for packages that aren't installed and aren't indexed yet.
    pub install_missing: bool,
    /// Re-fetch archives for indexed packages whose version has moved on.
    pub update_existing: bool,
    /// Stop issuing new fetches after this many.
    pub max_downloads: Option<usize>,
}

/// A package that needed an archive it doesn't have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFailure {
    pub package: String,
    pub reason: String,
}

/// Everything an update pass did, beyond the new index itself.
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub changes: ChangeSet,
    /// Packages that couldn't be resolved this pass (fetch failed, download
    /// budget exhausted, unreadable install). They'll be retried next run.
    pub unresolved: Vec<String>,
    /// Per-package errors: a fetch was required and impossible.
    pub failures: Vec<PackageFailure>,
    /// Number of archive fetches attempted.
    pub downloads: usize,
}

/// Where a package's executables were derived from this pass.
enum Resolution {
    Resolved(BTreeSet<String>),
    /// Not revisited; the existing entry (if any) stands.
    Untouched,
}

/// Refresh `index` against `inventory`.
///
/// Packages are visited in inventory order. For each one:
///
/// 1. **Installed**: executables are read from the install prefix.
/// 2. **Not indexed, archive available**: with
///    [`install_missing`](UpdateOptions::install_missing), the archive is
///    fetched and its listing used.
/// 3. **Indexed, version changed**: with
///    [`update_existing`](UpdateOptions::update_existing), the archive is
///    fetched again. A package without an archive is reported as a
///    [`PackageFailure`].
/// 4. Otherwise the existing entry is left alone.
///
/// Afterwards, entries filed under an old name or alias are moved to (or
/// dropped in favour of) the canonical name, and entries for packages the
/// inventory no longer lists (or lists as disabled) are removed.
///
/// Only a failure to enumerate the inventory is fatal. Individual fetch
/// failures are recorded in [`UpdateReport::unresolved`].
#[instrument(skip_all, fields(packages = index.len()))]
pub fn update<I, F>(
    mut index: Index,
    inventory: &I,
    fetcher: &F,
    options: &UpdateOptions,
) -> Result<(Index, UpdateReport)>
where
    I: Inventory + ?Sized,
    F: ArchiveFetcher + ?Sized,
{
    let packages = inventory.packages().or_raise(|| ErrorKind::Inventory)?;
    let mut pass = Pass { index: &mut index, fetcher, options, report: UpdateReport::default() };

    for package in packages.iter().filter(|p| !p.disabled) {
        if let Resolution::Resolved(binaries) = pass.resolve(package) {
            pass.apply(package, binaries);
        }
    }
    pass.resolve_aliases(&packages);
    pass.remove_stale(&packages, inventory.is_complete());

    let report = pass.report;
    tracing::info!(
        added = report.changes.added().len(),
        updated = report.changes.updated().len(),
        removed = report.changes.removed().len(),
        version_bump = report.changes.version_bump().len(),
        unresolved = report.unresolved.len(),
        failures = report.failures.len(),
        downloads = report.downloads,
        "Index update complete"
    );
    Ok((index, report))
}

struct Pass<'a, F: ?Sized> {
    index: &'a mut Index,
    fetcher: &'a F,
    options: &'a UpdateOptions,
    report: UpdateReport,
}

impl<F: ArchiveFetcher + ?Sized> Pass<'_, F> {
    fn resolve(&mut self, package: &Package) -> Resolution {
        let name = package.name.as_str();
        if let Some(prefix) = &package.prefix {
            return match executables::from_prefix(prefix) {
                Ok(binaries) => Resolution::Resolved(binaries),
                Err(e) => {
                    tracing::warn!(package = name, error = ?e, "Failed to list installed executables");
                    self.report.unresolved.push(package.name.clone());
                    Resolution::Untouched
                },
            };
        }

        let indexed_version = self.index.get(name).map(|entry| entry.version.clone());
        match indexed_version {
            None if self.options.install_missing => match &package.archive {
                Some(archive) => self.fetch(package, archive),
                None => Resolution::Untouched,
            },
            Some(version) if self.options.update_existing && version.as_deref() != Some(package.version.as_str()) => {
                match &package.archive {
                    Some(archive) => self.fetch(package, archive),
                    None => {
                        let reason = ErrorKind::MissingArchive(package.name.clone()).to_string();
                        tracing::error!(package = name, %reason, "Cannot re-index outdated package");
                        self.report.failures.push(PackageFailure { package: package.name.clone(), reason });
                        Resolution::Untouched
                    },
                }
            },
            _ => Resolution::Untouched,
        }
    }

    fn fetch(&mut self, package: &Package, archive: &Archive) -> Resolution {
        if self.options.max_downloads.is_some_and(|max| self.report.downloads >= max) {
            tracing::debug!(package = %package.name, "Download limit reached; deferring to a later run");
            self.report.unresolved.push(package.name.clone());
            return Resolution::Untouched;
        }
        self.report.downloads += 1;
        tracing::info!(package = %package.name, url = %archive.url, "Fetching archive");
        let listed = self.fetcher.fetch(archive).and_then(|path| executables::from_archive(path, &archive.root));
        match listed {
            Ok(binaries) => Resolution::Resolved(binaries),
            Err(e) => {
                tracing::warn!(package = %package.name, error = ?e, "Failed to index archive; will retry next run");
                self.report.unresolved.push(package.name.clone());
                Resolution::Untouched
            },
        }
    }

    fn apply(&mut self, package: &Package, binaries: BTreeSet<String>) {
        let entry = IndexEntry::new(Some(package.version.clone()), binaries);
        let change = match self.index.get(&package.name) {
            None => Some(Change::Added),
            Some(existing) if existing.binaries != entry.binaries => Some(Change::Updated),
            Some(existing) if existing.version != entry.version => Some(Change::VersionBump),
            Some(_) => None,
        };
        if let Some(change) = change {
            tracing::debug!(package = %package.name, %change, "Recording change");
            self.report.changes.record(package.name.clone(), change);
        }
        self.index.insert(package.name.clone(), entry);
    }

    /// Move entries filed under old names/aliases to their canonical name.
    ///
    /// Runs after every package has been visited so the outcome doesn't depend
    /// on where a package and its aliases fall in the inventory order.
    fn resolve_aliases(&mut self, packages: &[Package]) {
        let live: HashSet<&str> = packages.iter().filter(|p| !p.disabled).map(|p| p.name.as_str()).collect();
        for package in packages.iter().filter(|p| !p.disabled) {
            for old in &package.old_names {
                // A name that is itself a live package is not stale.
                if old == &package.name || live.contains(old.as_str()) {
                    continue;
                }
                let Some(entry) = self.index.remove(old) else {
                    continue;
                };
                if self.index.contains(&package.name) {
                    tracing::info!(old = %old, new = %package.name, "Dropping stale alias entry");
                } else {
                    tracing::info!(old = %old, new = %package.name, "Moving renamed package");
                    self.index.insert(package.name.clone(), entry);
                    self.report.changes.record(package.name.clone(), Change::Added);
                }
                self.report.changes.record(old.clone(), Change::Removed);
            }
        }
    }

    fn remove_stale(&mut self, packages: &[Package], complete: bool) {
        let stale: Vec<String> = if complete {
            let live: HashSet<&str> = packages.iter().filter(|p| !p.disabled).map(|p| p.name.as_str()).collect();
            self.index.names().filter(|name| !live.contains(name)).map(str::to_string).collect()
        } else {
            tracing::debug!("Inventory is partial; only removing disabled packages");
            packages.iter().filter(|p| p.disabled && self.index.contains(&p.name)).map(|p| p.name.clone()).collect()
        };
        for name in stale {
            tracing::debug!(package = %name, "Removing package no longer in inventory");
            self.index.remove(&name);
            self.report.changes.record(name, Change::Removed);
        }
    }
}
