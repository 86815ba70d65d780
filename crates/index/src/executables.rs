//! Enumerating the executables a package provides.
//!
//! Both sources apply the same filter: regular files and symlinks with the
//! executable bit set, sitting directly inside `bin/` or `sbin/` of the
//! package prefix. Only basenames are kept.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tar::EntryType;
use tracing::instrument;
use whence_compress::Compression;

const BINARY_DIRECTORIES: [&str; 2] = ["bin", "sbin"];
/// Owner read and execute, the equivalent of a `-r?x` listing.
const ARCHIVE_EXECUTABLE_MODE: u32 = 0o500;

/// Enumerate executables from an installed package prefix.
#[instrument(skip_all, fields(prefix = %prefix.as_ref().display()))]
pub fn from_prefix(prefix: impl AsRef<Path>) -> Result<BTreeSet<String>> {
    let prefix = prefix.as_ref();
    let mut binaries = BTreeSet::new();
    for directory in BINARY_DIRECTORIES.map(|d| prefix.join(d)) {
        let entries = match fs::read_dir(&directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => exn::bail!(ErrorKind::Io(e)),
        };
        for entry in entries {
            let entry = entry.map_err(ErrorKind::Io)?;
            if let Some(name) = executable_name(&entry.path()) {
                binaries.insert(name);
            }
        }
    }
    Ok(binaries)
}

fn executable_name(path: &Path) -> Option<String> {
    let file_type = fs::symlink_metadata(path).ok()?.file_type();
    if !(file_type.is_file() || file_type.is_symlink()) {
        return None;
    }
    // Follows symlinks: a dangling link, or one to a directory, isn't a command.
    let target = fs::metadata(path).ok()?;
    if !target.is_file() || !is_executable(&target) {
        return None;
    }
    let name = path.file_name()?.to_str();
    if name.is_none() {
        tracing::warn!(path = %path.display(), "Skipping executable with a non UTF-8 name");
    }
    name.map(str::to_string)
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}

/// Enumerate executables from a downloaded archive on disk.
///
/// The compression layer is detected from the file contents.
#[instrument(skip_all, fields(archive = %path.as_ref().display(), root = %root.as_ref().display()))]
pub fn from_archive(path: impl AsRef<Path>, root: impl AsRef<Path>) -> Result<BTreeSet<String>> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(ErrorKind::Io)?;
    let compression = Compression::sniff(&mut file).or_raise(|| ErrorKind::Archive(path.to_path_buf()))?;
    tracing::debug!(%compression, "Listing archive");
    let reader = compression.wrap_reader(file).or_raise(|| ErrorKind::Archive(path.to_path_buf()))?;
    from_tar(reader, root).or_raise(|| ErrorKind::Archive(path.to_path_buf()))
}

/// Enumerate executables from an uncompressed tar stream.
///
/// Symlink targets are ignored; only the link's own name counts.
pub fn from_tar<R: Read>(reader: R, root: impl AsRef<Path>) -> Result<BTreeSet<String>> {
    let root = normalize(root.as_ref());
    let mut archive = tar::Archive::new(reader);
    let mut binaries = BTreeSet::new();
    for entry in archive.entries().map_err(ErrorKind::Io)? {
        let entry = entry.map_err(ErrorKind::Io)?;
        let header = entry.header();
        if !matches!(header.entry_type(), EntryType::Regular | EntryType::Continuous | EntryType::Symlink) {
            continue;
        }
        if header.mode().map_err(ErrorKind::Io)? & ARCHIVE_EXECUTABLE_MODE != ARCHIVE_EXECUTABLE_MODE {
            continue;
        }
        let path = normalize(&entry.path().map_err(ErrorKind::Io)?);
        if let Some(name) = binary_under(&path, &root) {
            binaries.insert(name);
        }
    }
    Ok(binaries)
}

/// Drop `.` components so `./curl/8.5.0/bin/curl` and `curl/8.5.0/bin/curl`
/// compare equal.
fn normalize(path: &Path) -> PathBuf {
    path.components().filter(|c| !matches!(c, Component::CurDir)).collect()
}

/// `root/bin/<name>` or `root/sbin/<name>` → `<name>`.
fn binary_under(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut components = relative.components();
    let directory = components.next()?.as_os_str().to_str()?;
    let name = components.next()?.as_os_str().to_str()?;
    if components.next().is_some() || !BINARY_DIRECTORIES.contains(&directory) {
        return None;
    }
    Some(name.to_string())
}
