use crate::error::Result;
use std::path::{Path, PathBuf};

/// A prebuilt, downloadable package payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub url: String,
    /// Directory inside the archive that mirrors the install prefix, e.g.
    /// `curl/8.5.0`. Only executables under its `bin`/`sbin` count.
    pub root: PathBuf,
    /// Expected SHA-256 of the payload (lowercase hex), when known.
    pub sha256: Option<String>,
}

/// One package as reported by the package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Canonical (fully qualified) name; the index key.
    pub name: String,
    /// Live version; compared against the version stored in the index.
    pub version: String,
    /// Install location, present only when the live version is installed.
    pub prefix: Option<PathBuf>,
    pub archive: Option<Archive>,
    /// Previous names and aliases the package may have been indexed under.
    pub old_names: Vec<String>,
    /// Disabled or deprecated packages are dropped from the index.
    pub disabled: bool,
}
impl Package {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            prefix: None,
            archive: None,
            old_names: Vec::new(),
            disabled: false,
        }
    }

    pub fn installed_at(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_archive(mut self, archive: Archive) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn with_old_names(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.old_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn is_installed(&self) -> bool {
        self.prefix.is_some()
    }
}

/// Source of package descriptors for an update pass.
pub trait Inventory {
    /// Enumerate every package, in a stable order.
    ///
    /// An error here aborts the whole update. Providers should skip (and log)
    /// individual descriptors they can't understand instead of failing.
    fn packages(&self) -> Result<Vec<Package>>;

    /// Whether [`packages()`](Self::packages) lists every package that
    /// exists, rather than a subset (e.g. only installed ones). Indexed
    /// packages missing from an incomplete inventory are not removed.
    fn is_complete(&self) -> bool {
        true
    }
}

/// Downloads prebuilt archives.
pub trait ArchiveFetcher {
    /// Fetch `archive` and return the path of the local copy.
    fn fetch(&self, archive: &Archive) -> Result<PathBuf>;
}

impl<T: Inventory + ?Sized> Inventory for &T {
    fn packages(&self) -> Result<Vec<Package>> {
        (**self).packages()
    }

    fn is_complete(&self) -> bool {
        (**self).is_complete()
    }
}

impl<T: ArchiveFetcher + ?Sized> ArchiveFetcher for &T {
    fn fetch(&self, archive: &Archive) -> Result<PathBuf> {
        (**self).fetch(archive)
    }
}

impl Archive {
    pub fn new(url: impl Into<String>, root: impl AsRef<Path>) -> Self {
        Self { url: url.into(), root: root.as_ref().to_path_buf(), sha256: None }
    }

    pub fn with_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.sha256 = Some(sha256.into());
        self
    }
}
