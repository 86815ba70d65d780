use std::collections::{BTreeMap, BTreeSet};

/// The executables provided by a single package.
///
/// Entries are never edited in place: when a package is revisited during an
/// update, its entry is replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexEntry {
    /// Version the binaries were derived from. Legacy lines carry no version.
    pub version: Option<String>,
    /// Executable basenames, case-sensitive. Always sorted and de-duplicated.
    pub binaries: BTreeSet<String>,
}
impl IndexEntry {
    pub fn new(version: Option<String>, binaries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            // An empty version is the same as no version at all; this keeps
            // `name():` from ever being written.
            version: version.filter(|v| !v.is_empty()),
            binaries: binaries.into_iter().map(Into::into).collect(),
        }
    }

    pub fn provides(&self, binary: &str) -> bool {
        self.binaries.contains(binary)
    }
}

/// Mapping of package name to [`IndexEntry`].
///
/// Backed by a [`BTreeMap`] so iteration (and therefore serialization) is
/// always in ascending name order, whatever order packages were inserted in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Index {
    entries: BTreeMap<String, IndexEntry>,
}
impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Insert an entry, returning the one it replaced.
    pub fn insert(&mut self, name: impl Into<String>, entry: IndexEntry) -> Option<IndexEntry> {
        self.entries.insert(name.into(), entry)
    }

    pub fn remove(&mut self, name: &str) -> Option<IndexEntry> {
        self.entries.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Total number of executables across all packages.
    pub fn binary_count(&self) -> usize {
        self.entries.values().map(|entry| entry.binaries.len()).sum()
    }

    /// Merge an entry parsed from a duplicate line into an existing one.
    pub(crate) fn merge(&mut self, name: String, entry: IndexEntry) {
        match self.entries.get_mut(&name) {
            Some(existing) => {
                existing.binaries.extend(entry.binaries);
                if entry.version.is_some() {
                    existing.version = entry.version;
                }
            },
            None => {
                self.entries.insert(name, entry);
            },
        }
    }
}
impl<N: Into<String>> FromIterator<(N, IndexEntry)> for Index {
    fn from_iter<T: IntoIterator<Item = (N, IndexEntry)>>(iter: T) -> Self {
        Self { entries: iter.into_iter().map(|(name, entry)| (name.into(), entry)).collect() }
    }
}
