//! Tracking what an update pass changed.

use derive_more::Display;
use std::collections::BTreeSet;
use std::fmt::Write;

/// How many package names a commit message spells out before summarising.
const COMMIT_MESSAGE_NAMES: usize = 3;

/// The kind of change recorded against a package name.
///
/// Variants are declared in commit-message precedence order: the first
/// non-empty bucket in this order names the commit.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Change {
    #[display("added")]
    Added,
    #[display("updated")]
    Updated,
    #[display("removed")]
    Removed,
    #[display("version bump")]
    VersionBump,
}
impl Change {
    pub const ALL: [Change; 4] = [Change::Added, Change::Updated, Change::Removed, Change::VersionBump];

    fn verb(&self) -> &'static str {
        match self {
            Change::Added => "Add",
            Change::Updated => "Update",
            Change::Removed => "Remove",
            Change::VersionBump => "Bump",
        }
    }

    fn heading(&self) -> &'static str {
        match self {
            Change::Added => "Added",
            Change::Updated => "Updated",
            Change::Removed => "Removed",
            Change::VersionBump => "Version bumped",
        }
    }
}

/// The categorised diff produced by one update pass.
///
/// A package name lives in at most one bucket; recording a second change for
/// the same name moves it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    added: BTreeSet<String>,
    updated: BTreeSet<String>,
    removed: BTreeSet<String>,
    version_bump: BTreeSet<String>,
}
impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_mut(&mut self, change: Change) -> &mut BTreeSet<String> {
        match change {
            Change::Added => &mut self.added,
            Change::Updated => &mut self.updated,
            Change::Removed => &mut self.removed,
            Change::VersionBump => &mut self.version_bump,
        }
    }

    /// Names recorded under `change`, sorted.
    pub fn get(&self, change: Change) -> &BTreeSet<String> {
        match change {
            Change::Added => &self.added,
            Change::Updated => &self.updated,
            Change::Removed => &self.removed,
            Change::VersionBump => &self.version_bump,
        }
    }

    pub fn added(&self) -> &BTreeSet<String> {
        &self.added
    }

    pub fn updated(&self) -> &BTreeSet<String> {
        &self.updated
    }

    pub fn removed(&self) -> &BTreeSet<String> {
        &self.removed
    }

    pub fn version_bump(&self) -> &BTreeSet<String> {
        &self.version_bump
    }

    pub fn record(&mut self, name: impl Into<String>, change: Change) {
        let name = name.into();
        for other in Change::ALL.into_iter().filter(|c| *c != change) {
            self.bucket_mut(other).remove(&name);
        }
        self.bucket_mut(change).insert(name);
    }

    /// Which bucket, if any, a package name was recorded in.
    pub fn change_of(&self, name: &str) -> Option<Change> {
        Change::ALL.into_iter().find(|change| self.get(*change).contains(name))
    }

    pub fn is_empty(&self) -> bool {
        Change::ALL.iter().all(|change| self.get(*change).is_empty())
    }

    /// Total number of package names across all buckets.
    pub fn len(&self) -> usize {
        Change::ALL.iter().map(|change| self.get(*change).len()).sum()
    }

    /// One-line commit message naming the dominant change.
    ///
    /// Only the first non-empty bucket (added, updated, removed, version bump)
    /// is described, e.g. `Add bat, fd, ripgrep and 2 more`. Returns `None`
    /// when nothing changed.
    pub fn commit_message(&self) -> Option<String> {
        let change = Change::ALL.into_iter().find(|change| !self.get(*change).is_empty())?;
        let names = self.get(change);
        let mut message = format!(
            "{} {}",
            change.verb(),
            names.iter().take(COMMIT_MESSAGE_NAMES).map(String::as_str).collect::<Vec<_>>().join(", ")
        );
        if names.len() > COMMIT_MESSAGE_NAMES {
            // Infallible: writing to a String.
            _ = write!(message, " and {} more", names.len() - COMMIT_MESSAGE_NAMES);
        }
        Some(message)
    }

    /// Markdown breakdown of every bucket, for CI job summaries.
    pub fn summary_markdown(&self) -> String {
        let mut summary = String::from("## Executables index changes\n");
        for change in Change::ALL {
            let names = self.get(change);
            // Infallible: writing to a String.
            _ = write!(summary, "\n### {} ({})\n\n", change.heading(), names.len());
            if names.is_empty() {
                summary.push_str("_None_\n");
            }
            for name in names {
                _ = writeln!(summary, "- `{name}`");
            }
        }
        summary
    }
}
