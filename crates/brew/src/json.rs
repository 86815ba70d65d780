//! The subset of `brew info --json=v2` output that whence reads.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Top-level `brew info --json=v2` document.
#[derive(Debug, Default, Deserialize)]
pub struct InfoDocument {
    /// Kept as raw values so one malformed formula doesn't reject the rest.
    #[serde(default)]
    pub formulae: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Formula {
    pub name: String,
    pub full_name: String,
    pub tap: Option<String>,
    pub oldnames: Vec<String>,
    /// Older Homebrew releases report a single previous name.
    pub oldname: Option<String>,
    pub aliases: Vec<String>,
    pub versions: Versions,
    pub revision: u32,
    pub installed: Vec<InstalledVersion>,
    pub deprecated: bool,
    pub disabled: bool,
    pub requirements: Vec<Requirement>,
    pub bottle: Bottles,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Versions {
    pub stable: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InstalledVersion {
    pub version: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Requirement {
    pub name: String,
    /// Phases the requirement applies to; `build` and `test` don't matter at runtime.
    pub contexts: Vec<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Bottles {
    pub stable: Option<BottleSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BottleSpec {
    /// Keyed by bottle tag, e.g. `arm64_sonoma` or `x86_64_linux`.
    pub files: BTreeMap<String, BottleFile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BottleFile {
    pub url: String,
    pub sha256: Option<String>,
    pub cellar: Option<String>,
}

const RUNTIME_IRRELEVANT_CONTEXTS: [&str; 4] = ["build", "test", "optional", "recommended"];

impl Formula {
    /// Stable version including the revision suffix, as used for Cellar paths.
    pub fn pkg_version(&self) -> Option<String> {
        let stable = self.versions.stable.as_deref()?;
        Some(match self.revision {
            0 => stable.to_string(),
            revision => format!("{stable}_{revision}"),
        })
    }

    pub fn key(&self) -> &str {
        if self.full_name.is_empty() { &self.name } else { &self.full_name }
    }

    /// Whether the latest version is installed.
    pub fn latest_installed(&self) -> bool {
        self.pkg_version().is_some_and(|version| self.installed.iter().any(|i| i.version == version))
    }

    /// Every name this formula may previously have been indexed under.
    pub fn previous_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.oldnames.iter().chain(&self.oldname).chain(&self.aliases).cloned().collect();
        names.retain(|n| n != self.key());
        names.sort_unstable();
        names.dedup();
        names
    }

    /// The bottle for `tag`, falling back to the architecture-independent one.
    pub fn bottle(&self, tag: &str) -> Option<&BottleFile> {
        let files = &self.bottle.stable.as_ref()?.files;
        files.get(tag).or_else(|| files.get("all"))
    }

    pub fn required_requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.iter().filter(|r| r.is_required())
    }
}

impl Requirement {
    pub fn is_required(&self) -> bool {
        !self.contexts.iter().any(|c| RUNTIME_IRRELEVANT_CONTEXTS.contains(&c.as_str()))
    }
}
