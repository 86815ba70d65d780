//! Homebrew formulae as an index [`Inventory`].

use crate::brew::{Brew, Selection, parse_formulae};
use crate::error::Result;
use crate::json::Formula;
use exn::ResultExt;
use std::path::PathBuf;
use std::process::Command;
use tracing::instrument;
use whence_index::error::{ErrorKind as IndexErrorKind, Result as IndexResult};
use whence_index::{Archive, Inventory, Package};

/// Formulae known to a Homebrew installation.
pub struct BrewInventory {
    brew: Brew,
    cellar: PathBuf,
    bottle_tag: String,
    core_taps: Vec<String>,
    eval_all: bool,
}
impl BrewInventory {
    /// Asks `brew` for its Cellar up front.
    ///
    /// With `eval_all` every formula in every tap is listed, otherwise only
    /// installed ones, which makes the inventory incomplete.
    pub fn new(brew: Brew, bottle_tag: impl Into<String>, core_taps: Vec<String>, eval_all: bool) -> Result<Self> {
        let cellar = brew.cellar()?;
        Ok(Self { brew, cellar, bottle_tag: bottle_tag.into(), core_taps, eval_all })
    }

    /// Whether `formula` comes from one of the configured core taps.
    fn is_core(&self, formula: &Formula) -> bool {
        formula.tap.as_ref().is_some_and(|tap| self.core_taps.iter().any(|core| core.eq_ignore_ascii_case(tap)))
    }

    fn package(&self, formula: &Formula) -> Option<Package> {
        let Some(version) = formula.pkg_version() else {
            tracing::debug!(formula = formula.key(), "Skipping formula without a stable version");
            return None;
        };
        let mut package = Package::new(formula.key(), &version).with_old_names(formula.previous_names());
        if formula.latest_installed() {
            package = package.installed_at(self.cellar.join(&formula.name).join(&version));
        }
        if let Some(bottle) = formula.bottle(&self.bottle_tag) {
            let mut archive = Archive::new(&bottle.url, PathBuf::from(&formula.name).join(&version));
            if let Some(sha256) = &bottle.sha256 {
                archive = archive.with_sha256(sha256);
            }
            package = package.with_archive(archive);
        }
        if formula.deprecated || formula.disabled {
            package = package.disabled();
        }
        Some(package)
    }

    fn formulae(&self, selection: Selection<'_>) -> Result<Vec<Formula>> {
        let formulae = parse_formulae(self.brew.info(selection)?);
        let (core, other): (Vec<_>, Vec<_>) = formulae.into_iter().partition(|f| self.is_core(f));
        if !other.is_empty() {
            tracing::debug!(skipped = other.len(), "Ignoring formulae outside the core taps");
        }
        Ok(core)
    }

    /// Reference names for coverage statistics.
    ///
    /// Always evaluates every formula, regardless of `eval_all`.
    #[instrument(skip_all)]
    pub fn catalog(&self) -> Result<Catalog> {
        let all = parse_formulae(self.brew.info(Selection::All)?);
        let known = all.iter().flat_map(|f| [f.name.clone(), f.key().to_string()]).collect();
        let core = all.iter().filter(|f| self.is_core(f) && !f.deprecated && !f.disabled).map(|f| f.key().to_string());
        Ok(Catalog { core: core.collect(), known })
    }
}

impl Inventory for BrewInventory {
    #[instrument(skip_all, fields(eval_all = self.eval_all))]
    fn packages(&self) -> IndexResult<Vec<Package>> {
        let selection = if self.eval_all { Selection::All } else { Selection::Installed };
        let formulae = self.formulae(selection).or_raise(|| IndexErrorKind::Inventory)?;
        let packages: Vec<Package> = formulae.iter().filter_map(|f| self.package(f)).collect();
        tracing::debug!(packages = packages.len(), "Listed formulae");
        Ok(packages)
    }

    fn is_complete(&self) -> bool {
        self.eval_all
    }
}

/// Formula names used as the reference set for coverage statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Live formulae from the core taps; the index should cover all of them.
    pub core: Vec<String>,
    /// Every name and full name Homebrew knows.
    pub known: Vec<String>,
}

/// The bottle tag matching this machine, e.g. `arm64_sonoma` or `x86_64_linux`.
pub fn default_bottle_tag() -> String {
    let arch = match std::env::consts::ARCH {
        "aarch64" => "arm64",
        arch => arch,
    };
    if cfg!(target_os = "macos") {
        let codename = Command::new("sw_vers")
            .arg("-productVersion")
            .output()
            .ok()
            .filter(|output| output.status.success())
            .and_then(|output| macos_codename(&String::from_utf8_lossy(&output.stdout)));
        match (codename, arch) {
            (Some(codename), "arm64") => return format!("arm64_{codename}"),
            (Some(codename), _) => return codename.to_string(),
            (None, _) => tracing::warn!("Cannot determine the macOS release; using the Linux bottle tag"),
        }
    }
    format!("{arch}_linux")
}

fn macos_codename(product_version: &str) -> Option<&'static str> {
    let mut parts = product_version.trim().split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = parts.next().and_then(|m| m.parse().ok()).unwrap_or(0);
    Some(match (major, minor) {
        (26, _) => "tahoe",
        (15, _) => "sequoia",
        (14, _) => "sonoma",
        (13, _) => "ventura",
        (12, _) => "monterey",
        (11, _) => "big_sur",
        (10, 15) => "catalina",
        (10, 14) => "mojave",
        _ => return None,
    })
}
