use crate::index::Index;
use std::collections::HashSet;
use std::fmt;

/// Coverage report of an index against a reference package set.
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub packages: usize,
    pub binaries: usize,
    /// Percentage of the reference set present in the index, to one decimal.
    pub coverage: f64,
    /// Reference packages absent from the index, in reference order.
    pub missing: Vec<String>,
    /// Indexed packages not among the known package names.
    pub unknown: Vec<String>,
}
impl Stats {
    /// Measure `index` against `reference` (the packages it should cover) and
    /// `known` (every package name the package manager recognises).
    pub fn compute<S: AsRef<str>>(index: &Index, reference: &[S], known: &[S]) -> Self {
        let missing: Vec<String> =
            reference.iter().map(AsRef::as_ref).filter(|name| !index.contains(name)).map(str::to_string).collect();
        let covered = reference.len() - missing.len();
        let coverage = if reference.is_empty() {
            100.0
        } else {
            ((covered * 1000) as f64 / reference.len() as f64).round() / 10.0
        };
        let known: HashSet<&str> = known.iter().map(AsRef::as_ref).collect();
        let unknown = index.names().filter(|name| !known.contains(name)).map(str::to_string).collect();
        Self { packages: index.len(), binaries: index.binary_count(), coverage, missing, unknown }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} packages", self.packages)?;
        writeln!(f, "{} commands", self.binaries)?;
        writeln!(f, "{:.1}%  (missing: {})", self.coverage, self.missing.join(" "))?;
        if !self.unknown.is_empty() {
            writeln!(f, "\nUnknown packages: {}.", self.unknown.join(", "))?;
        }
        Ok(())
    }
}
