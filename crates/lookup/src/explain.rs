use std::fmt::Write;

/// What the package manager knows about a package right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    /// The latest version is already installed.
    pub installed: bool,
    /// Every hard requirement (OS, toolchain, ...) is met on this machine.
    pub requirements_satisfied: bool,
}

/// Looks up the live [`Status`] of packages.
pub trait PackageStatus {
    /// `None` when the package manager doesn't know `package`.
    fn status(&self, package: &str) -> Option<Status>;
}

impl<T: PackageStatus + ?Sized> PackageStatus for &T {
    fn status(&self, package: &str) -> Option<Status> {
        (**self).status(package)
    }
}

/// Candidates worth suggesting: known, not yet installed, and installable
/// here. Order is preserved.
pub fn installable<'a, S, P>(candidates: &'a [S], status: &P) -> Vec<&'a str>
where
    S: AsRef<str>,
    P: PackageStatus + ?Sized,
{
    candidates
        .iter()
        .map(AsRef::as_ref)
        .filter(|package| match status.status(package) {
            Some(found) => !found.installed && found.requirements_satisfied,
            None => {
                tracing::debug!(package, "Unknown package; not suggesting it");
                false
            },
        })
        .collect()
}

/// Install advice for `command`, given the packages known to provide it.
///
/// Returns an empty string when none of the candidates is worth installing.
pub fn explain<S, P>(command: &str, candidates: &[S], status: &P, install_command: &str) -> String
where
    S: AsRef<str>,
    P: PackageStatus + ?Sized,
{
    let packages = installable(candidates, status);
    let mut text = String::new();
    // Infallible: writing to a String.
    match packages.as_slice() {
        [] => {},
        [package] => {
            _ = writeln!(text, "The program '{command}' is currently not installed. You can install it by typing:");
            _ = writeln!(text, "  {install_command} {package}");
        },
        packages => {
            _ = writeln!(text, "The program '{command}' can be found in the following packages:");
            for package in packages {
                _ = writeln!(text, "  * {package}");
            }
            _ = writeln!(text, "Try: {install_command} <selected package>");
        },
    }
    text
}
