use crate::error::{ErrorKind, Result};
use crate::json::{Formula, InfoDocument};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::instrument;

/// Which formulae `brew info` should describe.
#[derive(Debug, Clone, Copy)]
pub enum Selection<'a> {
    /// Every formula in every tap (`--eval-all`).
    All,
    Installed,
    Named(&'a [&'a str]),
}

/// A handle on the `brew` executable.
#[derive(Debug, Clone)]
pub struct Brew {
    executable: PathBuf,
}
impl Brew {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self { executable: executable.into() }
    }

    /// Use `configured` if given, otherwise the first `brew` on `PATH`.
    pub fn locate(configured: Option<&Path>) -> Result<Self> {
        if let Some(executable) = configured {
            return Ok(Self::new(executable));
        }
        let executable = which::which("brew").or_raise(|| ErrorKind::NotFound)?;
        tracing::debug!(brew = %executable.display(), "Found brew");
        Ok(Self::new(executable))
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Run `brew` with `args` and return its standard output.
    #[instrument(skip_all, fields(args = %args.join(" ")))]
    pub fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.executable)
            .args(args)
            .env("HOMEBREW_NO_AUTO_UPDATE", "1")
            .env("HOMEBREW_NO_ENV_HINTS", "1")
            .output()
            .or_raise(|| ErrorKind::Spawn(self.executable.clone()))?;
        if !output.status.success() {
            exn::bail!(ErrorKind::Failed {
                command: args.join(" "),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        String::from_utf8(output.stdout).or_raise(|| ErrorKind::Output(args.join(" ")))
    }

    /// Where installed kegs live, e.g. `/opt/homebrew/Cellar`.
    pub fn cellar(&self) -> Result<PathBuf> {
        let output = self.run(&["--cellar"])?;
        let cellar = output.trim();
        if cellar.is_empty() {
            exn::bail!(ErrorKind::Output("--cellar".to_string()));
        }
        Ok(PathBuf::from(cellar))
    }

    /// Raw formula descriptions; see [`parse_formulae()`].
    pub fn info(&self, selection: Selection<'_>) -> Result<Vec<serde_json::Value>> {
        let mut args = vec!["info", "--json=v2"];
        match selection {
            Selection::All => args.push("--eval-all"),
            Selection::Installed => args.push("--installed"),
            Selection::Named(names) => args.extend_from_slice(names),
        }
        let output = self.run(&args)?;
        let document: InfoDocument = serde_json::from_str(&output).or_raise(|| ErrorKind::Output(args.join(" ")))?;
        Ok(document.formulae)
    }
}

/// Decode each description on its own, skipping (and logging) bad ones.
pub fn parse_formulae(values: Vec<serde_json::Value>) -> Vec<Formula> {
    values
        .into_iter()
        .filter_map(|value| {
            let name = value.get("full_name").and_then(|n| n.as_str()).unwrap_or("<unnamed>").to_string();
            match serde_json::from_value::<Formula>(value) {
                Ok(formula) if formula.key().is_empty() => {
                    tracing::warn!("Skipping formula without a name");
                    None
                },
                Ok(formula) => Some(formula),
                Err(e) => {
                    tracing::warn!(formula = %name, error = %e, "Skipping unreadable formula");
                    None
                },
            }
        })
        .collect()
}
