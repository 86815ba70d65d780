use crate::cli::WhichArgs;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::io::{self, Write};
use std::path::Path;
use whence_brew::{Brew, BrewStatus};
use whence_config::Config;
use whence_fetch::RemoteIndex;
use whence_lookup::{explain, search_file};

pub fn run(config: &Config, args: &WhichArgs) -> Result<()> {
    let path = config.index_path().or_raise(|| ErrorKind::Config)?;
    if let Some(url) = &config.index.remote_url {
        refresh(config, url, &path);
    }
    let locate = || super::brew(config);
    let mut brew = args.explain.then(|| LazyBrew::new(&locate));
    let mut stdout = io::stdout().lock();
    for command in &args.commands {
        let text = answer(&path, command, brew.as_mut(), &config.install_command)?;
        stdout.write_all(text.as_bytes()).map_err(ErrorKind::Io)?;
    }
    Ok(())
}

/// Bring the local index up to date, carrying on with whatever copy exists
/// if that fails.
fn refresh(config: &Config, url: &str, path: &Path) {
    let result = super::http_client(config).and_then(|client| {
        RemoteIndex::new(&client, url, path)
            .max_age(config.index.max_age())
            .skip_update(config.index.skip_update)
            .sync()
            .or_raise(|| ErrorKind::Fetch)
    });
    if let Err(e) = result {
        tracing::warn!(error = ?e, "Cannot download the executables index");
    }
}

/// `brew`, looked for the first time a command has providers to explain.
struct LazyBrew<'a> {
    locate: &'a dyn Fn() -> Result<Brew>,
    brew: Option<Brew>,
}
impl<'a> LazyBrew<'a> {
    fn new(locate: &'a dyn Fn() -> Result<Brew>) -> Self {
        Self { locate, brew: None }
    }

    fn get(&mut self) -> Result<&Brew> {
        let brew = match self.brew.take() {
            Some(brew) => brew,
            None => (self.locate)()?,
        };
        Ok(self.brew.insert(brew))
    }
}

/// What to print for `command`: one provider per line, or install advice
/// when `brew` is given.
fn answer(path: &Path, command: &str, brew: Option<&mut LazyBrew<'_>>, install_command: &str) -> Result<String> {
    let packages = search_file(path, command).or_raise(|| ErrorKind::Lookup(command.to_string()))?;
    let Some(brew) = brew else {
        return Ok(packages.iter().map(|package| format!("{package}\n")).collect());
    };
    if packages.is_empty() {
        return Ok(String::new());
    }
    let names: Vec<&str> = packages.iter().map(String::as_str).collect();
    let status = BrewStatus::query(brew.get()?, &names);
    Ok(explain(&command.to_lowercase(), &packages, &status, install_command))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const INDEX: &str = "netcat(0.7.1):nc netcat\nopenbsd-netcat:nc\ngit(2.43.0):git\n";

    #[test]
    fn test_answer_lists_providers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("executables.txt");
        fs::write(&path, INDEX).unwrap();
        assert_eq!(answer(&path, "nc", None, "brew install").unwrap(), "netcat\nopenbsd-netcat\n");
        assert_eq!(answer(&path, "GIT", None, "brew install").unwrap(), "git\n");
    }

    #[test]
    fn test_no_match_prints_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("executables.txt");
        fs::write(&path, INDEX).unwrap();
        assert_eq!(answer(&path, "wget", None, "brew install").unwrap(), "");
        // Nothing to ask brew about, so it is never run.
        let locate = || -> Result<Brew> { Ok(Brew::new("/nonexistent/brew")) };
        let mut brew = LazyBrew::new(&locate);
        assert_eq!(answer(&path, "wget", Some(&mut brew), "brew install").unwrap(), "");
    }

    #[test]
    fn test_brew_is_only_needed_for_a_match() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("executables.txt");
        fs::write(&path, INDEX).unwrap();
        let locate = || -> Result<Brew> { exn::bail!(ErrorKind::Brew) };
        let mut brew = LazyBrew::new(&locate);
        assert_eq!(answer(&path, "wget", Some(&mut brew), "brew install").unwrap(), "");
        let err = answer(&path, "nc", Some(&mut brew), "brew install").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Brew));
    }

    #[test]
    fn test_missing_index_prints_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert_eq!(answer(&temp_dir.path().join("absent.txt"), "git", None, "brew install").unwrap(), "");
    }

    #[test]
    fn test_unknown_packages_are_not_explained() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("executables.txt");
        fs::write(&path, INDEX).unwrap();
        let locate = || -> Result<Brew> { Ok(Brew::new("/nonexistent/brew")) };
        let mut brew = LazyBrew::new(&locate);
        assert_eq!(answer(&path, "nc", Some(&mut brew), "brew install").unwrap(), "");
    }
}
