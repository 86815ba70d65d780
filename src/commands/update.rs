use crate::cli::UpdateArgs;
use crate::error::{ErrorKind, Result};
use crate::vcs;
use exn::ResultExt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::instrument;
use whence_brew::{BrewInventory, default_bottle_tag};
use whence_config::Config;
use whence_fetch::BottleFetcher;
use whence_index::{ChangeSet, Index, Stats, UpdateOptions, UpdateReport, update};

pub fn run(config: &Config, args: &UpdateArgs) -> Result<()> {
    let path = match &args.path {
        Some(path) => path.clone(),
        None => {
            let path = config.index_path().or_raise(|| ErrorKind::Config)?;
            tracing::info!("Using executables list from '{}'", path.display());
            path
        },
    };
    if args.stats { stats(config, &path) } else { refresh(config, args, &path) }
}

fn inventory(config: &Config, eval_all: bool) -> Result<BrewInventory> {
    let bottle_tag = config.brew.bottle_tag.clone().unwrap_or_else(default_bottle_tag);
    BrewInventory::new(super::brew(config)?, bottle_tag, config.brew.core_taps.clone(), eval_all)
        .or_raise(|| ErrorKind::Brew)
}

#[instrument(skip_all, fields(path = %path.display()))]
fn stats(config: &Config, path: &Path) -> Result<()> {
    if !path.exists() {
        tracing::warn!("The index file doesn't exist");
    }
    let index = Index::load(path).or_raise(|| ErrorKind::Index(path.to_path_buf()))?;
    let catalog = inventory(config, true)?.catalog().or_raise(|| ErrorKind::Brew)?;
    let stats = Stats::compute(&index, &catalog.core, &catalog.known);
    io::stdout().lock().write_all(stats.to_string().as_bytes()).map_err(ErrorKind::Io)?;
    Ok(())
}

#[instrument(skip_all, fields(path = %path.display()))]
fn refresh(config: &Config, args: &UpdateArgs, path: &Path) -> Result<()> {
    let index = Index::load(path).or_raise(|| ErrorKind::Index(path.to_path_buf()))?;
    let inventory = inventory(config, args.eval_all)?;
    let cache_dir = config.cache_dir().or_raise(|| ErrorKind::Config)?;
    let fetcher = BottleFetcher::new(super::http_client(config)?, cache_dir, config.fetch.authorization.as_deref())
        .or_raise(|| ErrorKind::Fetch)?;
    let options = UpdateOptions {
        install_missing: args.install_missing,
        update_existing: args.update_existing,
        max_downloads: args.max_downloads,
    };

    let index_error = || ErrorKind::Index(path.to_path_buf());
    let (index, report) = update(index, &inventory, &fetcher, &options).or_raise(index_error)?;
    index.save(path).or_raise(index_error)?;
    finish(&report, path, args.summary_file.as_deref(), args.commit)
}

/// Everything that happens after the index is saved.
fn finish(report: &UpdateReport, path: &Path, summary_file: Option<&Path>, commit: bool) -> Result<()> {
    if !report.failures.is_empty() {
        tracing::warn!(failures = report.failures.len(), "Some packages could not be indexed");
    }
    if let Some(summary_file) = summary_file {
        append_summary(summary_file, &report.changes)?;
    }
    match report.changes.commit_message() {
        Some(message) if commit => vcs::commit(path, &message),
        Some(_) => Ok(()),
        None => {
            tracing::info!("Index unchanged");
            Ok(())
        },
    }
}

fn append_summary(summary_file: &Path, changes: &ChangeSet) -> Result<()> {
    let mut file = File::options()
        .create(true)
        .append(true)
        .open(summary_file)
        .map_err(ErrorKind::Io)
        .or_raise(|| ErrorKind::Index(PathBuf::from(summary_file)))?;
    file.write_all(changes.summary_markdown().as_bytes()).map_err(ErrorKind::Io)?;
    Ok(())
}
