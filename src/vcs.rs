use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::Path;
use std::process::Command;
use tracing::instrument;

/// Commit `path` (and only `path`) in the repository that contains it.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn commit(path: &Path, message: &str) -> Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // Pathspecs are resolved relative to `-C`, so only the file name is passed.
    let Some(file_name) = path.file_name() else {
        exn::bail!(ErrorKind::Commit(path.to_path_buf()));
    };
    let output = Command::new("git")
        .arg("-C")
        .arg(directory)
        .args(["commit", "-m", message, "--"])
        .arg(file_name)
        .output()
        .map_err(ErrorKind::Io)
        .or_raise(|| ErrorKind::Commit(path.to_path_buf()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::error!(status = %output.status, stderr = %stderr.trim(), "git commit failed");
        exn::bail!(ErrorKind::Commit(path.to_path_buf()));
    }
    tracing::info!(subject = message, "Committed index");
    Ok(())
}
