//! Loading and atomically persisting the index file.

use crate::error::{ErrorKind, Result};
use crate::format;
use crate::index::Index;
use exn::ResultExt;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::instrument;

/// Permissions for a freshly written index; temporary files default to 0600
/// which would hide the index from other users sharing the prefix.
#[cfg(unix)]
const INDEX_MODE: u32 = 0o644;

impl Index {
    /// Parse an index from text. Malformed lines are skipped.
    pub fn parse(text: &str) -> Self {
        format::parse(text)
    }

    /// Render the index to text, one line per package in ascending order.
    pub fn render(&self) -> String {
        format::render(self)
    }

    /// Load the index from `path`.
    ///
    /// A missing file is an empty index, not an error. Invalid UTF-8 is
    /// replaced rather than rejected; the affected lines will most likely be
    /// skipped as malformed.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Index file does not exist; starting from an empty index");
                return Ok(Self::new());
            },
            Err(e) => exn::bail!(ErrorKind::Io(e)),
        };
        let index = Self::parse(&String::from_utf8_lossy(&bytes));
        tracing::debug!(packages = index.len(), "Loaded index");
        Ok(index)
    }

    /// Persist the index to `path`.
    ///
    /// The document is written to a temporary file in the same directory and
    /// renamed over `path`, so readers only ever see the old or the new file.
    #[instrument(skip_all, fields(path = %path.as_ref().display(), packages = self.len()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(ErrorKind::Io)?;
        let mut temporary = NamedTempFile::new_in(parent).map_err(ErrorKind::Io)?;
        temporary.write_all(self.render().as_bytes()).map_err(ErrorKind::Io)?;
        temporary.as_file().sync_all().map_err(ErrorKind::Io)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temporary.path(), fs::Permissions::from_mode(INDEX_MODE)).map_err(ErrorKind::Io)?;
        }
        temporary.persist(path).map_err(|e| e.error).or_raise(|| ErrorKind::Persist(path.to_path_buf()))?;
        Ok(())
    }
}
