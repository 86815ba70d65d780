//! Downloading prebuilt package archives ("bottles") into a local cache.

use crate::client::HttpClient;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::instrument;
use whence_index::error::{ErrorKind as IndexErrorKind, Result as IndexResult};
use whence_index::{Archive, ArchiveFetcher};

/// Fetches archives over HTTP, keeping verified copies in `cache_dir`.
///
/// Archives with a known SHA-256 are cached by content hash and reused when
/// the cached file still matches. Archives without one are downloaded every
/// time, since a stale copy couldn't be told apart.
pub struct BottleFetcher {
    client: HttpClient,
    cache_dir: PathBuf,
    headers: HeaderMap,
}
impl BottleFetcher {
    pub fn new(client: HttpClient, cache_dir: impl Into<PathBuf>, authorization: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(authorization) = authorization {
            let mut value =
                HeaderValue::from_str(authorization).or_raise(|| ErrorKind::InvalidHeader("Authorization"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(Self { client, cache_dir: cache_dir.into(), headers })
    }

    /// Where `archive` is (or would be) stored locally.
    pub fn cache_path(&self, archive: &Archive) -> PathBuf {
        let name = match &archive.sha256 {
            Some(sha256) => format!("{}.bottle", sha256.to_ascii_lowercase()),
            None => format!("url-{:x}.bottle", Sha256::digest(archive.url.as_bytes())),
        };
        self.cache_dir.join(name)
    }

    #[instrument(skip_all, fields(url = %archive.url))]
    fn download(&self, archive: &Archive) -> Result<PathBuf> {
        let path = self.cache_path(archive);
        if let Some(expected) = &archive.sha256 {
            match sha256_file(&path) {
                Ok(actual) if expected.eq_ignore_ascii_case(&actual) => {
                    tracing::debug!(path = %path.display(), "Using cached archive");
                    return Ok(path);
                },
                Ok(_) => tracing::warn!(path = %path.display(), "Cached archive is corrupt; downloading again"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {},
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Cannot read cached archive"),
            }
        }
        self.client.download(&archive.url, &self.headers, &path, archive.sha256.as_deref())?;
        Ok(path)
    }
}

impl ArchiveFetcher for BottleFetcher {
    fn fetch(&self, archive: &Archive) -> IndexResult<PathBuf> {
        self.download(archive).or_raise(|| IndexErrorKind::Fetch(archive.url.clone()))
    }
}

fn sha256_file(path: &Path) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut File::open(path)?, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
