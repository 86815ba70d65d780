//! Keeping a local copy of a published executables index up to date.

use crate::client::HttpClient;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, IF_MODIFIED_SINCE};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::instrument;

/// Asks content APIs (e.g. GitHub's) for the raw file rather than JSON metadata.
const RAW_CONTENT: &str = "application/vnd.github.v3.raw";
const HTTP_DATE: &[BorrowedFormatItem<'_>] =
    format_description!("[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT");

/// What [`RemoteIndex::sync()`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Updates are disabled and a local copy exists.
    Skipped,
    /// The local copy is younger than the maximum age.
    Fresh,
    /// The server confirmed the local copy is current.
    NotModified,
    /// A new copy was downloaded.
    Downloaded,
    /// The refresh failed; the existing local copy is used as-is.
    Stale,
}

/// A remotely published index mirrored to a local file.
pub struct RemoteIndex<'a> {
    client: &'a HttpClient,
    url: String,
    path: PathBuf,
    max_age: Duration,
    skip_update: bool,
}
impl<'a> RemoteIndex<'a> {
    pub fn new(client: &'a HttpClient, url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            client,
            url: url.into(),
            path: path.into(),
            max_age: Duration::from_secs(24 * 60 * 60),
            skip_update: false,
        }
    }

    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn skip_update(mut self, skip_update: bool) -> Self {
        self.skip_update = skip_update;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bring the local copy up to date.
    ///
    /// Uses a conditional request based on the local copy's modification
    /// time, which is reset to now after every successful check so the
    /// maximum age counts from the last time the server was asked. Network
    /// failures are only errors when there is no local copy to fall back on.
    #[instrument(skip_all, fields(url = %self.url, path = %self.path.display()))]
    pub fn sync(&self) -> Result<SyncOutcome> {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok();
        if let Some(modified) = modified {
            if self.skip_update {
                tracing::debug!("Updates disabled; using local copy");
                return Ok(SyncOutcome::Skipped);
            }
            if modified.elapsed().is_ok_and(|age| age < self.max_age) {
                tracing::debug!("Local copy is fresh");
                return Ok(SyncOutcome::Fresh);
            }
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(RAW_CONTENT));
        if let Some(modified) = modified {
            headers.insert(IF_MODIFIED_SINCE, http_date(modified)?);
        }
        match self.client.get(&self.url, &headers, |response| self.store(response)) {
            Ok(outcome) => {
                touch(&self.path).map_err(ErrorKind::Io)?;
                tracing::info!(?outcome, "Synchronised executables index");
                Ok(outcome)
            },
            Err(e) if modified.is_some() => {
                tracing::warn!(error = ?e, "Failed to refresh executables index; using the local copy");
                Ok(SyncOutcome::Stale)
            },
            Err(e) => Err(e),
        }
    }

    fn store(&self, response: reqwest::blocking::Response) -> Result<SyncOutcome> {
        if response.status() == StatusCode::NOT_MODIFIED {
            return Ok(SyncOutcome::NotModified);
        }
        let directory = self.path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        fs::create_dir_all(directory).map_err(ErrorKind::Io)?;
        let mut file = NamedTempFile::new_in(directory).map_err(ErrorKind::Io)?;
        io::copy(&mut self.client.throttled(response), file.as_file_mut())
            .or_raise(|| ErrorKind::Request(self.url.clone()))?;
        file.persist(&self.path).map_err(|e| e.error).or_raise(|| ErrorKind::Persist(self.path.clone()))?;
        Ok(SyncOutcome::Downloaded)
    }
}

/// Format a timestamp as an HTTP date (RFC 9110 IMF-fixdate).
fn http_date(time: SystemTime) -> Result<HeaderValue> {
    let invalid = || ErrorKind::InvalidHeader("If-Modified-Since");
    let formatted = OffsetDateTime::from(time).format(HTTP_DATE).or_raise(invalid)?;
    HeaderValue::from_str(&formatted).or_raise(invalid)
}

fn touch(path: &Path) -> io::Result<()> {
    File::options().write(true).open(path)?.set_modified(SystemTime::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{TestServer, client, respond};
    use std::time::UNIX_EPOCH;

    fn age(path: &Path) -> Duration {
        fs::metadata(path).unwrap().modified().unwrap().elapsed().unwrap_or_default()
    }

    fn backdate(path: &Path) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(1_000_000_000)).unwrap();
    }

    fn header(request: &tiny_http::Request, name: &'static str) -> Option<String> {
        request.headers().iter().find(|h| h.field.equiv(name)).map(|h| h.value.as_str().to_string())
    }

    #[test]
    fn test_http_date() {
        let time = UNIX_EPOCH + Duration::from_secs(784_111_777);
        assert_eq!(http_date(time).unwrap(), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_first_download() {
        let server = TestServer::start(|_, request| {
            assert_eq!(header(&request, "Accept").as_deref(), Some(RAW_CONTENT));
            assert_eq!(header(&request, "If-Modified-Since"), None);
            respond(request, 200, b"git(2.43.0):git\n");
        });
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("data/executables.txt");
        let client = client(0);
        let outcome = RemoteIndex::new(&client, &server.url, &path).sync().unwrap();
        assert_eq!(outcome, SyncOutcome::Downloaded);
        assert_eq!(fs::read_to_string(&path).unwrap(), "git(2.43.0):git\n");
    }

    #[test]
    fn test_fresh_copy_not_requested() {
        let server = TestServer::start(|_, request| respond(request, 500, b""));
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("executables.txt");
        fs::write(&path, "jq:jq\n").unwrap();
        let client = client(0);
        let outcome = RemoteIndex::new(&client, &server.url, &path).max_age(Duration::from_secs(3600)).sync().unwrap();
        assert_eq!(outcome, SyncOutcome::Fresh);
        assert_eq!(server.hits(), 0);
    }

    #[test]
    fn test_skip_update_with_local_copy() {
        let server = TestServer::start(|_, request| respond(request, 500, b""));
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("executables.txt");
        fs::write(&path, "jq:jq\n").unwrap();
        backdate(&path);
        let client = client(0);
        let outcome = RemoteIndex::new(&client, &server.url, &path).skip_update(true).sync().unwrap();
        assert_eq!(outcome, SyncOutcome::Skipped);
        assert_eq!(server.hits(), 0);
    }

    #[test]
    fn test_not_modified_keeps_copy_and_touches() {
        let server = TestServer::start(|_, request| {
            assert_eq!(header(&request, "If-Modified-Since").as_deref(), Some("Sun, 09 Sep 2001 01:46:40 GMT"));
            request.respond(tiny_http::Response::empty(304)).unwrap();
        });
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("executables.txt");
        fs::write(&path, "jq:jq\n").unwrap();
        backdate(&path);
        let client = client(0);
        let outcome = RemoteIndex::new(&client, &server.url, &path).sync().unwrap();
        assert_eq!(outcome, SyncOutcome::NotModified);
        assert_eq!(fs::read_to_string(&path).unwrap(), "jq:jq\n");
        assert!(age(&path) < Duration::from_secs(60));
    }

    #[test]
    fn test_failure_falls_back_to_stale_copy() {
        let server = TestServer::start(|_, request| respond(request, 503, b""));
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("executables.txt");
        fs::write(&path, "jq:jq\n").unwrap();
        backdate(&path);
        let client = client(1);
        let outcome = RemoteIndex::new(&client, &server.url, &path).sync().unwrap();
        assert_eq!(outcome, SyncOutcome::Stale);
        assert_eq!(server.hits(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "jq:jq\n");
    }

    #[test]
    fn test_failure_without_local_copy() {
        let server = TestServer::start(|_, request| respond(request, 404, b""));
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("executables.txt");
        let client = client(0);
        let err = RemoteIndex::new(&client, &server.url, &path).sync().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Status { status: 404, .. }));
        assert!(!path.exists());
    }
}
