use crate::error::{ErrorKind, Result};
use crate::low_speed::LowSpeedReader;
use exn::ResultExt;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::HeaderMap;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::instrument;

const BUFFER_SIZE: usize = 64 * 1024;

/// Limits applied to every request made through an [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Upper bound for one attempt, from connecting to the last body byte.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Extra attempts after a retryable failure.
    pub retries: u32,
    /// Delay before the first retry; doubles for each one after.
    pub retry_delay: Duration,
    /// Minimum bytes per second, averaged over `low_speed_time`. Zero disables.
    pub low_speed_limit: u64,
    pub low_speed_time: Duration,
    pub user_agent: String,
}
impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            connect_timeout: Duration::from_secs(15),
            retries: 3,
            retry_delay: Duration::from_secs(1),
            low_speed_limit: 100,
            low_speed_time: Duration::from_secs(30),
            user_agent: format!("whence/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// A blocking HTTP client with bounded retries.
pub struct HttpClient {
    client: Client,
    options: ClientOptions,
}
impl HttpClient {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .user_agent(options.user_agent.clone())
            .build()
            .or_raise(|| ErrorKind::Client)?;
        Ok(Self { client, options })
    }

    /// GET `url` and pass the response to `handle`, retrying both on
    /// retryable failures.
    ///
    /// Successful and `304 Not Modified` responses reach `handle`; any other
    /// status is an [`ErrorKind::Status`].
    pub fn get<T>(&self, url: &str, headers: &HeaderMap, mut handle: impl FnMut(Response) -> Result<T>) -> Result<T> {
        let mut attempt = 0;
        loop {
            let result = self
                .client
                .get(url)
                .headers(headers.clone())
                .send()
                .map_err(|e| request_error(url, e))
                .and_then(|response| check_status(url, response))
                .and_then(&mut handle);
            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.options.retries => {
                    let delay = self.options.retry_delay.saturating_mul(1 << attempt.min(16));
                    attempt += 1;
                    tracing::warn!(url, attempt, error = %e, ?delay, "Request failed; retrying");
                    sleep(delay);
                },
                Err(e) => return Err(e),
            }
        }
    }

    /// Wrap a response body in the configured low-speed floor.
    pub fn throttled<R: Read>(&self, reader: R) -> LowSpeedReader<R> {
        LowSpeedReader::new(reader, self.options.low_speed_limit, self.options.low_speed_time)
    }

    /// Download `url` to `destination`, returning the payload's SHA-256.
    ///
    /// The body is streamed into a temporary file next to `destination` and
    /// only renamed into place once complete and, when `expected_sha256` is
    /// given, verified.
    #[instrument(skip_all, fields(url = %url, destination = %destination.display()))]
    pub fn download(
        &self,
        url: &str,
        headers: &HeaderMap,
        destination: &Path,
        expected_sha256: Option<&str>,
    ) -> Result<String> {
        let directory = destination.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        fs::create_dir_all(directory).map_err(ErrorKind::Io)?;
        let (file, sha256) = self.get(url, headers, |response| {
            let mut file = NamedTempFile::new_in(directory).map_err(ErrorKind::Io)?;
            let sha256 = copy_hashing(url, self.throttled(response), file.as_file_mut())?;
            Ok((file, sha256))
        })?;
        if let Some(expected) = expected_sha256
            && !expected.eq_ignore_ascii_case(&sha256)
        {
            exn::bail!(ErrorKind::Checksum { url: url.to_string(), expected: expected.to_string(), actual: sha256 });
        }
        file.persist(destination).map_err(|e| e.error).or_raise(|| ErrorKind::Persist(destination.to_path_buf()))?;
        tracing::debug!(%sha256, "Downloaded");
        Ok(sha256)
    }
}

/// Copy `reader` into `writer`, returning the lowercase hex SHA-256 of
/// everything copied.
fn copy_hashing(url: &str, mut reader: impl Read, writer: &mut impl Write) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                return Err(ErrorKind::Io(e)).or_raise(|| ErrorKind::SlowTransfer(url.to_string()));
            },
            Err(e) => return Err(ErrorKind::Io(e)).or_raise(|| ErrorKind::Request(url.to_string())),
        };
        hasher.update(&buffer[..read]);
        writer.write_all(&buffer[..read]).map_err(ErrorKind::Io)?;
    }
    writer.flush().map_err(ErrorKind::Io)?;
    Ok(format!("{:x}", hasher.finalize()))
}

fn request_error(url: &str, err: reqwest::Error) -> crate::error::Error {
    let kind = if err.is_timeout() {
        ErrorKind::Timeout(url.to_string())
    } else if err.is_connect() {
        ErrorKind::Connect(url.to_string())
    } else {
        ErrorKind::Request(url.to_string())
    };
    exn::Exn::new(err).raise(kind)
}

fn check_status(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() || status == StatusCode::NOT_MODIFIED {
        return Ok(response);
    }
    exn::bail!(ErrorKind::Status { url: url.to_string(), status: status.as_u16() })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread::{self, JoinHandle};
    use tiny_http::{Request, Server};

    /// Local HTTP server answering requests with `respond`, in order.
    pub(crate) struct TestServer {
        pub url: String,
        pub hits: Arc<AtomicUsize>,
        server: Arc<Server>,
        thread: Option<JoinHandle<()>>,
    }
    impl TestServer {
        pub(crate) fn start(respond: impl Fn(usize, Request) + Send + 'static) -> Self {
            let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
            let address = server.server_addr().to_ip().unwrap();
            let hits = Arc::new(AtomicUsize::new(0));
            let thread = {
                let (server, hits) = (Arc::clone(&server), Arc::clone(&hits));
                thread::spawn(move || {
                    for request in server.incoming_requests() {
                        respond(hits.fetch_add(1, Ordering::SeqCst), request);
                    }
                })
            };
            Self { url: format!("http://{address}"), hits, server, thread: Some(thread) }
        }

        pub(crate) fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }
    impl Drop for TestServer {
        fn drop(&mut self) {
            self.server.unblock();
            if let Some(thread) = self.thread.take() {
                _ = thread.join();
            }
        }
    }

    pub(crate) fn client(retries: u32) -> HttpClient {
        HttpClient::new(ClientOptions {
            timeout: Duration::from_secs(10),
            retries,
            retry_delay: Duration::from_millis(1),
            ..Default::default()
        })
        .unwrap()
    }

    pub(crate) fn respond(request: Request, status: u16, body: &[u8]) {
        request.respond(tiny_http::Response::from_data(body.to_vec()).with_status_code(status)).unwrap();
    }

    fn sha256(data: &[u8]) -> String {
        format!("{:x}", Sha256::digest(data))
    }

    #[test]
    fn test_download_writes_and_hashes() {
        let server = TestServer::start(|_, request| respond(request, 200, b"payload"));
        let temp_dir = tempfile::tempdir().unwrap();
        let destination = temp_dir.path().join("nested/file.bin");
        let digest = client(0).download(&server.url, &HeaderMap::new(), &destination, None).unwrap();
        assert_eq!(fs::read(&destination).unwrap(), b"payload");
        assert_eq!(digest, sha256(b"payload"));
    }

    #[test]
    fn test_retries_server_errors() {
        let server = TestServer::start(|hit, request| match hit {
            0 | 1 => respond(request, 503, b"busy"),
            _ => respond(request, 200, b"ok"),
        });
        let body = client(2).get(&server.url, &HeaderMap::new(), |response| Ok(response.text().unwrap())).unwrap();
        assert_eq!(body, "ok");
        assert_eq!(server.hits(), 3);
    }

    #[test]
    fn test_retries_are_bounded() {
        let server = TestServer::start(|_, request| respond(request, 500, b""));
        let err = client(2).get(&server.url, &HeaderMap::new(), |_| Ok(())).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Status { status: 500, .. }));
        assert_eq!(server.hits(), 3);
    }

    #[test]
    fn test_client_errors_are_not_retried() {
        let server = TestServer::start(|_, request| respond(request, 404, b""));
        let err = client(3).get(&server.url, &HeaderMap::new(), |_| Ok(())).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Status { status: 404, .. }));
        assert_eq!(server.hits(), 1);
    }

    #[test]
    fn test_checksum_mismatch_leaves_nothing_behind() {
        let server = TestServer::start(|_, request| respond(request, 200, b"tampered"));
        let temp_dir = tempfile::tempdir().unwrap();
        let destination = temp_dir.path().join("file.bin");
        let expected = sha256(b"original");
        let err = client(0).download(&server.url, &HeaderMap::new(), &destination, Some(&expected)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Checksum { .. }));
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_checksum_is_case_insensitive() {
        let server = TestServer::start(|_, request| respond(request, 200, b"payload"));
        let temp_dir = tempfile::tempdir().unwrap();
        let expected = sha256(b"payload").to_uppercase();
        let destination = temp_dir.path().join("file.bin");
        client(0).download(&server.url, &HeaderMap::new(), &destination, Some(&expected)).unwrap();
        assert!(destination.is_file());
    }

    #[test]
    fn test_connection_refused() {
        // Bind then drop a listener to find a port nothing listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let err = client(0).get(&format!("http://127.0.0.1:{port}/"), &HeaderMap::new(), |_| Ok(())).unwrap_err();
        assert!(err.is_retryable());
    }
}
