//! Retrying fetch client.

use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, HttpStream, RetryPolicy};
use bytes::Bytes;
use core_async::fs;
use core_async::io::{AsyncReadExt, AsyncWriteExt};
use core_async::time::{sleep, Duration, Instant};
use core_runtime::logging::strip_path;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::atomic::{ensure_parent, PartFile};
use crate::error::{FetchError, Result};
use crate::filename::derive_filename;

/// Download buffer size.
pub const DOWNLOAD_CHUNK_SIZE: usize = 1024 * 1024;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Body of a successful [`FetchClient::request`].
#[derive(Debug, Clone, PartialEq)]
pub enum FetchBody {
    /// The response declared a JSON content type and parsed as JSON
    Json(serde_json::Value),
    /// Anything else, untouched
    Bytes(Bytes),
}

/// Outcome of [`FetchClient::download`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DownloadResult {
    pub success: bool,
    pub file_path: Option<PathBuf>,
    pub error: Option<String>,
    pub status_code: Option<u16>,
}

impl From<Result<PathBuf>> for DownloadResult {
    fn from(result: Result<PathBuf>) -> Self {
        match result {
            Ok(path) => DownloadResult {
                success: true,
                file_path: Some(path),
                ..Default::default()
            },
            Err(err) => DownloadResult {
                success: false,
                file_path: None,
                status_code: err.status_code(),
                error: Some(err.to_string()),
            },
        }
    }
}

/// HTTP client with retries, JSON sniffing and atomic downloads.
#[derive(Clone)]
pub struct FetchClient {
    http: Arc<dyn HttpClient>,
    policy: RetryPolicy,
    downloads_dir: PathBuf,
    request_timeout: Duration,
    download_timeout: Duration,
}

impl FetchClient {
    pub fn new(
        http: Arc<dyn HttpClient>,
        policy: RetryPolicy,
        downloads_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            http,
            policy,
            downloads_dir: downloads_dir.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }

    /// Metadata calls and media downloads get separate deadlines.
    pub fn with_timeouts(mut self, request: Duration, download: Duration) -> Self {
        self.request_timeout = request;
        self.download_timeout = download;
        self
    }

    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// GET `url` and return its body.
    ///
    /// Transport failures and non-success statuses are retried according to
    /// the retry policy; a body that claims to be JSON but does not parse is a
    /// [`FetchError::Decode`] and is not retried.
    #[instrument(skip(self, params, headers))]
    pub async fn request(
        &self,
        url: &str,
        params: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<FetchBody> {
        if url.trim().is_empty() {
            return Err(FetchError::InvalidInput("Empty URL provided".to_string()));
        }

        let mut request = HttpRequest::get(url)
            .headers(headers.iter().copied())
            .timeout(self.request_timeout);
        for (key, value) in params {
            request = request.query_param(*key, *value);
        }

        let request = &request;
        let started = Instant::now();
        let response = self
            .with_retry(url, move || async move {
                let response = self.http.execute(request.clone()).await?;
                if response.is_success() {
                    Ok(response)
                } else {
                    Err(FetchError::Http {
                        status: response.status,
                        message: parse_error_message(&response),
                    })
                }
            })
            .await?;

        debug!(
            status = response.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request succeeded"
        );

        if response.content_type().contains("application/json") {
            serde_json::from_slice(&response.body)
                .map(FetchBody::Json)
                .map_err(|e| {
                    error!(error = %e, "Failed to parse JSON response");
                    FetchError::Decode(format!("Invalid JSON response: {}", e))
                })
        } else {
            Ok(FetchBody::Bytes(response.body))
        }
    }

    /// Download `url` to `destination`, or into the downloads directory under
    /// a derived filename when no destination is given.
    pub async fn download(
        &self,
        url: &str,
        destination: Option<&Path>,
        overwrite: bool,
    ) -> DownloadResult {
        let result = self.download_to(url, destination, overwrite).await;
        if let Err(err) = &result {
            error!(url = %url, error = %err, "Download failed");
        }
        result.into()
    }

    /// Typed form of [`FetchClient::download`].
    #[instrument(skip(self, destination))]
    pub async fn download_to(
        &self,
        url: &str,
        destination: Option<&Path>,
        overwrite: bool,
    ) -> Result<PathBuf> {
        if url.trim().is_empty() {
            return Err(FetchError::InvalidInput("Empty URL provided".to_string()));
        }

        if let Some(path) = destination {
            if !overwrite && exists(path).await {
                debug!("File already exists and overwrite is off");
                return Ok(path.to_path_buf());
            }
        }

        let request = HttpRequest::get(url).timeout(self.download_timeout);
        let request = &request;

        self.with_retry(url, move || async move {
            let stream = self.http.open_stream(request.clone()).await?;
            if !stream.is_success() {
                let status = stream.status;
                let message = read_error_body(stream).await;
                return Err(FetchError::Http { status, message });
            }

            let path = match destination {
                Some(path) => path.to_path_buf(),
                None => {
                    let name = derive_filename(url, stream.header("content-disposition"));
                    let path = self.downloads_dir.join(name);
                    if !overwrite && exists(&path).await {
                        debug!(file = %strip_path(&path.to_string_lossy()), "File already exists");
                        return Ok(path);
                    }
                    path
                }
            };

            write_atomically(stream, &path).await?;
            Ok(path)
        })
        .await
    }

    /// Runs `attempt` until it succeeds, fails with a non-retryable error,
    /// or the policy runs out of attempts.
    async fn with_retry<T, F, Fut>(&self, url: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt_no = 0;

        loop {
            attempt_no += 1;
            debug!(
                attempt = attempt_no,
                max_attempts,
                url = %url,
                "Executing HTTP request"
            );

            let err = match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            if attempt_no >= max_attempts {
                error!(
                    attempts = attempt_no,
                    url = %url,
                    error = %err,
                    "All retry attempts exhausted"
                );
                return Err(err);
            }

            let delay = self.policy.delay_after(attempt_no);
            warn!(
                attempt = attempt_no,
                max_attempts,
                status = ?err.status_code(),
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "HTTP request failed, retrying after delay"
            );
            sleep(delay).await;
        }
    }
}

async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

/// `error`, then `message` from a JSON body, then the raw text.
fn parse_error_message(response: &HttpResponse) -> String {
    error_message_from_body(&response.body)
}

fn error_message_from_body(body: &[u8]) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_slice::<serde_json::Value>(body)
    {
        for key in ["error", "message"] {
            match map.get(key) {
                Some(serde_json::Value::String(s)) => return s.clone(),
                Some(other) => return other.to_string(),
                None => {}
            }
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        "No error details provided".to_string()
    } else {
        text.to_string()
    }
}

/// Error bodies are small; cap what we read so a misbehaving server cannot
/// make us buffer a media file.
async fn read_error_body(stream: HttpStream) -> String {
    const MAX_ERROR_BODY: u64 = 64 * 1024;
    let mut body = Vec::new();
    let mut limited = stream.body.take(MAX_ERROR_BODY);
    if let Err(e) = limited.read_to_end(&mut body).await {
        warn!(error = %e, read = body.len(), "Failed to read error body");
    }
    error_message_from_body(&body)
}

/// Streams the body to a private temp sibling and renames it into place.
async fn write_atomically(mut stream: HttpStream, path: &Path) -> Result<()> {
    ensure_parent(path).await?;

    let part = PartFile::for_destination(path);
    let written = stream_to_file(&mut stream, part.path()).await?;
    part.persist(path).await?;

    info!(
        file = %strip_path(&path.to_string_lossy()),
        bytes = written,
        "Download complete"
    );
    Ok(())
}

async fn stream_to_file(stream: &mut HttpStream, temp_path: &Path) -> Result<u64> {
    let mut file = fs::File::create(temp_path)
        .await
        .map_err(|e| FetchError::io(temp_path, e))?;

    let mut buffer = vec![0u8; DOWNLOAD_CHUNK_SIZE];
    let mut written = 0u64;

    loop {
        let read = stream
            .body
            .read(&mut buffer)
            .await
            .map_err(|e| FetchError::Transport(format!("Download interrupted: {}", e)))?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read])
            .await
            .map_err(|e| FetchError::io(temp_path, e))?;
        written += read as u64;
    }

    file.flush().await.map_err(|e| FetchError::io(temp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| FetchError::io(temp_path, e))?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_error_key() {
        let body = br#"{"error": "track not found", "message": "ignored"}"#;
        assert_eq!(error_message_from_body(body), "track not found");
    }

    #[test]
    fn test_error_message_falls_back_to_message_then_text() {
        assert_eq!(
            error_message_from_body(br#"{"message": "rate limited"}"#),
            "rate limited"
        );
        assert_eq!(error_message_from_body(b"Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message_from_body(b""), "No error details provided");
    }

    #[test]
    fn test_download_result_from_error_keeps_status() {
        let result: DownloadResult = Err(FetchError::Http {
            status: 404,
            message: "gone".to_string(),
        })
        .into();

        assert!(!result.success);
        assert_eq!(result.status_code, Some(404));
        assert!(result.error.unwrap().contains("gone"));
    }
}
