//! File service client implementation
//!
//! Implements the `RemoteStore` trait against the self-hosted file service
//! (`GET /files`, `POST /files`, `GET /files/{filename}`).

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::media::{RemoteFile, RemoteStore, UploadOutcome};
use bytes::Bytes;
use core_identity::DeviceId;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{FileServerError, Result};
use crate::types::{FilesListResponse, UploadResponse};

/// Default per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Default retry attempts for 429/5xx
const MAX_RETRIES: u32 = 3;

/// File service client
///
/// Every request carries the session bearer token and the credential-derived
/// device identity header. Construction requires both, so a request without a
/// resolvable identity cannot be built and identity failures surface before
/// any bytes leave the device.
///
/// # Example
///
/// ```ignore
/// use provider_fileserver::FileServerClient;
/// use bridge_traits::media::RemoteStore;
///
/// let client = FileServerClient::new(http_client, "https://backup.local:4000", token, device_id);
/// let files = client.list_files().await?;
/// ```
pub struct FileServerClient {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// Base URL of the file service, without a trailing slash
    base_url: String,

    /// Session bearer token
    token: String,

    /// Credential-derived device identity
    device_id: DeviceId,

    /// Retry attempts for transient errors
    max_retries: u32,
}

impl FileServerClient {
    /// Create a new file service client
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `base_url` - Service base URL, e.g. `https://backup.local:4000`
    /// * `token` - Session bearer token
    /// * `device_id` - Device identity sent as `X-Device-UUID`
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        base_url: impl Into<String>,
        token: impl Into<String>,
        device_id: DeviceId,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self {
            http_client,
            base_url,
            token: token.into(),
            device_id,
            max_retries: MAX_RETRIES,
        }
    }

    /// Override the retry attempt count
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Build a request with the auth and identity headers attached
    fn request(&self, method: HttpMethod, url: String) -> HttpRequest {
        HttpRequest::new(method, url)
            .bearer_token(&self.token)
            .header("X-Device-UUID", self.device_id.to_string())
            .timeout(REQUEST_TIMEOUT)
    }

    /// Execute a request with retry for rate limiting and server errors
    async fn execute_with_retry(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut attempt = 0;

        loop {
            match self.http_client.execute(request.clone()).await {
                Ok(response) => {
                    let status = response.status;

                    if response.is_success() {
                        debug!(status = status, "API request succeeded");
                        return Ok(response);
                    } else if status == 401 || status == 403 {
                        return Err(FileServerError::AuthenticationFailed(format!(
                            "Server rejected credentials (status {})",
                            status
                        )));
                    } else if status == 429 || response.is_server_error() {
                        attempt += 1;
                        if attempt >= self.max_retries {
                            warn!(
                                "API request failed after {} attempts: status={}",
                                self.max_retries, status
                            );
                            return Err(FileServerError::ApiError {
                                status_code: status,
                                message: format!(
                                    "Request failed after {} retries",
                                    self.max_retries
                                ),
                            });
                        }

                        let backoff_ms = 100u64 * 2u64.pow(attempt);
                        warn!(
                            "API request failed (attempt {}/{}): status={}, retrying in {}ms",
                            attempt, self.max_retries, status, backoff_ms
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    } else {
                        // Client error, don't retry
                        warn!("API request failed: status={}", status);
                        return Err(FileServerError::ApiError {
                            status_code: status,
                            message: String::from_utf8_lossy(&response.body).to_string(),
                        });
                    }
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.max_retries {
                        warn!("API request failed after {} attempts: {}", self.max_retries, e);
                        return Err(FileServerError::BridgeError(e));
                    }

                    let backoff_ms = 100u64 * 2u64.pow(attempt);
                    warn!(
                        "API request failed (attempt {}/{}): {}, retrying in {}ms",
                        attempt, self.max_retries, e, backoff_ms
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }

    /// Build a multipart/form-data body with a single `file` field
    fn multipart_body(boundary: &str, filename: &str, content: &Bytes) -> Bytes {
        let escaped = filename.replace('"', "\\\"");
        let mut body = Vec::with_capacity(content.len() + 256);

        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                escaped
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        Bytes::from(body)
    }

    async fn list_files_internal(&self) -> Result<Vec<RemoteFile>> {
        info!("Listing files from server");

        let url = format!("{}/files", self.base_url);
        let request = self.request(HttpMethod::Get, url);
        let response = self.execute_with_retry(request).await?;

        let listing: FilesListResponse = serde_json::from_slice(&response.body).map_err(|e| {
            FileServerError::ParseError(format!("Failed to parse files list response: {}", e))
        })?;

        let files: Vec<RemoteFile> = listing
            .files
            .into_iter()
            .map(|f| RemoteFile::new(f.filename))
            .collect();

        info!("Listed {} files from server", files.len());
        Ok(files)
    }

    async fn upload_internal(&self, filename: &str, content: Bytes) -> Result<UploadOutcome> {
        info!(filename = filename, bytes = content.len(), "Uploading file");

        let boundary = format!("photoback-{}", Uuid::new_v4().simple());
        let body = Self::multipart_body(&boundary, filename, &content);

        let url = format!("{}/files", self.base_url);
        let request = self
            .request(HttpMethod::Post, url)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(body);

        let response = self.execute_with_retry(request).await?;

        let upload: UploadResponse = serde_json::from_slice(&response.body).map_err(|e| {
            FileServerError::ParseError(format!("Failed to parse upload response: {}", e))
        })?;

        if upload.duplicate {
            debug!(filename = filename, "Server reported content-level duplicate");
        }

        Ok(UploadOutcome {
            duplicate: upload.duplicate,
        })
    }

    async fn download_internal(&self, filename: &str) -> Result<Bytes> {
        info!(filename = filename, "Downloading file");

        let url = format!(
            "{}/files/{}",
            self.base_url,
            urlencoding::encode(filename)
        );
        let request = self.request(HttpMethod::Get, url);

        let response = match self.execute_with_retry(request).await {
            Ok(response) => response,
            Err(FileServerError::ApiError { status_code: 404, .. }) => {
                return Err(FileServerError::FileNotFound {
                    filename: filename.to_string(),
                })
            }
            Err(e) => return Err(e),
        };

        Ok(response.body)
    }
}

#[async_trait]
impl RemoteStore for FileServerClient {
    #[instrument(skip(self))]
    async fn list_files(&self) -> BridgeResult<Vec<RemoteFile>> {
        self.list_files_internal().await.map_err(Into::into)
    }

    #[instrument(skip(self, content), fields(filename = %filename))]
    async fn upload(&self, filename: &str, content: Bytes) -> BridgeResult<UploadOutcome> {
        self.upload_internal(filename, content)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self), fields(filename = %filename))]
    async fn download(&self, filename: &str) -> BridgeResult<Bytes> {
        self.download_internal(filename).await.map_err(Into::into)
    }
}
