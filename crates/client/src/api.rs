//! REST client for the SyncAvatar backend.
//!
//! Wraps job submission (`POST /upload`), status retrieval
//! (`GET /status/{job_id}`) and result download using [`reqwest`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{StatusCode, Url};
use syncavatar_core::job::{ErrorResponse, JobStatusResponse, UploadResponse};
use syncavatar_core::media::{MediaCategory, MediaFile};
use tokio::io::AsyncWriteExt;

use crate::backend::JobBackend;

/// Message used when a rejected upload carries a JSON body without `detail`.
pub const UPLOAD_FAILED: &str = "Upload failed";

/// HTTP client for one SyncAvatar backend.
#[derive(Debug, Clone)]
pub struct SyncAvatarApi {
    client: reqwest::Client,
    base_url: Url,
}

/// Errors from the SyncAvatar REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The configured base address is not a usable URL.
    #[error("Invalid backend URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// No response at all from the backend during submission.
    #[error(
        "Backend unreachable: could not connect to the server at {base_url}. \
         Check that it is running."
    )]
    Unreachable { base_url: String, reason: String },

    /// The backend answered the upload with a non-2xx status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The backend answered a status request with a non-2xx status.
    #[error("Failed to fetch status")]
    StatusFetchFailed { status: u16 },

    /// The result artifact could not be fetched.
    #[error("Failed to download result ({status})")]
    DownloadFailed { status: u16 },

    /// A selected file could not be read before upload.
    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A downloaded artifact could not be written.
    #[error("Failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other HTTP failure, passed through unchanged.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl SyncAvatarApi {
    /// Create a client for the backend at `base_url`, e.g.
    /// `http://localhost:8000`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`] (custom
    /// timeouts, connection pooling).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, ClientError> {
        let base_url = parse_base_url(base_url)?;
        Ok(Self { client, base_url })
    }

    /// Base address as configured, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Upload the portrait and audio clip as a new job.
    ///
    /// A request that never gets a response is reported as
    /// [`ClientError::Unreachable`]. A non-2xx response becomes
    /// [`ClientError::Rejected`] carrying the backend's `detail` when the
    /// body is JSON, otherwise `"Error {code}: {reason}"`.
    pub async fn submit(
        &self,
        image: &MediaFile,
        audio: &MediaFile,
    ) -> Result<UploadResponse, ClientError> {
        let form = Form::new()
            .part(
                MediaCategory::Image.part_name(),
                file_part(image).await?,
            )
            .part(
                MediaCategory::Audio.part_name(),
                file_part(audio).await?,
            );

        let response = match self
            .client
            .post(self.endpoint(&["upload"]))
            .multipart(form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_builder() => return Err(ClientError::Request(e)),
            Err(e) => {
                tracing::warn!(base_url = %self.base_url(), error = %e, "Backend unreachable");
                return Err(ClientError::Unreachable {
                    base_url: self.base_url().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let message = rejection_message(status, &body);
            tracing::warn!(status = status.as_u16(), message = %message, "Upload rejected");
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let upload = response.json::<UploadResponse>().await?;
        tracing::info!(job_id = %upload.job_id, status = %upload.status, "Job submitted");
        Ok(upload)
    }

    /// Fetch the current status of a job.
    ///
    /// Transport failures are returned unchanged as
    /// [`ClientError::Request`].
    pub async fn fetch_status(&self, job_id: &str) -> Result<JobStatusResponse, ClientError> {
        let result = self.try_fetch_status(job_id).await;
        if let Err(e) = &result {
            tracing::warn!(job_id, error = %e, "Status check failed");
        }
        result
    }

    /// Resolve a result reference against the backend base address.
    ///
    /// Absolute URLs are returned as-is; relative ones (e.g.
    /// `/results/abc.mp4`) are joined onto the base.
    pub fn resolve_url(&self, reference: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(reference)
            .map_err(|e| ClientError::InvalidUrl {
                url: reference.to_string(),
                reason: e.to_string(),
            })
    }

    /// Stream the artifact at `url` into `dest`, returning the byte count.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64, ClientError> {
        let url = self.resolve_url(url)?;
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::DownloadFailed {
                status: status.as_u16(),
            });
        }

        let write_err = |source| ClientError::WriteFile {
            path: dest.to_path_buf(),
            source,
        };

        let mut file = tokio::fs::File::create(dest).await.map_err(write_err)?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;

        tracing::info!(url = %url, dest = %dest.display(), bytes = written, "Result downloaded");
        Ok(written)
    }

    // ---- private helpers ----

    async fn try_fetch_status(&self, job_id: &str) -> Result<JobStatusResponse, ClientError> {
        let response = self
            .client
            .get(self.endpoint(&["status", job_id]))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::StatusFetchFailed {
                status: status.as_u16(),
            });
        }

        Ok(response.json::<JobStatusResponse>().await?)
    }

    /// Build `{base}/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl JobBackend for SyncAvatarApi {
    async fn submit(
        &self,
        image: &MediaFile,
        audio: &MediaFile,
    ) -> Result<UploadResponse, ClientError> {
        SyncAvatarApi::submit(self, image, audio).await
    }

    async fn fetch_status(&self, job_id: &str) -> Result<JobStatusResponse, ClientError> {
        SyncAvatarApi::fetch_status(self, job_id).await
    }
}

/// Parse and validate the configured backend address.
fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("expected an http(s) base address".to_string()));
    }
    Ok(url)
}

/// Read a selected file into a multipart part, keeping name and MIME type.
async fn file_part(file: &MediaFile) -> Result<Part, ClientError> {
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|source| ClientError::ReadFile {
            path: file.path.clone(),
            source,
        })?;

    Ok(Part::bytes(bytes)
        .file_name(file.file_name.clone())
        .mime_str(&file.mime_type)?)
}

/// Build the user-facing message for a rejected upload.
///
/// JSON object bodies yield their [`ErrorResponse`] detail (or
/// [`UPLOAD_FAILED`] when it is missing). Any other body, including JSON
/// `null` or arrays, yields the status code and reason phrase.
pub fn rejection_message(status: StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) if value.is_object() => serde_json::from_value::<ErrorResponse>(value)
            .unwrap_or_default()
            .detail_text()
            .unwrap_or_else(|| UPLOAD_FAILED.to_string()),
        _ => format!(
            "Error {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status")
        ),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn rejection_prefers_detail() {
        let msg = rejection_message(
            StatusCode::INTERNAL_SERVER_ERROR,
            br#"{"detail":"bad image"}"#,
        );
        assert_eq!(msg, "bad image");
    }

    #[test]
    fn rejection_without_detail_uses_generic_message() {
        let msg = rejection_message(StatusCode::BAD_REQUEST, br#"{"error":"x"}"#);
        assert_eq!(msg, UPLOAD_FAILED);
    }

    #[test]
    fn rejection_with_structured_detail_is_serialized() {
        let msg = rejection_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            br#"{"detail":[{"loc":["image"]}]}"#,
        );
        assert_eq!(msg, r#"[{"loc":["image"]}]"#);
    }

    #[test]
    fn rejection_with_plain_body_uses_status_line() {
        let msg = rejection_message(StatusCode::BAD_GATEWAY, b"<html>oops</html>");
        assert_eq!(msg, "Error 502: Bad Gateway");
    }

    #[test]
    fn rejection_with_non_object_json_uses_status_line() {
        let msg = rejection_message(StatusCode::INTERNAL_SERVER_ERROR, b"null");
        assert_eq!(msg, "Error 500: Internal Server Error");

        let msg = rejection_message(StatusCode::BAD_REQUEST, br#"["bad"]"#);
        assert_eq!(msg, "Error 400: Bad Request");
    }

    #[test]
    fn base_url_must_be_http() {
        assert!(SyncAvatarApi::new("http://localhost:8000").is_ok());
        assert_matches!(
            SyncAvatarApi::new("localhost:8000"),
            Err(ClientError::InvalidUrl { .. })
        );
        assert_matches!(
            SyncAvatarApi::new("ftp://example.com"),
            Err(ClientError::InvalidUrl { .. })
        );
    }

    #[test]
    fn endpoints_are_joined_and_encoded() {
        let api = SyncAvatarApi::new("http://localhost:8000/").unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(
            api.endpoint(&["status", "a b/c"]).as_str(),
            "http://localhost:8000/status/a%20b%2Fc"
        );

        let nested = SyncAvatarApi::new("http://host/api").unwrap();
        assert_eq!(nested.endpoint(&["upload"]).as_str(), "http://host/api/upload");
    }

    #[test]
    fn relative_results_resolve_against_base() {
        let api = SyncAvatarApi::new("http://localhost:8000").unwrap();
        assert_eq!(
            api.resolve_url("/results/v.mp4").unwrap().as_str(),
            "http://localhost:8000/results/v.mp4"
        );
        assert_eq!(
            api.resolve_url("http://cdn/x.mp4").unwrap().as_str(),
            "http://cdn/x.mp4"
        );
    }

    #[test]
    fn unreachable_message_names_address() {
        let err = ClientError::Unreachable {
            base_url: "http://localhost:8000".into(),
            reason: "connection refused".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("http://localhost:8000"));
        assert!(msg.contains("unreachable"));
    }
}
