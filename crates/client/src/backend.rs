//! Backend abstraction used by the application controller.

use async_trait::async_trait;
use syncavatar_core::job::{JobStatusResponse, UploadResponse};
use syncavatar_core::media::MediaFile;

use crate::api::ClientError;

/// The two operations the client needs from the generation backend.
///
/// Both are single request/response calls with no retries; the caller
/// decides the retry cadence.
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Upload one portrait image and one audio clip as a new job.
    async fn submit(
        &self,
        image: &MediaFile,
        audio: &MediaFile,
    ) -> Result<UploadResponse, ClientError>;

    /// Fetch the current status of a job.
    async fn fetch_status(&self, job_id: &str) -> Result<JobStatusResponse, ClientError>;
}
