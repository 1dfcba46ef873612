//! Job lifecycle model and backend wire payloads.
//!
//! A [`Job`] is created from a successful [`UploadResponse`] and is only
//! ever mutated by applying [`JobStatusResponse`]s from the status
//! endpoint. [`Job::apply`] reports what the caller should do next via
//! [`PollOutcome`].

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::types::{JobId, Timestamp};

/// Error text shown when the backend reports `error` without a detail.
pub const UNKNOWN_PROCESSING_ERROR: &str = "Unknown processing error";

/// Error text shown when the backend reports `completed` without a URL.
pub const MISSING_RESULT_ERROR: &str = "Job completed without a result URL";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Status of a job on the backend queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    /// `queued` and `processing` keep the poller running.
    pub fn is_active(self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Processing)
    }

    /// `completed` and `error` end the lifecycle.
    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

/// Response body of `POST /upload`.
///
/// The `status` string is informational only; the client always starts a
/// freshly adopted job in [`JobStatus::Queued`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub job_id: JobId,
    pub status: String,
}

/// Response body of `GET /status/{job_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Completion percentage (0-100).
    #[serde(deserialize_with = "deserialize_progress")]
    pub progress: u8,
    #[serde(default)]
    pub result_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Accept any JSON number for `progress`, rounded and clamped to 0-100.
fn deserialize_progress<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() {
        return Err(de::Error::custom("progress must be a finite number"));
    }
    Ok(value.round().clamp(0.0, 100.0) as u8)
}

/// Optional JSON body returned with a rejected upload.
///
/// `detail` is usually a string, but validation failures may carry a
/// structured value, so it is kept as raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Text to show for the rejection. `None` when `detail` is missing,
    /// null, or an empty string.
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// Client-side view of the job currently being tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    /// Last reported progress. Not forced to be monotonic.
    pub progress: u8,
    pub submitted_at: Timestamp,
}

/// What a single status response means for the polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Job is still queued or processing; keep polling.
    Active,
    /// Job finished and produced a result.
    Completed { result_url: String },
    /// Job ended in failure (or finished without a usable result).
    Failed { message: String },
}

impl PollOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollOutcome::Active)
    }
}

impl Job {
    /// Adopt a job from a successful upload. Status always starts as queued.
    pub fn adopt(response: &UploadResponse, submitted_at: Timestamp) -> Self {
        Self {
            id: response.job_id.clone(),
            status: JobStatus::Queued,
            progress: 0,
            submitted_at,
        }
    }

    /// Apply a status response.
    ///
    /// Status and progress are overwritten unconditionally. A `completed`
    /// response is checked before `error`, so a payload carrying both a
    /// result URL and an error detail counts as completed.
    pub fn apply(&mut self, response: &JobStatusResponse) -> PollOutcome {
        self.status = response.status;
        self.progress = response.progress;

        match response.status {
            JobStatus::Completed => match non_empty(response.result_url.as_deref()) {
                Some(url) => PollOutcome::Completed {
                    result_url: url.to_string(),
                },
                None => PollOutcome::Failed {
                    message: MISSING_RESULT_ERROR.to_string(),
                },
            },
            JobStatus::Error => PollOutcome::Failed {
                message: non_empty(response.error.as_deref())
                    .unwrap_or(UNKNOWN_PROCESSING_ERROR)
                    .to_string(),
            },
            JobStatus::Queued | JobStatus::Processing => PollOutcome::Active,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
