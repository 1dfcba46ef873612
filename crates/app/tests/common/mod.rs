//! Shared fixtures for controller integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use syncavatar_app::controller::{AppController, GenerateOutcome};
use syncavatar_app::preview::{ObjectUrlRegistry, PreviewStore};
use syncavatar_client::api::ClientError;
use syncavatar_client::backend::JobBackend;
use syncavatar_core::job::{JobStatus, JobStatusResponse, UploadResponse};
use syncavatar_core::media::{MediaCategory, MediaFile};
use tokio::sync::Notify;

pub const POLL: Duration = Duration::from_secs(2);

/// How the fake answers `submit`.
#[derive(Debug, Clone)]
pub enum SubmitScript {
    Accept { job_id: String, status: String },
    Reject { status: u16, message: String },
    Unreachable { base_url: String },
}

/// How the fake answers one `fetch_status` call.
#[derive(Debug, Clone)]
pub enum StatusScript {
    Respond(JobStatusResponse),
    Fail,
}

/// Scripted [`JobBackend`] that counts its calls.
///
/// Status scripts are consumed in order; once exhausted the last one is
/// repeated.
pub struct FakeBackend {
    submit: Mutex<SubmitScript>,
    statuses: Mutex<VecDeque<StatusScript>>,
    last_status: Mutex<Option<StatusScript>>,
    /// When set, `submit` waits for a notification before answering.
    submit_gate: Option<Arc<Notify>>,
    pub submit_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub fetched_ids: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn accepting(job_id: &str) -> Self {
        Self::new(SubmitScript::Accept {
            job_id: job_id.to_string(),
            status: "ignored".to_string(),
        })
    }

    pub fn new(submit: SubmitScript) -> Self {
        Self {
            submit: Mutex::new(submit),
            statuses: Mutex::new(VecDeque::new()),
            last_status: Mutex::new(None),
            submit_gate: None,
            submit_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            fetched_ids: Mutex::new(Vec::new()),
        }
    }

    pub fn with_statuses(self, statuses: impl IntoIterator<Item = StatusScript>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into_iter().collect();
        self
    }

    pub fn with_submit_gate(mut self, gate: Arc<Notify>) -> Self {
        self.submit_gate = Some(gate);
        self
    }

    pub fn set_submit(&self, script: SubmitScript) {
        *self.submit.lock().unwrap() = script;
    }

    pub fn submits(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobBackend for FakeBackend {
    async fn submit(
        &self,
        _image: &MediaFile,
        _audio: &MediaFile,
    ) -> Result<UploadResponse, ClientError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.submit_gate {
            gate.notified().await;
        }

        let script = self.submit.lock().unwrap().clone();
        match script {
            SubmitScript::Accept { job_id, status } => Ok(UploadResponse { job_id, status }),
            SubmitScript::Reject { status, message } => {
                Err(ClientError::Rejected { status, message })
            }
            SubmitScript::Unreachable { base_url } => Err(ClientError::Unreachable {
                base_url,
                reason: "connection refused".to_string(),
            }),
        }
    }

    async fn fetch_status(&self, job_id: &str) -> Result<JobStatusResponse, ClientError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetched_ids.lock().unwrap().push(job_id.to_string());

        let script = {
            let mut queue = self.statuses.lock().unwrap();
            let mut last = self.last_status.lock().unwrap();
            match queue.pop_front() {
                Some(next) => {
                    *last = Some(next.clone());
                    next
                }
                None => last.clone().unwrap_or(StatusScript::Fail),
            }
        };

        match script {
            StatusScript::Respond(response) => Ok(response),
            StatusScript::Fail => Err(ClientError::StatusFetchFailed { status: 502 }),
        }
    }
}

pub fn status(
    job_id: &str,
    status: JobStatus,
    progress: u8,
    result_url: Option<&str>,
    error: Option<&str>,
) -> StatusScript {
    StatusScript::Respond(JobStatusResponse {
        job_id: job_id.to_string(),
        status,
        progress,
        result_url: result_url.map(str::to_string),
        error: error.map(str::to_string),
    })
}

pub fn image() -> MediaFile {
    MediaFile::new("/tmp/face.png", "image/png", 2048)
}

pub fn audio() -> MediaFile {
    MediaFile::new("/tmp/voice.wav", "audio/wav", 4096)
}

pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub previews: Arc<ObjectUrlRegistry>,
    pub controller: AppController,
}

impl Harness {
    pub fn new(backend: FakeBackend) -> Self {
        let backend = Arc::new(backend);
        let previews = Arc::new(ObjectUrlRegistry::new());
        let store: Arc<dyn PreviewStore> = previews.clone();
        let controller = AppController::new(backend.clone(), store, POLL).unwrap();
        Self {
            backend,
            previews,
            controller,
        }
    }

    /// Select both files through the browse path.
    pub async fn with_files(self) -> Self {
        self.controller
            .select_file(MediaCategory::Image, image())
            .await;
        self.controller
            .select_file(MediaCategory::Audio, audio())
            .await;
        self
    }

    /// Generate, then step 1 ms so later [`next_tick`] calls land just
    /// after each poll instead of on it.
    pub async fn generate(&self) -> GenerateOutcome {
        let outcome = self.controller.generate().await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        outcome
    }
}

/// Advance the paused clock by one poll period.
pub async fn next_tick() {
    tokio::time::sleep(POLL).await;
}
