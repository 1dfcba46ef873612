//! Application controller.
//!
//! Owns the two upload pickers, the tracked job, and the submission, result
//! and error state. Every mutation happens under one `tokio::sync::Mutex` and
//! ends by publishing the freshly selected [`View`] on a `watch` channel.
//!
//! Lifecycle of a run:
//!
//! 1. Files are selected (browse or drop).
//! 2. [`AppController::generate`] uploads them and adopts the returned job.
//! 3. A poll task (see [`crate::poller`]) applies status responses until the
//!    job completes or fails.
//! 4. [`AppController::reset`] returns to an empty upload screen.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use syncavatar_client::backend::JobBackend;
use syncavatar_core::error::CoreError;
use syncavatar_core::job::{Job, JobStatusResponse, PollOutcome};
use syncavatar_core::media::{MediaCategory, MediaFile};
use syncavatar_core::types::JobId;
use syncavatar_core::view::{select_view, ControllerSnapshot, View};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::picker::{DropOutcome, PickerView, UploadPicker};
use crate::poller::{self, PollerGuard, StatusSink};
use crate::preview::PreviewStore;

pub const IMAGE_LABEL: &str = "1. Avatar photo";
pub const AUDIO_LABEL: &str = "2. Speech audio";

/// Result of a [`AppController::generate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// A file is missing, a submission is already in flight, or the
    /// controller has been shut down. Nothing was sent.
    Skipped,
    /// The backend accepted the job and polling has started.
    Submitted { job_id: JobId },
    /// The submission failed; the message is shown on the upload screen.
    Failed { message: String },
    /// A reset happened while the request was in flight; the response was
    /// discarded.
    Abandoned,
}

/// Pointer gesture over a picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEvent {
    Enter,
    Over,
    Leave,
}

struct ControllerState {
    image: UploadPicker,
    audio: UploadPicker,
    job: Option<Job>,
    submitting: bool,
    result_url: Option<String>,
    error: Option<String>,
    /// Bumped by every reset so late submit responses can be recognised.
    epoch: u64,
    poller: Option<PollerGuard>,
}

impl ControllerState {
    fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            job: self.job.clone(),
            result_url: self.result_url.clone(),
            error: self.error.clone(),
            submitting: self.submitting,
            image_selected: self.image.is_selected(),
            audio_selected: self.audio.is_selected(),
            image_preview: self.image.preview_url().map(str::to_string),
        }
    }

    fn picker_mut(&mut self, category: MediaCategory) -> &mut UploadPicker {
        match category {
            MediaCategory::Image => &mut self.image,
            MediaCategory::Audio => &mut self.audio,
        }
    }

    fn picker(&self, category: MediaCategory) -> &UploadPicker {
        match category {
            MediaCategory::Image => &self.image,
            MediaCategory::Audio => &self.audio,
        }
    }

    /// Forget the current job and its outcome, cancelling its poller.
    fn clear_job(&mut self) {
        self.poller = None;
        self.job = None;
        self.result_url = None;
        self.error = None;
    }
}

/// State shared between the controller and its poll task.
struct Shared {
    state: Mutex<ControllerState>,
    views: watch::Sender<View>,
}

impl Shared {
    fn publish(&self, state: &ControllerState) {
        self.views.send_replace(select_view(&state.snapshot()));
    }
}

#[async_trait]
impl StatusSink for Shared {
    async fn apply(
        &self,
        job_id: &str,
        cancel: &CancellationToken,
        response: &JobStatusResponse,
    ) -> ControlFlow<()> {
        let mut state = self.state.lock().await;

        if cancel.is_cancelled() {
            return ControlFlow::Break(());
        }
        let outcome = match state.job.as_mut() {
            Some(job) if job.id == job_id => job.apply(response),
            _ => {
                tracing::debug!(job_id, "Discarding status for a job that is no longer tracked");
                return ControlFlow::Break(());
            }
        };

        tracing::debug!(
            job_id,
            status = %response.status,
            progress = response.progress,
            "Job status updated"
        );

        let flow = match outcome {
            PollOutcome::Active => ControlFlow::Continue(()),
            PollOutcome::Completed { result_url } => {
                tracing::info!(job_id, result_url = %result_url, "Job completed");
                state.result_url = Some(result_url);
                ControlFlow::Break(())
            }
            PollOutcome::Failed { message } => {
                tracing::warn!(job_id, error = %message, "Job failed");
                state.error = Some(message);
                ControlFlow::Break(())
            }
        };

        if flow.is_break() {
            state.poller = None;
        }
        self.publish(&state);
        flow
    }
}

/// Drives one upload-generate-result cycle at a time.
///
/// Dropping the controller cancels any running poll task.
pub struct AppController {
    shared: Arc<Shared>,
    backend: Arc<dyn JobBackend>,
    poll_interval: Duration,
    shutdown: CancellationToken,
}

impl AppController {
    /// Build a controller polling every `poll_interval`, which must be
    /// non-zero.
    pub fn new(
        backend: Arc<dyn JobBackend>,
        previews: Arc<dyn PreviewStore>,
        poll_interval: Duration,
    ) -> Result<Self, CoreError> {
        if poll_interval.is_zero() {
            return Err(CoreError::Validation(
                "poll interval must be greater than zero".into(),
            ));
        }

        let state = ControllerState {
            image: UploadPicker::new(MediaCategory::Image, IMAGE_LABEL, Arc::clone(&previews)),
            audio: UploadPicker::new(MediaCategory::Audio, AUDIO_LABEL, previews),
            job: None,
            submitting: false,
            result_url: None,
            error: None,
            epoch: 0,
            poller: None,
        };
        let (views, _) = watch::channel(select_view(&state.snapshot()));

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                views,
            }),
            backend,
            poll_interval,
            shutdown: CancellationToken::new(),
        })
    }

    /// Receive the current view and every subsequent change.
    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.shared.views.subscribe()
    }

    pub async fn snapshot(&self) -> ControllerSnapshot {
        self.shared.state.lock().await.snapshot()
    }

    pub async fn view(&self) -> View {
        select_view(&self.snapshot().await)
    }

    pub async fn picker_view(&self, category: MediaCategory) -> PickerView {
        self.shared.state.lock().await.picker(category).view()
    }

    /// Accept a file from a browse dialog.
    pub async fn select_file(&self, category: MediaCategory, file: MediaFile) {
        let mut state = self.shared.state.lock().await;
        state.picker_mut(category).select(file);
        self.shared.publish(&state);
    }

    pub async fn drop_files(&self, category: MediaCategory, files: Vec<MediaFile>) -> DropOutcome {
        let mut state = self.shared.state.lock().await;
        let outcome = state.picker_mut(category).drop_files(files);
        self.shared.publish(&state);
        outcome
    }

    pub async fn drag(&self, category: MediaCategory, event: DragEvent) {
        let mut state = self.shared.state.lock().await;
        let picker = state.picker_mut(category);
        match event {
            DragEvent::Enter => picker.drag_enter(),
            DragEvent::Over => picker.drag_over(),
            DragEvent::Leave => picker.drag_leave(),
        }
    }

    pub async fn clear_file(&self, category: MediaCategory) {
        let mut state = self.shared.state.lock().await;
        state.picker_mut(category).clear();
        self.shared.publish(&state);
    }

    /// Upload the selected files and start tracking the new job.
    ///
    /// Does nothing unless both files are selected, no submission is in
    /// flight, and the controller has not been shut down. Any previous job,
    /// result, or error is cleared first.
    pub async fn generate(&self) -> GenerateOutcome {
        if self.shutdown.is_cancelled() {
            tracing::debug!("Generate skipped: controller is shut down");
            return GenerateOutcome::Skipped;
        }

        let (image, audio, epoch) = {
            let mut state = self.shared.state.lock().await;
            if state.submitting {
                return GenerateOutcome::Skipped;
            }
            let (Some(image), Some(audio)) = (state.image.file().cloned(), state.audio.file().cloned())
            else {
                tracing::debug!("Generate skipped: both files are required");
                return GenerateOutcome::Skipped;
            };

            state.clear_job();
            state.submitting = true;
            self.shared.publish(&state);
            (image, audio, state.epoch)
        };

        tracing::info!(image = %image.file_name, audio = %audio.file_name, "Submitting job");
        let result = self.backend.submit(&image, &audio).await;

        let mut state = self.shared.state.lock().await;
        if state.epoch != epoch {
            tracing::info!("Reset during submission, discarding response");
            return GenerateOutcome::Abandoned;
        }
        state.submitting = false;

        let outcome = match result {
            Ok(response) => {
                let job = Job::adopt(&response, Utc::now());
                let job_id = job.id.clone();
                state.job = Some(job);
                state.poller = Some(poller::spawn(
                    Arc::clone(&self.shared),
                    Arc::clone(&self.backend),
                    job_id.clone(),
                    self.poll_interval,
                    &self.shutdown,
                ));
                GenerateOutcome::Submitted { job_id }
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!(error = %message, "Submission failed");
                state.error = Some(message.clone());
                GenerateOutcome::Failed { message }
            }
        };

        self.shared.publish(&state);
        outcome
    }

    /// Return to an empty upload screen.
    ///
    /// Clears both pickers (revoking their previews), the job, the result
    /// and the error, and cancels polling. A submission still in flight is
    /// discarded when it returns.
    pub async fn reset(&self) {
        let mut state = self.shared.state.lock().await;
        state.epoch += 1;
        state.clear_job();
        state.submitting = false;
        state.image.clear();
        state.audio.clear();
        self.shared.publish(&state);
        tracing::debug!("Controller reset");
    }

    /// Tear down: cancel polling and release every preview. Later
    /// [`generate`](Self::generate) calls are skipped.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.reset().await;
        tracing::info!("Controller shut down");
    }
}

impl Drop for AppController {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
