//! View selection for the client front-end.
//!
//! [`select_view`] is a pure function from an immutable
//! [`ControllerSnapshot`] to exactly one [`View`] variant. Which screen to
//! show depends only on the job id, the result URL, and the error; the
//! remaining snapshot fields only enrich the chosen variant.

use crate::job::{Job, JobStatus};
use crate::types::JobId;

/// Minimum width (percent) of the rendered progress bar.
pub const MIN_PROGRESS_BAR_PERCENT: u8 = 5;

/// Number of job id characters shown on the progress screen.
const SHORT_JOB_ID_LEN: usize = 8;

/// Immutable copy of the controller state taken under its lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub job: Option<Job>,
    pub result_url: Option<String>,
    pub error: Option<String>,
    pub submitting: bool,
    pub image_selected: bool,
    pub audio_selected: bool,
    /// Preview URL of the selected portrait, shown while processing.
    pub image_preview: Option<String>,
}

/// The screen the front-end should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// File pickers, optional error banner, and the generate action.
    Upload {
        error: Option<String>,
        can_generate: bool,
        submitting: bool,
    },
    /// Job accepted and not yet finished.
    Progress {
        job_id: JobId,
        status: JobStatus,
        progress: u8,
        image_preview: Option<String>,
    },
    /// Finished video.
    Result { url: String },
}

/// Select the view for a snapshot.
///
/// - result URL present -> [`View::Result`]
/// - job id present, no result, no error -> [`View::Progress`]
/// - anything else -> [`View::Upload`]
pub fn select_view(snapshot: &ControllerSnapshot) -> View {
    if let Some(url) = &snapshot.result_url {
        return View::Result { url: url.clone() };
    }

    match (&snapshot.job, &snapshot.error) {
        (Some(job), None) => View::Progress {
            job_id: job.id.clone(),
            status: job.status,
            progress: job.progress,
            image_preview: snapshot.image_preview.clone(),
        },
        _ => View::Upload {
            error: snapshot.error.clone(),
            can_generate: can_generate(snapshot),
            submitting: snapshot.submitting,
        },
    }
}

/// The generate action is enabled only with both files and no submission
/// in flight.
pub fn can_generate(snapshot: &ControllerSnapshot) -> bool {
    snapshot.image_selected && snapshot.audio_selected && !snapshot.submitting
}

/// Headline shown on the progress screen.
pub fn status_text(status: JobStatus, progress: u8) -> &'static str {
    if status == JobStatus::Queued {
        return "Starting worker...";
    }
    match progress {
        0..=29 => "Identifying facial landmarks...",
        30..=69 => "Syncing lips with audio...",
        70..=89 => "Rendering final video...",
        _ => "Finishing up...",
    }
}

/// First eight characters of the job id followed by an ellipsis.
pub fn short_job_id(job_id: &str) -> String {
    let head: String = job_id.chars().take(SHORT_JOB_ID_LEN).collect();
    format!("{head}...")
}

/// Width of the progress bar, never below [`MIN_PROGRESS_BAR_PERCENT`].
pub fn progress_bar_percent(progress: u8) -> u8 {
    progress.clamp(MIN_PROGRESS_BAR_PERCENT, 100)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    fn job(status: JobStatus, progress: u8) -> Job {
        Job {
            id: "abc123def456".into(),
            status,
            progress,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn idle_snapshot_selects_upload() {
        let view = select_view(&ControllerSnapshot::default());
        assert_eq!(
            view,
            View::Upload {
                error: None,
                can_generate: false,
                submitting: false
            }
        );
    }

    #[test]
    fn every_combination_selects_exactly_one_view() {
        for has_job in [false, true] {
            for has_result in [false, true] {
                for has_error in [false, true] {
                    let snapshot = ControllerSnapshot {
                        job: has_job.then(|| job(JobStatus::Processing, 50)),
                        result_url: has_result.then(|| "http://x/v.mp4".to_string()),
                        error: has_error.then(|| "boom".to_string()),
                        ..Default::default()
                    };
                    let view = select_view(&snapshot);
                    match view {
                        View::Result { .. } => assert!(has_result),
                        View::Progress { .. } => {
                            assert!(has_job && !has_result && !has_error)
                        }
                        View::Upload { .. } => {
                            assert!(!has_result && (!has_job || has_error))
                        }
                    }
                    // Pure: same input, same output.
                    assert_eq!(select_view(&snapshot), view);
                }
            }
        }
    }

    #[test]
    fn terminal_error_returns_to_upload_with_banner() {
        let snapshot = ControllerSnapshot {
            job: Some(job(JobStatus::Error, 30)),
            error: Some("Unknown processing error".into()),
            image_selected: true,
            audio_selected: true,
            ..Default::default()
        };
        assert_matches!(
            select_view(&snapshot),
            View::Upload { error: Some(e), can_generate: true, .. } if e == "Unknown processing error"
        );
    }

    #[test]
    fn submitting_disables_generate() {
        let snapshot = ControllerSnapshot {
            submitting: true,
            image_selected: true,
            audio_selected: true,
            ..Default::default()
        };
        assert!(!can_generate(&snapshot));
    }

    #[test]
    fn status_text_follows_progress_bands() {
        assert_eq!(status_text(JobStatus::Queued, 50), "Starting worker...");
        assert_eq!(status_text(JobStatus::Processing, 0), "Identifying facial landmarks...");
        assert_eq!(status_text(JobStatus::Processing, 30), "Syncing lips with audio...");
        assert_eq!(status_text(JobStatus::Processing, 89), "Rendering final video...");
        assert_eq!(status_text(JobStatus::Processing, 90), "Finishing up...");
    }

    #[test]
    fn short_id_and_bar_width() {
        assert_eq!(short_job_id("abc123def456"), "abc123de...");
        assert_eq!(short_job_id("abc"), "abc...");
        assert_eq!(progress_bar_percent(0), 5);
        assert_eq!(progress_bar_percent(45), 45);
        assert_eq!(progress_bar_percent(200), 100);
    }
}
