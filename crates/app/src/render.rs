//! Plain-text rendering of views for the terminal front-end.

use syncavatar_core::view::{progress_bar_percent, short_job_id, status_text, View};

use crate::picker::PickerView;
use crate::viewer::ResultViewer;

/// Character cells in the rendered progress bar.
const BAR_WIDTH: usize = 30;

pub fn render_view(view: &View) -> String {
    match view {
        View::Upload {
            error,
            can_generate,
            submitting,
        } => {
            let mut lines = Vec::new();
            if let Some(error) = error {
                lines.push(format!("Error: {error}"));
            }
            lines.push(
                if *submitting {
                    "Uploading..."
                } else if *can_generate {
                    "Ready to generate"
                } else {
                    "Select a photo and an audio clip to continue"
                }
                .to_string(),
            );
            lines.join("\n")
        }
        View::Progress {
            job_id,
            status,
            progress,
            image_preview,
        } => {
            let mut lines = vec![
                status_text(*status, *progress).to_string(),
                format!("{} {progress}%", progress_bar(*progress)),
                format!("Process ID: {}", short_job_id(job_id)),
            ];
            if let Some(preview) = image_preview {
                lines.push(format!("Avatar: {preview}"));
            }
            lines.join("\n")
        }
        View::Result { url } => ResultViewer::new(url.clone()).render().join("\n"),
    }
}

pub fn render_picker(view: &PickerView) -> String {
    match view {
        PickerView::Empty {
            label,
            prompt,
            hint,
        } => format!("{label}: {prompt} ({hint})"),
        PickerView::Image { label, preview_url } => format!("{label}: {preview_url}"),
        PickerView::Audio {
            label,
            file_name,
            size,
            preview_url,
        } => format!("{label}: {file_name} ({size}) {preview_url}"),
    }
}

/// `[#####.........]` with the filled share clamped to at least 5%.
pub fn progress_bar(progress: u8) -> String {
    let filled = BAR_WIDTH * usize::from(progress_bar_percent(progress)) / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}
