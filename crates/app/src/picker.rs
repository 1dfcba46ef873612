//! Upload slot for one media category.
//!
//! A picker accepts a file either through a browse dialog ([`UploadPicker::select`],
//! already filtered by [`MediaCategory::accept_pattern`]) or through drag
//! and drop ([`UploadPicker::drop_files`], which checks the MIME prefix
//! itself). Each selection owns exactly one [`PreviewHandle`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use syncavatar_core::media::{MediaCategory, MediaFile};

use crate::preview::{PreviewHandle, PreviewStore};

/// Prompt shown in an empty slot while a drag hovers over it.
pub const DROP_PROMPT: &str = "Drop the file here";

/// Prompt shown in an empty slot otherwise.
pub const IDLE_PROMPT: &str = "Click or drag";

#[derive(Debug, thiserror::Error)]
pub enum PickerError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a regular file")]
    NotAFile { path: PathBuf },
}

/// Result of a drop gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// The first dropped file matched the category and is now selected.
    Accepted,
    /// Nothing was dropped, or the first file had the wrong MIME type.
    /// The current selection is unchanged.
    Ignored,
}

/// What the renderer should draw for a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerView {
    Empty {
        label: String,
        prompt: &'static str,
        hint: &'static str,
    },
    Image {
        label: String,
        preview_url: String,
    },
    Audio {
        label: String,
        file_name: String,
        size: String,
        preview_url: String,
    },
}

#[derive(Debug)]
struct Selection {
    file: MediaFile,
    preview: PreviewHandle,
}

pub struct UploadPicker {
    category: MediaCategory,
    label: String,
    store: Arc<dyn PreviewStore>,
    selection: Option<Selection>,
    drag_active: bool,
}

impl UploadPicker {
    pub fn new(
        category: MediaCategory,
        label: impl Into<String>,
        store: Arc<dyn PreviewStore>,
    ) -> Self {
        Self {
            category,
            label: label.into(),
            store,
            selection: None,
            drag_active: false,
        }
    }

    pub fn category(&self) -> MediaCategory {
        self.category
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn file(&self) -> Option<&MediaFile> {
        self.selection.as_ref().map(|s| &s.file)
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.selection.as_ref().map(|s| s.preview.url())
    }

    pub fn is_selected(&self) -> bool {
        self.selection.is_some()
    }

    pub fn is_drag_active(&self) -> bool {
        self.drag_active
    }

    /// Accept a file from the browse dialog.
    ///
    /// The previous preview is revoked before the new one is created.
    pub fn select(&mut self, file: MediaFile) {
        self.selection = None;
        let preview = PreviewHandle::acquire(&self.store, &file);
        tracing::debug!(
            category = ?self.category,
            file = %file.file_name,
            mime = %file.mime_type,
            "File selected"
        );
        self.selection = Some(Selection { file, preview });
    }

    pub fn drag_enter(&mut self) {
        self.drag_active = true;
    }

    pub fn drag_over(&mut self) {
        self.drag_active = true;
    }

    pub fn drag_leave(&mut self) {
        self.drag_active = false;
    }

    /// Handle a drop: take the first file if its MIME type matches.
    pub fn drop_files(&mut self, files: Vec<MediaFile>) -> DropOutcome {
        self.drag_active = false;

        let Some(file) = files.into_iter().next() else {
            return DropOutcome::Ignored;
        };
        if !file.is_category(self.category) {
            tracing::debug!(
                category = ?self.category,
                mime = %file.mime_type,
                "Dropped file ignored"
            );
            return DropOutcome::Ignored;
        }

        self.select(file);
        DropOutcome::Accepted
    }

    /// Empty the slot, revoking its preview.
    pub fn clear(&mut self) {
        self.selection = None;
        self.drag_active = false;
    }

    pub fn view(&self) -> PickerView {
        let label = self.label.clone();
        match (&self.selection, self.category) {
            (None, category) => PickerView::Empty {
                label,
                prompt: if self.drag_active {
                    DROP_PROMPT
                } else {
                    IDLE_PROMPT
                },
                hint: category.format_hint(),
            },
            (Some(selection), MediaCategory::Image) => PickerView::Image {
                label,
                preview_url: selection.preview.url().to_string(),
            },
            (Some(selection), MediaCategory::Audio) => PickerView::Audio {
                label,
                file_name: selection.file.file_name.clone(),
                size: selection.file.size_label(),
                preview_url: selection.preview.url().to_string(),
            },
        }
    }
}

impl std::fmt::Debug for UploadPicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadPicker")
            .field("category", &self.category)
            .field("label", &self.label)
            .field("selection", &self.selection)
            .field("drag_active", &self.drag_active)
            .finish()
    }
}

/// Build a [`MediaFile`] for a path on disk, guessing its MIME type from
/// the extension.
pub async fn inspect_file(path: &Path) -> Result<MediaFile, PickerError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|source| PickerError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    if !metadata.is_file() {
        return Err(PickerError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    Ok(MediaFile::with_guessed_mime(path, metadata.len()))
}
