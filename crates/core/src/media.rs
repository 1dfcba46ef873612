//! Media categories accepted by the two upload slots.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Fallback MIME type when the extension is unknown.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Kind of file an upload slot expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Image,
    Audio,
}

impl MediaCategory {
    /// MIME prefix a dropped file must start with.
    pub fn mime_prefix(self) -> &'static str {
        match self {
            MediaCategory::Image => "image/",
            MediaCategory::Audio => "audio/",
        }
    }

    /// Filter pattern for a browse dialog.
    pub fn accept_pattern(self) -> &'static str {
        match self {
            MediaCategory::Image => "image/*",
            MediaCategory::Audio => "audio/*",
        }
    }

    /// Multipart part name used by `POST /upload`.
    pub fn part_name(self) -> &'static str {
        match self {
            MediaCategory::Image => "image",
            MediaCategory::Audio => "audio",
        }
    }

    /// Short hint about the expected formats.
    pub fn format_hint(self) -> &'static str {
        match self {
            MediaCategory::Image => "JPG or PNG",
            MediaCategory::Audio => "MP3 or WAV",
        }
    }

    pub fn accepts(self, mime_type: &str) -> bool {
        mime_type
            .to_ascii_lowercase()
            .starts_with(self.mime_prefix())
    }
}

/// A file chosen by the user, with the metadata the browser would expose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl MediaFile {
    /// Build a file record with an explicit MIME type.
    pub fn new(path: impl Into<PathBuf>, mime_type: impl Into<String>, size_bytes: u64) -> Self {
        let path = path.into();
        let file_name = file_name_of(&path);
        Self {
            path,
            file_name,
            mime_type: mime_type.into(),
            size_bytes,
        }
    }

    /// Build a file record, guessing the MIME type from the extension.
    pub fn with_guessed_mime(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        let path = path.into();
        let mime_type = guess_mime(&path);
        Self::new(path, mime_type, size_bytes)
    }

    pub fn is_category(&self, category: MediaCategory) -> bool {
        category.accepts(&self.mime_type)
    }

    /// Size in megabytes with two decimals, e.g. `"1.50 MB"`.
    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.size_bytes as f64 / 1024.0 / 1024.0)
    }
}

/// Guess a MIME type from a path's extension.
pub fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
