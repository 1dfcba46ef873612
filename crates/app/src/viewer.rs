//! Presentation of a finished video.

use std::path::{Path, PathBuf};

use syncavatar_client::api::{ClientError, SyncAvatarApi};

/// File name used when saving the result.
pub const DEFAULT_DOWNLOAD_NAME: &str = "avatar.mp4";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultViewer {
    url: String,
}

impl ResultViewer {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// URL handed to the player, unchanged.
    pub fn playback_url(&self) -> &str {
        &self.url
    }

    pub fn render(&self) -> Vec<String> {
        vec![
            "Your animated avatar is ready.".to_string(),
            format!("Preview:      {}", self.url),
            format!("Download MP4: {} ({DEFAULT_DOWNLOAD_NAME})", self.url),
        ]
    }

    /// Save the video as `dest_dir/avatar.mp4`, creating `dest_dir` if needed.
    pub async fn download(&self, api: &SyncAvatarApi, dest_dir: &Path) -> Result<PathBuf, ClientError> {
        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|source| ClientError::WriteFile {
                path: dest_dir.to_path_buf(),
                source,
            })?;

        let dest = dest_dir.join(DEFAULT_DOWNLOAD_NAME);
        api.download(&self.url, &dest).await?;
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_url_is_passthrough() {
        let viewer = ResultViewer::new("/results/abc.mp4");
        assert_eq!(viewer.playback_url(), "/results/abc.mp4");

        let lines = viewer.render();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with("/results/abc.mp4"));
        assert!(lines[2].contains("avatar.mp4"));
    }
}
