//! Source video download.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use redub_core::DubError;

use crate::command::CommandRunner;

/// Fetches the source video to a local file.
#[async_trait]
pub trait VideoDownloader: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), DubError>;
}

/// yt-dlp subprocess downloader, pinned to the best MP4 format so the mux
/// step can copy the video stream.
pub struct YtDlpDownloader {
    runner: Arc<dyn CommandRunner>,
    ytdlp_path: String,
}

impl YtDlpDownloader {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            ytdlp_path: "yt-dlp".to_string(),
        }
    }

    pub fn with_ytdlp_path(mut self, path: impl Into<String>) -> Self {
        self.ytdlp_path = path.into();
        self
    }
}

#[async_trait]
impl VideoDownloader for YtDlpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), DubError> {
        let args = vec![
            "-f".to_string(),
            "best[ext=mp4]".to_string(),
            "-o".to_string(),
            dest.to_string_lossy().into_owned(),
            url.to_string(),
        ];
        info!(url, dest = %dest.display(), "downloading video");
        let output = self.runner.run(&self.ytdlp_path, &args).await?;
        if !output.success() {
            return Err(DubError::Processing(format!(
                "yt-dlp failed (exit {}): {}",
                output.exit_code,
                output.stderr.trim()
            )));
        }
        Ok(())
    }
}
