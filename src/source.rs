//! Acquiring the source video: uploads, local files and remote URLs.

use crate::deadline;
use crate::error::{AutodubError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// File name used for uploaded bytes (extension appended).
const UPLOAD_STEM: &str = "uploaded_video";

/// File name used for downloaded videos.
pub const DOWNLOAD_FILE_NAME: &str = "downloaded_video.mp4";

/// Where the video for a run comes from.
#[derive(Debug, Clone)]
pub enum VideoSource {
    /// Raw bytes handed over by the presentation layer.
    Upload { file_name: String, bytes: Vec<u8> },
    /// A video already on disk.
    Local(PathBuf),
    /// A remote page or file, resolved by a [`VideoFetcher`].
    Url(String),
}

impl VideoSource {
    /// Interpret user input: `http`/`https` URLs are remote, anything else a path.
    pub fn parse(input: &str) -> Self {
        match url::Url::parse(input) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => VideoSource::Url(url.to_string()),
            _ => VideoSource::Local(PathBuf::from(input)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            VideoSource::Upload { file_name, bytes } => {
                format!("upload {} ({} bytes)", file_name, bytes.len())
            }
            VideoSource::Local(path) => path.display().to_string(),
            VideoSource::Url(url) => url.clone(),
        }
    }
}

/// The video a run works from. Metadata is probed on demand, not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceVideo {
    path: PathBuf,
}

impl SourceVideo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Retrieves remote videos into a local file.
#[async_trait]
pub trait VideoFetcher: Send + Sync {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Downloads videos with the `yt-dlp` command line tool.
pub struct YtDlpFetcher {
    binary: String,
}

impl YtDlpFetcher {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for YtDlpFetcher {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl VideoFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<()> {
        info!("Downloading {} with {}", url, self.binary);

        let output = Command::new(&self.binary)
            .kill_on_drop(true)
            .args([
                "-f",
                "bestvideo+bestaudio/best",
                "--merge-output-format",
                "mp4",
                "--no-playlist",
                "--force-overwrites",
                "-o",
            ])
            .arg(destination)
            .arg(url)
            .output()
            .await
            .map_err(|e| {
                AutodubError::Retrieval(format!("Failed to run {}: {e}", self.binary))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AutodubError::Retrieval(format!(
                "{} failed for {}: {}",
                self.binary,
                url,
                stderr.trim()
            )));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Turn a [`VideoSource`] into a local [`SourceVideo`] inside `work_dir`.
///
/// Downloads run under `call_timeout`; running out of time is a retrieval
/// failure like any other.
pub async fn acquire(
    source: &VideoSource,
    work_dir: &Path,
    fetcher: &dyn VideoFetcher,
    call_timeout: Option<Duration>,
) -> Result<SourceVideo> {
    match source {
        VideoSource::Upload { file_name, bytes } => {
            if bytes.is_empty() {
                return Err(AutodubError::Retrieval(format!(
                    "Uploaded file {} is empty",
                    file_name
                )));
            }
            let extension = Path::new(file_name)
                .extension()
                .and_then(|e| e.to_str())
                .filter(|e| !e.is_empty())
                .unwrap_or("mp4")
                .to_lowercase();
            let path = work_dir.join(format!("{UPLOAD_STEM}.{extension}"));
            tokio::fs::write(&path, bytes).await.map_err(|e| {
                AutodubError::Retrieval(format!("Failed to save upload {}: {e}", file_name))
            })?;
            debug!("Saved {} bytes to {}", bytes.len(), path.display());
            Ok(SourceVideo::new(path))
        }
        VideoSource::Local(path) => {
            if !path.is_file() {
                return Err(AutodubError::Retrieval(format!(
                    "Video file not found: {}",
                    path.display()
                )));
            }
            Ok(SourceVideo::new(path.clone()))
        }
        VideoSource::Url(url) => {
            let destination = work_dir.join(DOWNLOAD_FILE_NAME);
            if destination.exists() {
                tokio::fs::remove_file(&destination).await?;
            }

            let operation = format!("Downloading {url}");
            deadline::within(call_timeout, &operation, fetcher.fetch(url, &destination))
                .await
                .map_err(|e| match e {
                    AutodubError::Timeout { .. } => AutodubError::Retrieval(e.to_string()),
                    other => other,
                })?;

            if !destination.is_file() {
                return Err(AutodubError::Retrieval(format!(
                    "{} reported success but produced no file for {}",
                    fetcher.name(),
                    url
                )));
            }
            info!("Downloaded {} to {}", url, destination.display());
            Ok(SourceVideo::new(destination))
        }
    }
}
