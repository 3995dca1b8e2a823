pub mod extract;
pub mod mux;
pub mod split;

pub use extract::{check_tool, extract_audio, probe_duration, read_wav_metadata};
pub use mux::{dub_video, dubbed_file_name, replace_audio, DubbedVideo, MuxCodecs, MuxOutcome};
pub use split::split_wav;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Metadata about an extracted audio file.
#[derive(Debug, Clone)]
pub struct AudioMetadata {
    pub duration: Duration,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Transcoding and muxing engine.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Decode the audio of `video` into PCM WAV at `output`.
    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<AudioMetadata>;

    /// Write `video`'s picture with `audio` as its only soundtrack to `output`.
    async fn replace_audio(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        codecs: &MuxCodecs,
    ) -> Result<()>;

    async fn probe_duration(&self, media: &Path) -> Result<Duration>;
}

/// [`Transcoder`] backed by the `ffmpeg` and `ffprobe` binaries.
pub struct FfmpegTranscoder {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Fail early when either binary is missing.
    pub async fn check_available(&self) -> Result<()> {
        check_tool(&self.ffmpeg).await?;
        check_tool(&self.ffprobe).await
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<AudioMetadata> {
        extract::extract_audio(&self.ffmpeg, video, output).await
    }

    async fn replace_audio(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
        codecs: &MuxCodecs,
    ) -> Result<()> {
        mux::replace_audio(&self.ffmpeg, video, audio, output, codecs).await
    }

    async fn probe_duration(&self, media: &Path) -> Result<Duration> {
        extract::probe_duration(&self.ffprobe, media).await
    }
}
