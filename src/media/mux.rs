use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::deadline;
use crate::error::{AutodubError, Result};
use crate::source::SourceVideo;
use crate::synthesize::Voiceover;

use super::extract::last_lines;
use super::Transcoder;

/// Codecs used when re-encoding a dubbed video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxCodecs {
    pub video: String,
    pub audio: String,
}

impl Default for MuxCodecs {
    fn default() -> Self {
        Self {
            video: "libx264".to_string(),
            audio: "aac".to_string(),
        }
    }
}

/// Archive member name of the dubbed video for `language`.
pub fn dubbed_file_name(language: &str) -> String {
    format!("final_video_{language}.mp4")
}

/// A source video whose audio track was replaced by one language's voiceover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DubbedVideo {
    pub language: String,
    pub path: PathBuf,
}

/// Result of muxing one language. `Skipped` is an expected state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxOutcome {
    Produced(DubbedVideo),
    Skipped { language: String, reason: String },
}

impl MuxOutcome {
    pub fn skipped(language: &str, reason: impl Into<String>) -> Self {
        MuxOutcome::Skipped {
            language: language.to_string(),
            reason: reason.into(),
        }
    }

    pub fn dubbed(&self) -> Option<&DubbedVideo> {
        match self {
            MuxOutcome::Produced(video) => Some(video),
            MuxOutcome::Skipped { .. } => None,
        }
    }

    pub fn is_produced(&self) -> bool {
        self.dubbed().is_some()
    }
}

/// Replace the audio of `video` with `audio`, re-encoding both streams.
pub async fn replace_audio(
    ffmpeg: &str,
    video: &Path,
    audio: &Path,
    output: &Path,
    codecs: &MuxCodecs,
) -> Result<()> {
    debug!(
        "Muxing {} with {} into {}",
        video.display(),
        audio.display(),
        output.display()
    );

    let result = Command::new(ffmpeg)
        .kill_on_drop(true)
        .args(["-y", "-i"])
        .arg(video)
        .arg("-i")
        .arg(audio)
        .args(["-map", "0:v:0", "-map", "1:a:0"])
        .args(["-c:v", &codecs.video, "-c:a", &codecs.audio])
        .args(["-strict", "experimental"])
        .arg(output)
        .output()
        .await
        .map_err(|e| AutodubError::Mux(format!("Failed to run FFmpeg: {e}")))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(AutodubError::Mux(format!(
            "FFmpeg mux failed: {}",
            last_lines(&stderr, 5)
        )));
    }

    if !output.is_file() {
        return Err(AutodubError::Mux("Output file was not created".to_string()));
    }

    Ok(())
}

/// Produce the dubbed video for one language.
///
/// Never fails: every error becomes [`MuxOutcome::Skipped`] so that one
/// language cannot affect the others.
pub async fn dub_video(
    transcoder: &dyn Transcoder,
    video: &SourceVideo,
    voiceover: &Voiceover,
    output_dir: &Path,
    codecs: &MuxCodecs,
    call_timeout: Option<Duration>,
) -> MuxOutcome {
    let language = voiceover.language.as_str();

    if !voiceover.path.is_file() {
        warn!("[{}] Voiceover missing at {}", language, voiceover.path.display());
        return MuxOutcome::skipped(language, "voiceover file is missing");
    }

    let output = output_dir.join(dubbed_file_name(language));
    let operation = format!("Muxing {language}");
    let result = deadline::within(
        call_timeout,
        &operation,
        transcoder.replace_audio(video.path(), &voiceover.path, &output, codecs),
    )
    .await;

    match result {
        Ok(()) => {
            info!("[{}] Dubbed video written to {}", language, output.display());
            MuxOutcome::Produced(DubbedVideo {
                language: language.to_string(),
                path: output,
            })
        }
        Err(e) => {
            warn!("[{}] Skipping dubbed video: {}", language, e);
            MuxOutcome::skipped(language, e.to_string())
        }
    }
}
