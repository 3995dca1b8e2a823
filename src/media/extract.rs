use std::path::Path;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{AutodubError, Result};

use super::AudioMetadata;

/// Sample rate of extracted speech audio.
pub const SPEECH_SAMPLE_RATE: u32 = 16_000;

/// Check that a media tool (`ffmpeg`, `ffprobe`) is installed and runs.
pub async fn check_tool(binary: &str) -> Result<()> {
    let output = Command::new(binary)
        .kill_on_drop(true)
        .arg("-version")
        .output()
        .await
        .map_err(|e| {
            AutodubError::MediaDecode(format!(
                "{binary} not found. Please install FFmpeg and ensure it's in your PATH. Error: {e}"
            ))
        })?;

    if !output.status.success() {
        return Err(AutodubError::MediaDecode(format!("{binary} check failed")));
    }

    debug!("{} is available", binary);
    Ok(())
}

/// Get media duration using FFprobe.
pub async fn probe_duration(ffprobe: &str, input: &Path) -> Result<Duration> {
    let output = Command::new(ffprobe)
        .kill_on_drop(true)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(input)
        .output()
        .await
        .map_err(|e| AutodubError::MediaDecode(format!("Failed to run FFprobe: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AutodubError::MediaDecode(format!(
            "FFprobe failed: {}",
            stderr.trim()
        )));
    }

    let duration_str = String::from_utf8_lossy(&output.stdout);
    let duration_secs: f64 = duration_str.trim().parse().map_err(|e| {
        AutodubError::MediaDecode(format!(
            "Failed to parse duration '{}': {e}",
            duration_str.trim()
        ))
    })?;

    Ok(Duration::from_secs_f64(duration_secs))
}

/// Read the header of a PCM WAV file.
pub fn read_wav_metadata(path: &Path) -> Result<AudioMetadata> {
    let reader = hound::WavReader::open(path).map_err(|e| {
        AutodubError::MediaDecode(format!("{} is not readable PCM audio: {e}", path.display()))
    })?;

    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(AutodubError::MediaDecode(format!(
            "{} reports a zero sample rate",
            path.display()
        )));
    }

    let duration = Duration::from_secs_f64(reader.duration() as f64 / spec.sample_rate as f64);

    Ok(AudioMetadata {
        duration,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

/// Extract the audio track of a video as WAV.
///
/// The output is mono 16-bit PCM at 16kHz, which is what speech recognition
/// expects. An existing file at `output` is overwritten.
pub async fn extract_audio(ffmpeg: &str, input: &Path, output: &Path) -> Result<AudioMetadata> {
    if !input.is_file() {
        return Err(AutodubError::MediaDecode(format!(
            "Video not found: {}",
            input.display()
        )));
    }

    info!("Extracting audio from {}", input.display());

    let sample_rate = SPEECH_SAMPLE_RATE.to_string();
    let result = Command::new(ffmpeg)
        .kill_on_drop(true)
        .args(["-y", "-i"])
        .arg(input)
        .args(["-vn", "-acodec", "pcm_s16le", "-ar", &sample_rate, "-ac", "1"])
        .arg(output)
        .output()
        .await
        .map_err(|e| AutodubError::MediaDecode(format!("Failed to run FFmpeg: {e}")))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(AutodubError::MediaDecode(format!(
            "FFmpeg could not decode {}: {}",
            input.display(),
            last_lines(&stderr, 5)
        )));
    }

    if !output.exists() {
        return Err(AutodubError::MediaDecode(
            "Output file was not created".to_string(),
        ));
    }

    let metadata = read_wav_metadata(output)?;
    info!(
        "Audio extracted to {} ({:.1}s)",
        output.display(),
        metadata.duration.as_secs_f64()
    );

    Ok(metadata)
}

/// FFmpeg prints its banner first; the cause is at the end.
pub(crate) fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.trim().lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}
