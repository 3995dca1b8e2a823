use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavWriter};
use tracing::debug;

use crate::error::{AutodubError, Result};

/// Bytes reserved per piece for the RIFF header.
const HEADER_ALLOWANCE: u64 = 1024;

/// Frame ranges `[start, end)` covering `total_frames` in steps of `frames_per_piece`.
fn plan_pieces(total_frames: u64, frames_per_piece: u64) -> Vec<(u64, u64)> {
    let mut pieces = Vec::new();
    let mut current = 0;

    while current < total_frames {
        let end = (current + frames_per_piece).min(total_frames);
        pieces.push((current, end));
        current = end;
    }

    pieces
}

fn decode_error(path: &Path, e: hound::Error) -> AutodubError {
    AutodubError::MediaDecode(format!("{}: {e}", path.display()))
}

/// Cut a 16-bit PCM WAV into consecutive pieces of at most `max_bytes` each.
///
/// Pieces are written to `output_dir` as `piece_0000.wav`, `piece_0001.wav`
/// and so on, and returned in playback order.
pub fn split_wav(input: &Path, max_bytes: u64, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut reader = WavReader::open(input).map_err(|e| decode_error(input, e))?;
    let spec = reader.spec();

    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(AutodubError::MediaDecode(format!(
            "{} is not 16-bit PCM audio",
            input.display()
        )));
    }

    let frame_bytes = spec.channels as u64 * 2;
    let frames_per_piece = max_bytes.saturating_sub(HEADER_ALLOWANCE) / frame_bytes.max(1);
    if frames_per_piece == 0 {
        return Err(AutodubError::MediaDecode(format!(
            "Piece size of {max_bytes} bytes cannot hold any audio"
        )));
    }

    let pieces = plan_pieces(reader.duration() as u64, frames_per_piece);
    debug!(
        "Splitting {} into {} pieces of up to {} frames",
        input.display(),
        pieces.len(),
        frames_per_piece
    );

    let mut samples = reader.samples::<i16>();
    let mut paths = Vec::with_capacity(pieces.len());

    for (index, (start, end)) in pieces.into_iter().enumerate() {
        let path = output_dir.join(format!("piece_{index:04}.wav"));
        let mut writer = WavWriter::create(&path, spec).map_err(|e| decode_error(&path, e))?;

        for _ in 0..(end - start) * spec.channels as u64 {
            let sample = samples
                .next()
                .ok_or_else(|| {
                    AutodubError::MediaDecode(format!("{} ended early", input.display()))
                })?
                .map_err(|e| decode_error(input, e))?;
            writer
                .write_sample(sample)
                .map_err(|e| decode_error(&path, e))?;
        }

        writer.finalize().map_err(|e| decode_error(&path, e))?;
        paths.push(path);
    }

    Ok(paths)
}
