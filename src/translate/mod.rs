pub mod chunk;
pub mod gemini;

pub use chunk::{join_chunks, split_sentences, TranscriptChunker, DEFAULT_CHUNK_SIZE};
pub use gemini::GeminiTranslator;

use crate::deadline;
use crate::error::{AutodubError, Result};
use crate::transcribe::Transcript;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Machine-translation service.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}

/// A transcript rendered in one target language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub language: String,
    pub text: String,
}

/// Translate a whole transcript into `language`, one chunk per request.
///
/// An unrecognized transcript yields an empty translation without calling
/// the service. Any chunk failure fails the whole translation.
pub async fn translate_transcript(
    translator: &dyn Translator,
    transcript: &Transcript,
    language: &str,
    chunker: &TranscriptChunker,
    call_timeout: Option<Duration>,
) -> Result<Translation> {
    let text = match transcript {
        Transcript::Recognized(text) => text,
        Transcript::Unrecognized => {
            debug!("[{}] Empty transcript, nothing to translate", language);
            return Ok(Translation {
                language: language.to_string(),
                text: String::new(),
            });
        }
    };

    let chunks = chunker.chunks(text);
    let total = chunks.len();
    let mut translated = Vec::with_capacity(total);

    for (index, chunk) in chunks.iter().enumerate() {
        debug!(
            "[{}] Translating chunk {}/{} ({} chars) with {}",
            language,
            index + 1,
            total,
            chunk.chars().count(),
            translator.name()
        );

        let operation = format!("Translation chunk {}/{} to {}", index + 1, total, language);
        let result = deadline::within(
            call_timeout,
            &operation,
            translator.translate(chunk, language),
        )
        .await
        .map_err(|e| AutodubError::Translation(format!("{operation}: {e}")))?;

        translated.push(result);
    }

    Ok(Translation {
        language: language.to_string(),
        text: join_chunks(&translated),
    })
}
