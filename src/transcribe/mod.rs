pub mod gemini;
pub mod whisper;

pub use gemini::GeminiClient;
pub use whisper::WhisperClient;

use crate::config::{Config, Provider};
use crate::deadline;
use crate::error::{AutodubError, Result};
use crate::transcribe::whisper::WhisperModel;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Speech recognized in the source video's audio.
///
/// `Unrecognized` stands for "no speech detected" and is a valid, final
/// transcript: every translation of it is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    Recognized(String),
    Unrecognized,
}

impl Transcript {
    /// Normalize recognizer output; blank text counts as unrecognized.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            Transcript::Unrecognized
        } else {
            Transcript::Recognized(text.trim().to_string())
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Transcript::Recognized(text) => text,
            Transcript::Unrecognized => "",
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, Transcript::Recognized(_))
    }
}

/// Speech-to-text service.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Recognize the speech in a PCM audio file.
    async fn transcribe(&self, audio: &Path) -> Result<String>;
    fn name(&self) -> &'static str;
}

/// Transcribe `audio`, degrading any failure to [`Transcript::Unrecognized`].
pub async fn recognize_speech(
    transcriber: &dyn Transcriber,
    audio: &Path,
    call_timeout: Option<Duration>,
) -> Transcript {
    let result = deadline::within(call_timeout, "Transcription", transcriber.transcribe(audio)).await;

    match result {
        Ok(text) => {
            let transcript = Transcript::from_text(text);
            match &transcript {
                Transcript::Recognized(text) => info!(
                    "{} recognized {} characters of speech",
                    transcriber.name(),
                    text.chars().count()
                ),
                Transcript::Unrecognized => warn!("{} detected no speech", transcriber.name()),
            }
            transcript
        }
        Err(e) => {
            warn!(
                "{} failed, continuing with an empty transcript: {}",
                transcriber.name(),
                e
            );
            Transcript::Unrecognized
        }
    }
}

/// Build the transcriber for `provider` from configured keys, source
/// language and model.
pub fn create_transcriber(provider: Provider, config: &Config) -> Result<Box<dyn Transcriber>> {
    match provider {
        Provider::Whisper => {
            let api_key = config.openai_api_key.as_ref().ok_or_else(|| {
                AutodubError::Config(
                    "OpenAI API key not set. Set OPENAI_API_KEY environment variable.".to_string(),
                )
            })?;
            let mut client = WhisperClient::new(api_key.clone());
            if let Some(ref model) = config.transcription_model {
                client = client.with_model(model.parse::<WhisperModel>()?);
            }
            if let Some(ref language) = config.source_language {
                client = client.with_language(language.clone());
            }
            Ok(Box::new(client))
        }
        Provider::Gemini => {
            let api_key = config.gemini_api_key.as_ref().ok_or_else(|| {
                AutodubError::Config(
                    "Gemini API key not set. Set GEMINI_API_KEY environment variable.".to_string(),
                )
            })?;
            let mut client = GeminiClient::new(api_key.clone());
            if let Some(ref model) = config.transcription_model {
                client = client.with_model(model.clone());
            }
            if let Some(ref language) = config.source_language {
                client = client.with_language(language.clone());
            }
            Ok(Box::new(client))
        }
    }
}
