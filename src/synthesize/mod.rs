pub mod google;

pub use google::GoogleTtsClient;

use crate::deadline;
use crate::error::{AutodubError, Result};
use crate::translate::Translation;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Text-to-speech service producing MP3 audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>>;
    fn name(&self) -> &'static str;
}

/// Spoken rendering of one language's translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voiceover {
    pub language: String,
    pub path: PathBuf,
}

/// File name of the voiceover for `language`.
pub fn voiceover_file_name(language: &str) -> String {
    format!("voiceover_{language}.mp3")
}

/// Synthesize `translation` and write it to `work_dir`.
pub async fn render_voiceover(
    synthesizer: &dyn SpeechSynthesizer,
    translation: &Translation,
    work_dir: &Path,
    call_timeout: Option<Duration>,
) -> Result<Voiceover> {
    let language = translation.language.as_str();

    if translation.text.trim().is_empty() {
        return Err(AutodubError::Synthesis(format!(
            "No text to speak for {language}"
        )));
    }

    debug!(
        "[{}] Synthesizing {} chars with {}",
        language,
        translation.text.chars().count(),
        synthesizer.name()
    );

    let operation = format!("Speech synthesis for {language}");
    let audio = deadline::within(
        call_timeout,
        &operation,
        synthesizer.synthesize(&translation.text, language),
    )
    .await?;

    if audio.is_empty() {
        return Err(AutodubError::Synthesis(format!(
            "{} returned no audio for {language}",
            synthesizer.name()
        )));
    }

    let path = work_dir.join(voiceover_file_name(language));
    tokio::fs::write(&path, &audio).await?;
    info!("[{}] Voiceover written to {} ({} bytes)", language, path.display(), audio.len());

    Ok(Voiceover {
        language: language.to_string(),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct ToneSynthesizer {
        audio: Vec<u8>,
    }

    #[async_trait]
    impl SpeechSynthesizer for ToneSynthesizer {
        async fn synthesize(&self, _text: &str, _language: &str) -> Result<Vec<u8>> {
            Ok(self.audio.clone())
        }

        fn name(&self) -> &'static str {
            "Tone"
        }
    }

    fn translation(language: &str, text: &str) -> Translation {
        Translation {
            language: language.to_string(),
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_render_voiceover_writes_named_file() {
        let dir = TempDir::new().unwrap();
        let synthesizer = ToneSynthesizer {
            audio: vec![0xFF, 0xFB, 0x90],
        };

        let voiceover = render_voiceover(&synthesizer, &translation("pa", "ਸਤ ਸ੍ਰੀ ਅਕਾਲ"), dir.path(), None)
            .await
            .unwrap();

        assert_eq!(voiceover.language, "pa");
        assert_eq!(voiceover.path, dir.path().join("voiceover_pa.mp3"));
        assert_eq!(std::fs::read(&voiceover.path).unwrap(), vec![0xFF, 0xFB, 0x90]);
    }

    #[tokio::test]
    async fn test_empty_translation_is_rejected() {
        let dir = TempDir::new().unwrap();
        let synthesizer = ToneSynthesizer { audio: vec![1] };

        let result = render_voiceover(&synthesizer, &translation("hi", "  "), dir.path(), None).await;
        assert!(matches!(result, Err(AutodubError::Synthesis(_))));
        assert!(!dir.path().join("voiceover_hi.mp3").exists());
    }

    #[tokio::test]
    async fn test_empty_audio_is_rejected() {
        let dir = TempDir::new().unwrap();
        let synthesizer = ToneSynthesizer { audio: Vec::new() };

        let result = render_voiceover(&synthesizer, &translation("hi", "text"), dir.path(), None).await;
        assert!(matches!(result, Err(AutodubError::Synthesis(_))));
    }
}
