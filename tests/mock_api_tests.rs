//! Mock API tests for the speech, translation and synthesis clients
//!
//! The real HTTP clients talk to a local wiremock server; only FFmpeg and
//! yt-dlp are replaced with in-process fakes.

use async_trait::async_trait;
use autodub::error::{AutodubError, Result};
use autodub::media::{AudioMetadata, MuxCodecs, Transcoder};
use autodub::pipeline::{Collaborators, DubbingOrchestrator, PipelineConfig};
use autodub::source::{VideoFetcher, VideoSource};
use autodub::synthesize::{GoogleTtsClient, SpeechSynthesizer};
use autodub::transcribe::{GeminiClient, Transcriber, WhisperClient};
use autodub::translate::{GeminiTranslator, Translator};
use base64::Engine;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct NoFetcher;

#[async_trait]
impl VideoFetcher for NoFetcher {
    async fn fetch(&self, url: &str, _destination: &Path) -> Result<()> {
        Err(AutodubError::Retrieval(format!("offline: {url}")))
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}

struct CopyTranscoder;

#[async_trait]
impl Transcoder for CopyTranscoder {
    async fn extract_audio(&self, _video: &Path, output: &Path) -> Result<AudioMetadata> {
        tokio::fs::write(output, b"RIFF....WAVEfmt ").await?;
        Ok(AudioMetadata {
            duration: Duration::from_secs(3),
            sample_rate: 16_000,
            channels: 1,
        })
    }

    async fn replace_audio(
        &self,
        _video: &Path,
        audio: &Path,
        output: &Path,
        _codecs: &MuxCodecs,
    ) -> Result<()> {
        tokio::fs::copy(audio, output).await?;
        Ok(())
    }

    async fn probe_duration(&self, _media: &Path) -> Result<Duration> {
        Ok(Duration::from_secs(3))
    }
}

fn gemini_text(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    })
}

fn tts_audio(bytes: &[u8]) -> serde_json::Value {
    serde_json::json!({
        "audioContent": base64::engine::general_purpose::STANDARD.encode(bytes)
    })
}

// ============================================================================
// Client smoke tests
// ============================================================================

mod client_tests {
    use super::*;

    #[tokio::test]
    async fn test_client_names() {
        assert_eq!(WhisperClient::new("k".to_string()).name(), "OpenAI Whisper");
        assert_eq!(GeminiClient::new("k".to_string()).name(), "Google Gemini");
        assert_eq!(GeminiTranslator::new("k".to_string()).name(), "gemini");
        assert_eq!(
            GoogleTtsClient::new("k".to_string()).name(),
            "Google Text-to-Speech"
        );
    }

    #[tokio::test]
    async fn test_whisper_handles_missing_file() {
        let client = WhisperClient::new("test-api-key".to_string());
        let result = client
            .transcribe(Path::new("/tmp/nonexistent_autodub_test.wav"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_gemini_handles_missing_file() {
        let client = GeminiClient::new("test-api-key".to_string());
        let result = client
            .transcribe(Path::new("/tmp/nonexistent_autodub_test.wav"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_translator_uses_language_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
            .and(body_string_contains("Translate the following text to Kannada."))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text("ನಮಸ್ಕಾರ")))
            .expect(1)
            .mount(&server)
            .await;

        let translator = GeminiTranslator::new("k".to_string()).with_base_url(server.uri());
        assert_eq!(translator.translate("Hello", "kn").await.unwrap(), "ನಮಸ್ಕಾರ");
    }
}

// ============================================================================
// End-to-end over HTTP
// ============================================================================

mod pipeline_over_http_tests {
    use super::*;

    struct Services {
        whisper: MockServer,
        gemini: MockServer,
        tts: MockServer,
    }

    impl Services {
        async fn start() -> Self {
            Self {
                whisper: MockServer::start().await,
                gemini: MockServer::start().await,
                tts: MockServer::start().await,
            }
        }

        fn collaborators(&self) -> Collaborators {
            Collaborators {
                fetcher: Arc::new(NoFetcher),
                transcoder: Arc::new(CopyTranscoder),
                transcriber: Arc::new(
                    WhisperClient::new("sk-test".to_string()).with_base_url(self.whisper.uri()),
                ),
                translator: Arc::new(
                    GeminiTranslator::new("gm-test".to_string()).with_base_url(self.gemini.uri()),
                ),
                synthesizer: Arc::new(
                    GoogleTtsClient::new("tts-test".to_string()).with_base_url(self.tts.uri()),
                ),
            }
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            show_progress: false,
            call_timeout: Some(Duration::from_secs(10)),
            ..PipelineConfig::default()
        }
    }

    fn video(dir: &TempDir) -> VideoSource {
        let path = dir.path().join("lecture.mp4");
        std::fs::write(&path, b"video").unwrap();
        VideoSource::Local(path)
    }

    #[tokio::test]
    async fn test_dub_two_languages() {
        let services = Services::start().await;

        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "text": "Good morning." })),
            )
            .expect(1)
            .mount(&services.whisper)
            .await;

        Mock::given(method("POST"))
            .and(body_string_contains("to Hindi."))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text("सुप्रभात।")))
            .expect(1)
            .mount(&services.gemini)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("to Bengali."))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text("সুপ্রভাত।")))
            .expect(1)
            .mount(&services.gemini)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/text:synthesize"))
            .and(query_param("key", "tts-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tts_audio(b"ID3voice")))
            .expect(2)
            .mount(&services.tts)
            .await;

        let dir = TempDir::new().unwrap();
        let output = dir.path().join("translated_outputs.zip");
        let result = DubbingOrchestrator::new(services.collaborators(), config())
            .run(
                &video(&dir),
                &["hi".to_string(), "bn".to_string()],
                &output,
            )
            .await
            .unwrap();

        assert_eq!(result.transcript.text(), "Good morning.");
        assert_eq!(result.dubbed_languages(), vec!["hi", "bn"]);
        assert_eq!(
            result.languages[0].translation.as_ref().unwrap().text,
            "सुप्रभात।"
        );
        assert_eq!(
            result.archive.members,
            vec!["final_video_hi.mp4", "final_video_bn.mp4", "translations.docx"]
        );
    }

    #[tokio::test]
    async fn test_speech_service_outage_degrades_to_document_only() {
        let services = Services::start().await;

        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&services.whisper)
            .await;
        // Nothing may reach translation or synthesis.
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&services.gemini)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&services.tts)
            .await;

        let dir = TempDir::new().unwrap();
        let output = dir.path().join("translated_outputs.zip");
        let result = DubbingOrchestrator::new(services.collaborators(), config())
            .run(&video(&dir), &["te".to_string()], &output)
            .await
            .unwrap();

        assert!(!result.transcript.is_recognized());
        assert!(result.dubbed_languages().is_empty());
        assert_eq!(result.archive.members, vec!["translations.docx"]);
    }

    #[tokio::test]
    async fn test_tts_failure_keeps_translation() {
        let services = Services::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "text": "Thanks." })),
            )
            .mount(&services.whisper)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text("ধন্যবাদ।")))
            .mount(&services.gemini)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("voice not found"))
            .mount(&services.tts)
            .await;

        let dir = TempDir::new().unwrap();
        let output = dir.path().join("translated_outputs.zip");
        let result = DubbingOrchestrator::new(services.collaborators(), config())
            .run(&video(&dir), &["bn".to_string()], &output)
            .await
            .unwrap();

        assert_eq!(result.translated_languages(), vec!["bn"]);
        assert!(result.dubbed_languages().is_empty());
        assert_eq!(result.archive.members, vec!["translations.docx"]);
    }
}
