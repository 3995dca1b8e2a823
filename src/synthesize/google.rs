//! Google Cloud Text-to-Speech client.

use crate::error::{AutodubError, Result};
use crate::language;
use crate::synthesize::SpeechSynthesizer;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

const TTS_API_BASE: &str = "https://texttospeech.googleapis.com";

/// The API accepts at most 5000 bytes of input per request.
const MAX_INPUT_BYTES: usize = 4500;

pub struct GoogleTtsClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    max_input_bytes: usize,
}

impl GoogleTtsClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: TTS_API_BASE.to_string(),
            max_input_bytes: MAX_INPUT_BYTES,
        }
    }

    /// Point the client at a different API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Lower the per-request input size.
    pub fn with_max_input_bytes(mut self, max_input_bytes: usize) -> Self {
        self.max_input_bytes = max_input_bytes.max(1);
        self
    }

    async fn synthesize_piece(&self, text: &str, locale: &str) -> Result<Vec<u8>> {
        let request = SynthesizeRequest {
            input: SynthesisInput {
                text: text.to_string(),
            },
            voice: VoiceSelection {
                language_code: locale.to_string(),
                ssml_gender: "NEUTRAL",
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        };

        let url = format!("{}/v1/text:synthesize?key={}", self.base_url, self.api_key);
        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AutodubError::Synthesis(format!(
                "Text-to-Speech API error ({}): {}",
                status, body
            )));
        }

        let parsed: SynthesizeResponse = serde_json::from_str(&body)?;
        base64::engine::general_purpose::STANDARD
            .decode(parsed.audio_content)
            .map_err(|e| AutodubError::Synthesis(format!("Invalid audio content: {e}")))
    }
}

/// Split `text` at whitespace into pieces no longer than `max_bytes`.
/// A single word longer than the limit is cut at a character boundary.
fn split_input(text: &str, max_bytes: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = text.trim();

    while rest.len() > max_bytes {
        let mut cut = max_bytes;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            cut = rest.chars().next().map(char::len_utf8).unwrap_or(rest.len());
        }

        let split_at = rest[..cut]
            .rfind(char::is_whitespace)
            .filter(|&i| i > 0)
            .unwrap_or(cut);

        pieces.push(rest[..split_at].trim_end());
        rest = rest[split_at..].trim_start();
    }

    if !rest.is_empty() {
        pieces.push(rest);
    }
    pieces
}

#[async_trait]
impl SpeechSynthesizer for GoogleTtsClient {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        let locale = language::tts_locale(language);
        let pieces = split_input(text, self.max_input_bytes);
        debug!("Synthesizing {} piece(s) in {}", pieces.len(), locale);

        // MP3 frames are self-delimiting, so pieces concatenate into one stream.
        let mut audio = Vec::new();
        for piece in pieces {
            audio.extend(self.synthesize_piece(piece, &locale).await?);
        }
        Ok(audio)
    }

    fn name(&self) -> &'static str {
        "Google Text-to-Speech"
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest {
    input: SynthesisInput,
    voice: VoiceSelection,
    audio_config: AudioConfig,
}

#[derive(Serialize)]
struct SynthesisInput {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection {
    language_code: String,
    ssml_gender: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn encoded(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn test_split_input_short_text() {
        assert_eq!(split_input("  hello world ", 100), vec!["hello world"]);
        assert!(split_input("   ", 100).is_empty());
    }

    #[test]
    fn test_split_input_at_whitespace() {
        assert_eq!(
            split_input("aaa bbb ccc ddd", 8),
            vec!["aaa bbb", "ccc ddd"]
        );
    }

    #[test]
    fn test_split_input_respects_char_boundaries() {
        let text = "नमस्ते दुनिया";
        let pieces = split_input(text, 7);
        assert!(pieces.iter().all(|p| p.len() <= 7));
        assert_eq!(pieces.concat(), text.replace(' ', ""));
    }

    #[tokio::test]
    async fn test_synthesize_decodes_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text:synthesize"))
            .and(query_param("key", "tts-key"))
            .and(body_partial_json(serde_json::json!({
                "voice": { "languageCode": "hi-IN" },
                "audioConfig": { "audioEncoding": "MP3" }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "audioContent": encoded(b"ID3audio") })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = GoogleTtsClient::new("tts-key".to_string()).with_base_url(server.uri());
        let audio = client.synthesize("नमस्ते", "hi").await.unwrap();
        assert_eq!(audio, b"ID3audio");
    }

    #[tokio::test]
    async fn test_long_text_is_split_and_concatenated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text:synthesize"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "audioContent": encoded(b"ab") })),
            )
            .expect(3)
            .mount(&server)
            .await;

        let client = GoogleTtsClient::new("tts-key".to_string())
            .with_base_url(server.uri())
            .with_max_input_bytes(5);
        let audio = client.synthesize("one two six", "te").await.unwrap();
        assert_eq!(audio, b"ababab");
    }

    #[tokio::test]
    async fn test_api_error_is_synthesis_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("unsupported language"))
            .mount(&server)
            .await;

        let client = GoogleTtsClient::new("tts-key".to_string()).with_base_url(server.uri());
        assert!(matches!(
            client.synthesize("hello", "xx").await,
            Err(AutodubError::Synthesis(_))
        ));
    }
}
