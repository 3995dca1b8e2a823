use crate::error::{AutodubError, Result};
use crate::transcribe::Transcriber;
use async_trait::async_trait;
use base64::Engine;
use regex::Regex;
use std::sync::LazyLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Gemini API host.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Threshold for using Files API vs inline data (20 MB).
const INLINE_SIZE_THRESHOLD: usize = 20 * 1024 * 1024;

/// Maximum file size we'll handle.
const MAX_FILE_SIZE: usize = 200 * 1024 * 1024;

/// Google Gemini speech-to-text client.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    language: Option<String>,
}

impl GeminiClient {
    /// Create a new Gemini client with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: GEMINI_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            language: None,
        }
    }

    /// Point the client at a different API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set a different model (e.g., "gemini-1.5-pro").
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the spoken language of the audio.
    pub fn with_language(mut self, language: String) -> Self {
        self.language = Some(language);
        self
    }

    fn build_prompt(&self) -> String {
        let mut prompt = String::from(
            "Transcribe the speech in this audio verbatim as plain running text.\n\
             Do not add timestamps, speaker labels or commentary.\n\
             If there is no intelligible speech, return an empty response.\n",
        );

        if let Some(ref lang) = self.language {
            prompt.push_str(&format!("The audio is in {} language.\n", lang));
        }

        prompt
    }

    /// Transcribe using inline audio data (for files < 20MB).
    async fn transcribe_inline(&self, audio: &Path) -> Result<String> {
        let audio_bytes = fs::read(audio).await?;
        let base64_audio = base64::engine::general_purpose::STANDARD.encode(&audio_bytes);

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: self.build_prompt(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "audio/wav".to_string(),
                            data: base64_audio,
                        },
                    },
                ],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(0.0),
            }),
        };

        self.call_generate_content(request).await
    }

    /// Upload a file using the Files API (for files >= 20MB).
    async fn upload_file(&self, path: &Path) -> Result<String> {
        let file_bytes = fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav");

        let url = format!("{}/upload/v1beta/files?key={}", self.base_url, self.api_key);

        let response = self
            .client
            .post(&url)
            .header("X-Goog-Upload-Protocol", "raw")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header("Content-Type", "audio/wav")
            .header("X-Goog-Upload-File-Name", file_name)
            .body(file_bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AutodubError::Api(format!(
                "Gemini file upload failed: {}",
                error_text
            )));
        }

        let upload_response: FileUploadResponse = response.json().await?;
        Ok(upload_response.file.uri)
    }

    /// Transcribe using uploaded file reference.
    async fn transcribe_file(&self, file_uri: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: self.build_prompt(),
                    },
                    Part::FileData {
                        file_data: FileData {
                            mime_type: "audio/wav".to_string(),
                            file_uri: file_uri.to_string(),
                        },
                    },
                ],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(0.0),
            }),
        };

        self.call_generate_content(request).await
    }

    async fn call_generate_content(&self, request: GenerateContentRequest) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        debug!("Gemini API response status: {}", status);

        let body = response.text().await?;
        if !status.is_success() {
            return Err(AutodubError::Api(format!(
                "Gemini API error ({}): {}",
                status, body
            )));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| match p {
                ResponsePart::Text { text } => text.as_str(),
            })
            .unwrap_or("");

        Ok(clean_transcript(text))
    }
}

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\d{1,2}:\d{2}(?::\d{2})?\]\s*").expect("Invalid regex")
});

/// Strip `[MM:SS]` markers the model sometimes adds anyway and fold lines
/// into one running text.
fn clean_transcript(text: &str) -> String {
    let stripped = TIMESTAMP_RE.replace_all(text, "");

    stripped
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl Transcriber for GeminiClient {
    async fn transcribe(&self, audio: &Path) -> Result<String> {
        debug!("Transcribing {:?} with Gemini", audio);

        let metadata = fs::metadata(audio).await?;
        let file_size = metadata.len() as usize;

        if file_size > MAX_FILE_SIZE {
            return Err(AutodubError::Transcription(format!(
                "File too large: {} bytes (max {} bytes)",
                file_size, MAX_FILE_SIZE
            )));
        }

        if file_size < INLINE_SIZE_THRESHOLD {
            debug!("Using inline audio data ({} bytes)", file_size);
            self.transcribe_inline(audio).await
        } else {
            debug!("Uploading file to Files API ({} bytes)", file_size);
            let file_uri = self.upload_file(audio).await?;
            debug!("File uploaded: {}", file_uri);
            self.transcribe_file(&file_uri).await
        }
    }

    fn name(&self) -> &'static str {
        "Google Gemini"
    }
}

// Request/Response types

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
    FileData { file_data: FileData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResponsePart {
    Text { text: String },
}

#[derive(Deserialize)]
struct FileUploadResponse {
    file: UploadedFile,
}

#[derive(Deserialize)]
struct UploadedFile {
    uri: String,
}
