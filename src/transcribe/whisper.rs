use crate::error::{AutodubError, Result};
use crate::media::split_wav;
use crate::transcribe::Transcriber;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tracing::{debug, info};

/// OpenAI API base URL.
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Maximum file size for Whisper API (25 MB).
const MAX_FILE_SIZE: u64 = 25 * 1024 * 1024;

/// Whisper model variants.
#[derive(Debug, Clone, Copy, Default)]
pub enum WhisperModel {
    #[default]
    Whisper1,
    Gpt4oTranscribe,
    Gpt4oMiniTranscribe,
}

impl WhisperModel {
    fn as_str(&self) -> &'static str {
        match self {
            WhisperModel::Whisper1 => "whisper-1",
            WhisperModel::Gpt4oTranscribe => "gpt-4o-transcribe",
            WhisperModel::Gpt4oMiniTranscribe => "gpt-4o-mini-transcribe",
        }
    }
}

impl FromStr for WhisperModel {
    type Err = AutodubError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "whisper-1" => Ok(WhisperModel::Whisper1),
            "gpt-4o-transcribe" => Ok(WhisperModel::Gpt4oTranscribe),
            "gpt-4o-mini-transcribe" => Ok(WhisperModel::Gpt4oMiniTranscribe),
            other => Err(AutodubError::Config(format!(
                "Unknown Whisper model '{other}'. Use whisper-1, gpt-4o-transcribe or gpt-4o-mini-transcribe"
            ))),
        }
    }
}

/// OpenAI Whisper API client.
pub struct WhisperClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: WhisperModel,
    language: Option<String>,
    max_file_size: u64,
}

impl WhisperClient {
    /// Create a new Whisper client with the given API key.
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: OPENAI_API_BASE.to_string(),
            model: WhisperModel::default(),
            language: None,
            max_file_size: MAX_FILE_SIZE,
        }
    }

    /// Point the client at a different API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: WhisperModel) -> Self {
        self.model = model;
        self
    }

    /// Set the spoken language (ISO 639-1 code) instead of auto-detection.
    pub fn with_language(mut self, language: String) -> Self {
        self.language = Some(language);
        self
    }

    /// Upload limit; larger audio is sent in consecutive pieces.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    async fn build_form(&self, audio_path: &Path) -> Result<Form> {
        let file_bytes = fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let file_part = Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str("audio/wav")?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", self.model.as_str())
            .text("response_format", "json");

        if let Some(ref lang) = self.language {
            form = form.text("language", lang.clone());
        }

        Ok(form)
    }

    async fn call_api(&self, form: Form) -> Result<WhisperResponse> {
        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        debug!("Whisper API response status: {}", status);

        if status.is_success() {
            let body = response.text().await?;
            let parsed: WhisperResponse = serde_json::from_str(&body)?;
            return Ok(parsed);
        }

        let error_body = response.text().await.unwrap_or_default();

        if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
            return Err(AutodubError::Api(format!(
                "Whisper API error: {} ({})",
                api_error.error.message, api_error.error.r#type
            )));
        }

        Err(AutodubError::Api(format!(
            "Whisper API error ({}): {}",
            status, error_body
        )))
    }

    async fn transcribe_file(&self, audio: &Path) -> Result<String> {
        let form = self.build_form(audio).await?;
        let response = self.call_api(form).await?;
        Ok(response.text.trim().to_string())
    }

    /// Transcribe audio over the upload limit piece by piece, in order.
    async fn transcribe_in_pieces(&self, audio: &Path) -> Result<String> {
        let parent = audio
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();
        let pieces_dir = tempfile::Builder::new()
            .prefix("whisper-pieces-")
            .tempdir_in(&parent)?;

        let input = audio.to_path_buf();
        let output_dir = pieces_dir.path().to_path_buf();
        let max_bytes = self.max_file_size;
        let pieces: Vec<PathBuf> =
            tokio::task::spawn_blocking(move || split_wav(&input, max_bytes, &output_dir))
                .await
                .map_err(|e| AutodubError::Transcription(format!("Splitting task failed: {e}")))??;

        info!("Audio exceeds upload limit; sending {} pieces", pieces.len());

        let total = pieces.len();
        let mut texts = Vec::with_capacity(total);
        for (index, piece) in pieces.iter().enumerate() {
            let text = self.transcribe_file(piece).await.map_err(|e| {
                AutodubError::Transcription(format!("Piece {}/{} failed: {}", index + 1, total, e))
            })?;
            if !text.is_empty() {
                texts.push(text);
            }
        }

        Ok(texts.join(" "))
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, audio: &Path) -> Result<String> {
        debug!("Transcribing {:?} with Whisper", audio);

        let metadata = fs::metadata(audio).await?;
        if metadata.len() > self.max_file_size {
            debug!(
                "{} bytes exceeds the {} byte upload limit",
                metadata.len(),
                self.max_file_size
            );
            return self.transcribe_in_pieces(audio).await;
        }

        self.transcribe_file(audio).await
    }

    fn name(&self) -> &'static str {
        "OpenAI Whisper"
    }
}

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    r#type: String,
}
