use crate::error::{AutodubError, Result};
use crate::transcribe::whisper::WhisperModel;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Speech-to-text backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Whisper,
    Gemini,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Whisper => write!(f, "whisper"),
            Provider::Gemini => write!(f, "gemini"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "whisper" => Ok(Provider::Whisper),
            "gemini" => Ok(Provider::Gemini),
            _ => Err(format!("Unknown provider: {}. Use 'whisper' or 'gemini'", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    /// Google Cloud Text-to-Speech key. Falls back to the Gemini key when unset.
    pub google_tts_api_key: Option<String>,
    pub default_provider: Provider,
    /// Spoken language of source videos (ISO 639-1). Auto-detected when unset.
    pub source_language: Option<String>,
    /// Speech-to-text model name. Each provider's own default when unset.
    pub transcription_model: Option<String>,
    /// Number of language chains run at the same time.
    pub concurrency: usize,
    /// Sentence units per translation request.
    pub chunk_size: usize,
    /// Deadline for each external service call, in seconds. Zero disables it.
    pub call_timeout_secs: u64,
    pub yt_dlp_path: String,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            gemini_api_key: None,
            google_tts_api_key: None,
            default_provider: Provider::default(),
            source_language: None,
            transcription_model: None,
            concurrency: 4,
            chunk_size: 200,
            call_timeout_secs: 300,
            yt_dlp_path: "yt-dlp".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                match toml::from_str::<Config>(&contents) {
                    Ok(file_config) => config = file_config,
                    Err(e) => tracing::warn!(
                        "Ignoring malformed config file {}: {}",
                        config_path.display(),
                        e
                    ),
                }
            }
        }

        // Override with environment variables
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.openai_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            config.gemini_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("GOOGLE_TTS_API_KEY") {
            config.google_tts_api_key = Some(key);
        }
        if let Ok(provider) = std::env::var("AUTODUB_DEFAULT_PROVIDER") {
            if let Ok(p) = provider.parse() {
                config.default_provider = p;
            }
        }
        if let Ok(language) = std::env::var("AUTODUB_SOURCE_LANGUAGE") {
            config.source_language = Some(language);
        }
        if let Ok(model) = std::env::var("AUTODUB_TRANSCRIPTION_MODEL") {
            config.transcription_model = Some(model);
        }
        if let Ok(concurrency) = std::env::var("AUTODUB_CONCURRENCY") {
            if let Ok(c) = concurrency.parse() {
                config.concurrency = c;
            }
        }
        if let Ok(chunk_size) = std::env::var("AUTODUB_CHUNK_SIZE") {
            if let Ok(c) = chunk_size.parse() {
                config.chunk_size = c;
            }
        }
        if let Ok(timeout) = std::env::var("AUTODUB_CALL_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                config.call_timeout_secs = t;
            }
        }

        Ok(config)
    }

    pub fn validate(&self, provider: Provider) -> Result<()> {
        match provider {
            Provider::Whisper => {
                if self.openai_api_key.is_none() {
                    return Err(AutodubError::Config(
                        "OPENAI_API_KEY not set. Export it with: export OPENAI_API_KEY=sk-..."
                            .to_string(),
                    ));
                }
                if let Some(ref model) = self.transcription_model {
                    model.parse::<WhisperModel>()?;
                }
            }
            Provider::Gemini => {}
        }

        if self.gemini_api_key.is_none() {
            return Err(AutodubError::Config(
                "GEMINI_API_KEY not set. Get one at https://aistudio.google.com/apikey"
                    .to_string(),
            ));
        }

        if self.tts_api_key().is_none() {
            return Err(AutodubError::Config(
                "GOOGLE_TTS_API_KEY not set and no Gemini key to fall back on".to_string(),
            ));
        }

        if self.concurrency == 0 {
            return Err(AutodubError::Config(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        if self.chunk_size == 0 {
            return Err(AutodubError::Config(
                "Chunk size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Key used for speech synthesis.
    pub fn tts_api_key(&self) -> Option<&str> {
        self.google_tts_api_key
            .as_deref()
            .or(self.gemini_api_key.as_deref())
    }

    /// Per-call deadline, `None` when disabled.
    pub fn call_timeout(&self) -> Option<Duration> {
        (self.call_timeout_secs > 0).then(|| Duration::from_secs(self.call_timeout_secs))
    }

    pub fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("autodub").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        Config {
            openai_api_key: Some("sk-test".to_string()),
            gemini_api_key: Some("gemini-test".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("whisper".parse::<Provider>().unwrap(), Provider::Whisper);
        assert_eq!("gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!("WHISPER".parse::<Provider>().unwrap(), Provider::Whisper);
        assert!("unknown".parse::<Provider>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_provider, Provider::Whisper);
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.chunk_size, 200);
        assert_eq!(config.call_timeout(), Some(Duration::from_secs(300)));
        assert_eq!(config.yt_dlp_path, "yt-dlp");
    }

    #[test]
    fn test_validate_missing_api_key() {
        let config = Config::default();
        assert!(config.validate(Provider::Whisper).is_err());
        assert!(config.validate(Provider::Gemini).is_err());
    }

    #[test]
    fn test_validate_with_api_keys() {
        let config = configured();
        assert!(config.validate(Provider::Whisper).is_ok());
        assert!(config.validate(Provider::Gemini).is_ok());
    }

    #[test]
    fn test_gemini_provider_needs_no_openai_key() {
        let mut config = configured();
        config.openai_api_key = None;
        assert!(config.validate(Provider::Gemini).is_ok());
        assert!(config.validate(Provider::Whisper).is_err());
    }

    #[test]
    fn test_tts_key_falls_back_to_gemini() {
        let mut config = configured();
        assert_eq!(config.tts_api_key(), Some("gemini-test"));

        config.google_tts_api_key = Some("tts-test".to_string());
        assert_eq!(config.tts_api_key(), Some("tts-test"));
    }

    #[test]
    fn test_validate_rejects_zero_bounds() {
        let mut config = configured();
        config.concurrency = 0;
        assert!(config.validate(Provider::Whisper).is_err());

        let mut config = configured();
        config.chunk_size = 0;
        assert!(config.validate(Provider::Whisper).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_whisper_model() {
        let mut config = configured();
        config.transcription_model = Some("whisper-large".to_string());
        assert!(matches!(
            config.validate(Provider::Whisper),
            Err(AutodubError::Config(_))
        ));
        // Gemini model names are passed through untouched.
        config.transcription_model = Some("gemini-1.5-pro".to_string());
        assert!(config.validate(Provider::Gemini).is_ok());
    }

    #[test]
    fn test_source_language_from_toml() {
        let config: Config =
            toml::from_str("source_language = \"en\"\ntranscription_model = \"gpt-4o-transcribe\"")
                .unwrap();
        assert_eq!(config.source_language.as_deref(), Some("en"));
        assert_eq!(config.transcription_model.as_deref(), Some("gpt-4o-transcribe"));
        assert!(Config::default().source_language.is_none());
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let mut config = Config::default();
        config.call_timeout_secs = 0;
        assert_eq!(config.call_timeout(), None);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("concurrency = 2\ndefault_provider = \"gemini\"").unwrap();
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.default_provider, Provider::Gemini);
        assert_eq!(config.chunk_size, 200);
    }
}
