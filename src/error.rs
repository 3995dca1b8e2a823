use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutodubError {
    #[error("Video retrieval failed: {0}")]
    Retrieval(String),

    #[error("Media decode failed: {0}")]
    MediaDecode(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Muxing failed: {0}")]
    Mux(String),

    #[error("Document generation failed: {0}")]
    Document(String),

    #[error("Archive packaging failed: {0}")]
    Archive(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("Pipeline cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl AutodubError {
    /// Whether this error aborts a whole run rather than a single language.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AutodubError::Retrieval(_)
                | AutodubError::MediaDecode(_)
                | AutodubError::Cancelled
                | AutodubError::Config(_)
                | AutodubError::Archive(_)
                | AutodubError::Document(_)
                | AutodubError::Io(_)
                | AutodubError::Zip(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AutodubError>;
