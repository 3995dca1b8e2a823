pub mod archive;
pub mod config;
pub mod deadline;
pub mod document;
pub mod error;
pub mod interactive;
pub mod language;
pub mod media;
pub mod pipeline;
pub mod source;
pub mod synthesize;
pub mod transcribe;
pub mod translate;

pub use config::{Config, Provider};
pub use error::{AutodubError, Result};
pub use pipeline::{
    print_summary, Collaborators, DubbingOrchestrator, LanguageReport, PipelineConfig,
    PipelineResult, PipelineStats, Stage,
};
pub use source::VideoSource;
