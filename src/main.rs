use anyhow::{Context, Result};
use autodub::archive::ARCHIVE_FILE_NAME;
use autodub::config::{Config, Provider};
use autodub::interactive::run_interactive_wizard;
use autodub::language;
use autodub::media::FfmpegTranscoder;
use autodub::pipeline::{print_summary, Collaborators, DubbingOrchestrator, PipelineConfig};
use autodub::source::VideoSource;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "autodub")]
#[command(version, about = "Multilingual video dubbing using AI")]
#[command(
    long_about = "Transcribe a video, translate the transcript into Indian languages, and produce a dubbed video per language plus a Word document of all translations, bundled into one zip archive."
)]
struct Cli {
    /// Input video file or URL (starts the interactive wizard when omitted)
    input: Option<String>,

    /// Target language codes, comma separated (e.g., hi,te,ta)
    #[arg(short, long, value_delimiter = ',')]
    languages: Vec<String>,

    /// Output archive
    #[arg(short, long, default_value = ARCHIVE_FILE_NAME)]
    output: PathBuf,

    /// Transcription provider: whisper, gemini
    #[arg(short, long)]
    provider: Option<String>,

    /// Spoken language of the video (ISO 639-1), instead of auto-detection
    #[arg(short, long)]
    source_language: Option<String>,

    /// Speech-to-text model (e.g., gpt-4o-transcribe, gemini-1.5-pro)
    #[arg(long)]
    model: Option<String>,

    /// Number of languages processed concurrently
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Sentences per translation request
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Deadline per external call in seconds (0 disables)
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Run the interactive wizard
    #[arg(short, long)]
    interactive: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// Normalize requested codes and reject any outside the supported set.
fn resolve_languages(requested: &[String]) -> Result<Vec<String>> {
    let joined = requested.join(",");
    let languages = language::dedupe(&language::parse_language_list(&joined));

    let unsupported: Vec<&str> = languages
        .iter()
        .filter(|code| !language::is_supported(code))
        .map(String::as_str)
        .collect();
    if !unsupported.is_empty() {
        let supported: Vec<&str> = language::SUPPORTED_LANGUAGES
            .iter()
            .map(|(code, _)| *code)
            .collect();
        anyhow::bail!(
            "Unsupported language(s): {}. Supported: {}",
            unsupported.join(", "),
            supported.join(", ")
        );
    }

    Ok(languages)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(timeout) = cli.timeout {
        config.call_timeout_secs = timeout;
    }
    if let Some(ref language) = cli.source_language {
        config.source_language = Some(language.clone());
    }
    if let Some(ref model) = cli.model {
        config.transcription_model = Some(model.clone());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let (source, languages, output, mut config, provider) =
        if cli.interactive || cli.input.is_none() {
            let wizard = run_interactive_wizard()?;
            (
                wizard.source,
                wizard.languages,
                wizard.output,
                wizard.config,
                wizard.provider,
            )
        } else {
            let input = cli.input.clone().unwrap_or_default();
            let source = VideoSource::parse(&input);
            if let VideoSource::Local(ref path) = source {
                if !path.exists() {
                    anyhow::bail!("Input file not found: {}", path.display());
                }
            }

            let config = Config::load().context("Failed to load configuration")?;
            let provider: Provider = match cli.provider {
                Some(ref p) => p.parse().map_err(|e: String| anyhow::anyhow!(e))?,
                None => config.default_provider,
            };

            (
                source,
                resolve_languages(&cli.languages)?,
                cli.output.clone(),
                config,
                provider,
            )
        };

    apply_overrides(&mut config, &cli);
    config
        .validate(provider)
        .context("Configuration validation failed")?;

    FfmpegTranscoder::new(&config.ffmpeg_path, &config.ffprobe_path)
        .check_available()
        .await
        .context("FFmpeg is required")?;

    if languages.is_empty() {
        warn!("No target languages given; the archive will only contain the transcript");
    }

    info!("Source:    {}", source.describe());
    info!("Output:    {}", output.display());
    info!("Provider:  {}", provider);
    info!("Languages: {}", languages.join(", "));

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        ctrlc::set_handler(move || {
            eprintln!("\nCancelling after the current step...");
            cancelled.store(true, Ordering::SeqCst);
        })
        .context("Failed to install Ctrl+C handler")?;
    }

    let collaborators = Collaborators::from_config(&config, provider)?;
    let orchestrator = DubbingOrchestrator::new(collaborators, PipelineConfig::from_config(&config))
        .with_cancel_flag(cancelled);

    let result = orchestrator
        .run(&source, &languages, &output)
        .await
        .context("Dubbing failed")?;

    print_summary(&result);

    Ok(())
}
