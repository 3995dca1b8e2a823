use crate::archive::{self, OutputArchive};
use crate::config::{Config, Provider};
use crate::document::TranscriptDocument;
use crate::error::{AutodubError, Result};
use crate::language;
use crate::media::{self, DubbedVideo, FfmpegTranscoder, MuxCodecs, MuxOutcome, Transcoder};
use crate::source::{self, SourceVideo, VideoFetcher, VideoSource, YtDlpFetcher};
use crate::synthesize::{self, GoogleTtsClient, SpeechSynthesizer};
use crate::transcribe::{self, Transcriber, Transcript};
use crate::translate::{self, GeminiTranslator, TranscriptChunker, Translation, Translator};
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Semaphore};
use tracing::{debug, info, warn};

/// Name of the extracted speech track inside the run directory.
pub const EXTRACTED_AUDIO_FILE_NAME: &str = "extracted_audio.wav";

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Acquiring,
    AudioExtracting,
    Transcribing,
    FanningOut,
    DocumentBuilding,
    Packaging,
    Done,
    Failed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Acquiring => "acquiring video",
            Stage::AudioExtracting => "extracting audio",
            Stage::Transcribing => "transcribing",
            Stage::FanningOut => "dubbing languages",
            Stage::DocumentBuilding => "building document",
            Stage::Packaging => "packaging",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Configuration for the dubbing pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Language chains running at the same time.
    pub concurrency: usize,
    /// Sentence units per translation request.
    pub chunk_size: usize,
    /// Deadline for each external service call.
    pub call_timeout: Option<Duration>,
    /// Codecs for the dubbed videos.
    pub codecs: MuxCodecs,
    /// Show progress bars.
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            chunk_size: translate::DEFAULT_CHUNK_SIZE,
            call_timeout: Some(Duration::from_secs(300)),
            codecs: MuxCodecs::default(),
            show_progress: true,
        }
    }
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            concurrency: config.concurrency,
            chunk_size: config.chunk_size,
            call_timeout: config.call_timeout(),
            ..Self::default()
        }
    }
}

/// The external services a run talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn VideoFetcher>,
    pub transcoder: Arc<dyn Transcoder>,
    pub transcriber: Arc<dyn Transcriber>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl Collaborators {
    /// Production services: yt-dlp, FFmpeg, the chosen speech-to-text
    /// provider, Gemini translation and Google Text-to-Speech.
    pub fn from_config(config: &Config, provider: Provider) -> Result<Self> {
        let transcriber: Arc<dyn Transcriber> =
            Arc::from(transcribe::create_transcriber(provider, config)?);

        let gemini_key = config.gemini_api_key.clone().ok_or_else(|| {
            AutodubError::Config(
                "Gemini API key not set. Set GEMINI_API_KEY environment variable.".to_string(),
            )
        })?;
        let tts_key = config.tts_api_key().map(str::to_string).ok_or_else(|| {
            AutodubError::Config(
                "Text-to-Speech API key not set. Set GOOGLE_TTS_API_KEY environment variable."
                    .to_string(),
            )
        })?;

        Ok(Self {
            fetcher: Arc::new(YtDlpFetcher::new(&config.yt_dlp_path)),
            transcoder: Arc::new(FfmpegTranscoder::new(
                &config.ffmpeg_path,
                &config.ffprobe_path,
            )),
            transcriber,
            translator: Arc::new(GeminiTranslator::new(gemini_key)),
            synthesizer: Arc::new(GoogleTtsClient::new(tts_key)),
        })
    }
}

/// What one language chain produced.
///
/// `translation` is `None` when translating failed; the video is then
/// always skipped.
#[derive(Debug, Clone)]
pub struct LanguageReport {
    pub language: String,
    pub translation: Option<Translation>,
    pub video: MuxOutcome,
}

impl LanguageReport {
    fn failed(language: &str, reason: impl Into<String>) -> Self {
        Self {
            language: language.to_string(),
            translation: None,
            video: MuxOutcome::skipped(language, reason),
        }
    }
}

/// Statistics from the dubbing process.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub total_time: Duration,
    pub extraction_time: Duration,
    pub transcription_time: Duration,
    pub fan_out_time: Duration,
    pub audio_duration: Duration,
    pub languages_requested: usize,
    pub translations_produced: usize,
    pub videos_produced: usize,
}

/// Result of a successful run.
#[derive(Debug)]
pub struct PipelineResult {
    pub archive: OutputArchive,
    pub transcript: Transcript,
    /// One report per distinct requested language, in request order.
    pub languages: Vec<LanguageReport>,
    pub stats: PipelineStats,
}

impl PipelineResult {
    pub fn translated_languages(&self) -> Vec<&str> {
        self.languages
            .iter()
            .filter(|r| r.translation.is_some())
            .map(|r| r.language.as_str())
            .collect()
    }

    pub fn dubbed_languages(&self) -> Vec<&str> {
        self.languages
            .iter()
            .filter(|r| r.video.is_produced())
            .map(|r| r.language.as_str())
            .collect()
    }
}

/// Drives one video through extraction, transcription, per-language
/// dubbing, document building and packaging.
pub struct DubbingOrchestrator {
    collaborators: Collaborators,
    config: PipelineConfig,
    stage: watch::Sender<Stage>,
    cancelled: Arc<AtomicBool>,
}

impl DubbingOrchestrator {
    pub fn new(collaborators: Collaborators, config: PipelineConfig) -> Self {
        let (stage, _) = watch::channel(Stage::Idle);
        Self {
            collaborators,
            config,
            stage,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share a cancellation flag, e.g. one set by a Ctrl+C handler.
    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Watch stage transitions.
    pub fn subscribe(&self) -> watch::Receiver<Stage> {
        self.stage.subscribe()
    }

    pub fn stage(&self) -> Stage {
        *self.stage.borrow()
    }

    /// Dub `source` into every language in `languages` and write the archive
    /// to `output`.
    ///
    /// Only acquisition, audio extraction, cancellation and packaging errors
    /// fail the run. Per-language failures leave that language out of the
    /// archive and are listed in [`PipelineResult::languages`].
    pub async fn run(
        &self,
        source: &VideoSource,
        languages: &[String],
        output: &Path,
    ) -> Result<PipelineResult> {
        let result = self.run_stages(source, languages, output).await;
        if let Err(e) = &result {
            warn!("Pipeline failed while {}: {}", self.stage(), e);
            self.enter(Stage::Failed);
        }
        result
    }

    async fn run_stages(
        &self,
        source: &VideoSource,
        languages: &[String],
        output: &Path,
    ) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let transcoder = self.collaborators.transcoder.as_ref();

        self.check_cancelled()?;

        // Per-run scratch space; removed when this function returns.
        let work_dir = tempfile::Builder::new().prefix("autodub-").tempdir()?;
        debug!("Using work directory: {:?}", work_dir.path());

        // ═══════════════════════════════════════════════════════════════════
        // Stage 1: Acquisition
        // ═══════════════════════════════════════════════════════════════════
        self.enter(Stage::Acquiring);
        info!("Stage 1/5: Acquiring video from {}", source.describe());
        let video: SourceVideo = source::acquire(
            source,
            work_dir.path(),
            self.collaborators.fetcher.as_ref(),
            self.config.call_timeout,
        )
        .await?;

        match transcoder.probe_duration(video.path()).await {
            Ok(duration) => info!("Video duration: {:.1}s", duration.as_secs_f64()),
            Err(e) => debug!("Could not probe video duration: {}", e),
        }

        self.check_cancelled()?;

        // ═══════════════════════════════════════════════════════════════════
        // Stage 2: Audio extraction
        // ═══════════════════════════════════════════════════════════════════
        self.enter(Stage::AudioExtracting);
        info!("Stage 2/5: Extracting audio");
        let extraction_start = Instant::now();

        let audio_path = work_dir.path().join(EXTRACTED_AUDIO_FILE_NAME);
        let audio = transcoder
            .extract_audio(video.path(), &audio_path)
            .await
            .map_err(|e| match e {
                AutodubError::MediaDecode(_) => e,
                other => AutodubError::MediaDecode(other.to_string()),
            })?;
        let extraction_time = extraction_start.elapsed();

        self.check_cancelled()?;

        // ═══════════════════════════════════════════════════════════════════
        // Stage 3: Transcription
        // ═══════════════════════════════════════════════════════════════════
        self.enter(Stage::Transcribing);
        info!(
            "Stage 3/5: Transcribing with {}",
            self.collaborators.transcriber.name()
        );
        let transcription_start = Instant::now();
        let transcript = transcribe::recognize_speech(
            self.collaborators.transcriber.as_ref(),
            &audio_path,
            self.config.call_timeout,
        )
        .await;
        let transcription_time = transcription_start.elapsed();

        self.check_cancelled()?;

        // ═══════════════════════════════════════════════════════════════════
        // Stage 4: Per-language chains
        // ═══════════════════════════════════════════════════════════════════
        self.enter(Stage::FanningOut);
        let languages = language::dedupe(languages);
        if languages.is_empty() {
            warn!("No target languages requested; packaging the transcript only");
        }
        info!(
            "Stage 4/5: Dubbing {} language(s) (concurrency: {})",
            languages.len(),
            self.config.concurrency
        );
        let fan_out_start = Instant::now();
        let reports = self
            .fan_out(&video, &transcript, &languages, work_dir.path())
            .await;
        let fan_out_time = fan_out_start.elapsed();

        self.check_cancelled()?;

        // ═══════════════════════════════════════════════════════════════════
        // Stage 5: Document and archive
        // ═══════════════════════════════════════════════════════════════════
        self.enter(Stage::DocumentBuilding);
        info!("Stage 5/5: Building document and archive");
        let translations: Vec<Translation> = reports
            .iter()
            .filter_map(|r| r.translation.clone())
            .collect();
        let document = TranscriptDocument::build(&transcript, &translations);
        let docx = document.to_docx()?;

        self.enter(Stage::Packaging);
        let videos: Vec<DubbedVideo> = reports
            .iter()
            .filter_map(|r| r.video.dubbed().cloned())
            .collect();
        let output_path = output.to_path_buf();
        let archive = tokio::task::spawn_blocking(move || {
            archive::package(&videos, &docx, &output_path)
        })
        .await
        .map_err(|e| AutodubError::Archive(format!("Packaging task failed: {e}")))??;

        self.enter(Stage::Done);

        let stats = PipelineStats {
            total_time: start_time.elapsed(),
            extraction_time,
            transcription_time,
            fan_out_time,
            audio_duration: audio.duration,
            languages_requested: languages.len(),
            translations_produced: translations.len(),
            videos_produced: archive.dubbed_languages().len(),
        };

        info!(
            "Run complete: {}/{} translated, {}/{} dubbed in {:.2}s",
            stats.translations_produced,
            stats.languages_requested,
            stats.videos_produced,
            stats.languages_requested,
            stats.total_time.as_secs_f64()
        );

        Ok(PipelineResult {
            archive,
            transcript,
            languages: reports,
            stats,
        })
    }

    /// Run every language chain, at most `concurrency` at once, and wait
    /// for all of them. Reports come back in request order.
    async fn fan_out(
        &self,
        video: &SourceVideo,
        transcript: &Transcript,
        languages: &[String],
        work_dir: &Path,
    ) -> Vec<LanguageReport> {
        if languages.is_empty() {
            return Vec::new();
        }

        let progress_bar = if self.config.show_progress {
            let pb = ProgressBar::new(languages.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} languages {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let chunker = TranscriptChunker::new(self.config.chunk_size);
        let mut chains = FuturesUnordered::new();

        for language in languages {
            let semaphore = semaphore.clone();
            let pb = progress_bar.clone();
            let chunker = &chunker;

            chains.push(async move {
                let report = match semaphore.acquire().await {
                    Ok(_permit) => {
                        self.run_chain(language, video, transcript, chunker, work_dir)
                            .await
                    }
                    Err(_) => LanguageReport::failed(language, "worker pool closed"),
                };

                if let Some(ref pb) = pb {
                    pb.set_message(language.clone());
                    pb.inc(1);
                }
                report
            });
        }

        let mut by_language: HashMap<String, LanguageReport> =
            HashMap::with_capacity(languages.len());
        while let Some(report) = chains.next().await {
            by_language.insert(report.language.clone(), report);
        }

        if let Some(pb) = progress_bar {
            pb.finish_with_message("done");
        }

        languages
            .iter()
            .filter_map(|language| by_language.remove(language))
            .collect()
    }

    /// translate → synthesize → mux for one language. Failures stop the
    /// chain and are recorded in the report, never returned.
    async fn run_chain(
        &self,
        language: &str,
        video: &SourceVideo,
        transcript: &Transcript,
        chunker: &TranscriptChunker,
        work_dir: &Path,
    ) -> LanguageReport {
        if self.cancelled.load(Ordering::Relaxed) {
            return LanguageReport::failed(language, "pipeline cancelled");
        }

        if !language::is_valid_code(language) {
            warn!("[{}] Not a valid language code, skipping", language);
            return LanguageReport::failed(language, "invalid language code");
        }

        let timeout = self.config.call_timeout;

        info!("[{}] Translating", language);
        let translation = match translate::translate_transcript(
            self.collaborators.translator.as_ref(),
            transcript,
            language,
            chunker,
            timeout,
        )
        .await
        {
            Ok(translation) => translation,
            Err(e) => {
                warn!("[{}] Dropping language: {}", language, e);
                return LanguageReport::failed(language, e.to_string());
            }
        };

        info!("[{}] Synthesizing voiceover", language);
        let voiceover = match synthesize::render_voiceover(
            self.collaborators.synthesizer.as_ref(),
            &translation,
            work_dir,
            timeout,
        )
        .await
        {
            Ok(voiceover) => voiceover,
            Err(e) => {
                warn!("[{}] No dubbed video: {}", language, e);
                return LanguageReport {
                    language: language.to_string(),
                    video: MuxOutcome::skipped(language, e.to_string()),
                    translation: Some(translation),
                };
            }
        };

        info!("[{}] Muxing voiceover", language);
        let video = media::dub_video(
            self.collaborators.transcoder.as_ref(),
            video,
            &voiceover,
            work_dir,
            &self.config.codecs,
            timeout,
        )
        .await;

        LanguageReport {
            language: language.to_string(),
            translation: Some(translation),
            video,
        }
    }

    fn enter(&self, stage: Stage) {
        debug!("Stage: {}", stage);
        self.stage.send_replace(stage);
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Err(AutodubError::Cancelled);
        }
        Ok(())
    }
}

/// Print a summary of the pipeline results.
pub fn print_summary(result: &PipelineResult) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                        Dubbing Complete                        ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Archive:    {}", result.archive.path.display());
    println!(
        "  Transcript: {}",
        if result.transcript.is_recognized() {
            format!("{} characters", result.transcript.text().chars().count())
        } else {
            "no speech detected".to_string()
        }
    );
    println!(
        "  Duration:   {:.1}s audio",
        result.stats.audio_duration.as_secs_f64()
    );
    println!();
    println!("  Languages:");
    for report in &result.languages {
        let translated = if report.translation.is_some() { "✓" } else { "✗" };
        let video = match &report.video {
            MuxOutcome::Produced(video) => format!(
                "✓ {}",
                video
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            ),
            MuxOutcome::Skipped { reason, .. } => format!("✗ {reason}"),
        };
        println!(
            "    {:<10} translation {}  video {}",
            language::label(&report.language),
            translated,
            video
        );
    }
    println!();
    println!("  Timing:");
    println!(
        "    Extract:     {:.2}s",
        result.stats.extraction_time.as_secs_f64()
    );
    println!(
        "    Transcribe:  {:.2}s",
        result.stats.transcription_time.as_secs_f64()
    );
    println!(
        "    Dub:         {:.2}s",
        result.stats.fan_out_time.as_secs_f64()
    );
    println!(
        "    Total:       {:.2}s",
        result.stats.total_time.as_secs_f64()
    );
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
