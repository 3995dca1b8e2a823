use crate::archive::ARCHIVE_FILE_NAME;
use crate::config::{Config, Provider};
use crate::language::{self, SUPPORTED_LANGUAGES};
use crate::source::VideoSource;
use console::style;
use dialoguer::{Confirm, Input, MultiSelect, Select};
use std::fs;
use std::path::{Path, PathBuf};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov"];

pub struct InteractiveResult {
    pub source: VideoSource,
    pub languages: Vec<String>,
    pub output: PathBuf,
    pub config: Config,
    pub provider: Provider,
}

pub fn run_interactive_wizard() -> anyhow::Result<InteractiveResult> {
    print_header();

    // Step 1: Check/Setup API keys
    let (config, provider) = setup_api_keys()?;

    // Step 2: Select source video
    let source = select_source()?;

    // Step 3: Select target languages
    let languages = select_languages()?;

    // Step 4: Output archive
    let output: String = Input::new()
        .with_prompt("Output archive")
        .default(ARCHIVE_FILE_NAME.to_string())
        .interact_text()?;
    let output = PathBuf::from(output.trim());

    // Step 5: Confirm
    print_summary(&source, &languages, &output, provider);

    if !Confirm::new()
        .with_prompt("Proceed with these settings?")
        .default(true)
        .interact()?
    {
        anyhow::bail!("Cancelled by user");
    }

    println!();

    Ok(InteractiveResult {
        source,
        languages,
        output,
        config,
        provider,
    })
}

fn print_header() {
    println!();
    println!(
        "{}",
        style("╔═══════════════════════════════════════════════════╗").cyan()
    );
    println!(
        "{}",
        style("║         autodub - AI Multilingual Video Dubbing   ║").cyan()
    );
    println!(
        "{}",
        style("╚═══════════════════════════════════════════════════╝").cyan()
    );
    println!();
}

fn setup_api_keys() -> anyhow::Result<(Config, Provider)> {
    let mut config = Config::load().unwrap_or_default();
    let mut changed = false;

    let providers = [
        ("OpenAI Whisper", Provider::Whisper),
        ("Google Gemini", Provider::Gemini),
    ];
    let items: Vec<&str> = providers.iter().map(|(name, _)| *name).collect();
    let default = providers
        .iter()
        .position(|(_, p)| *p == config.default_provider)
        .unwrap_or(0);
    let selection = Select::new()
        .with_prompt("Speech recognition provider")
        .items(&items)
        .default(default)
        .interact()?;
    let provider = providers[selection].1;

    if provider == Provider::Whisper && config.openai_api_key.is_none() {
        config.openai_api_key = Some(prompt_key(
            "OpenAI API key",
            "https://platform.openai.com/api-keys",
        )?);
        changed = true;
    }

    if config.gemini_api_key.is_none() {
        config.gemini_api_key = Some(prompt_key(
            "Gemini API key",
            "https://aistudio.google.com/apikey",
        )?);
        changed = true;
    } else {
        println!("{} API keys configured", style("✓").green());
    }

    // Offer to save
    if changed
        && Confirm::new()
            .with_prompt("Save API keys to config file?")
            .default(true)
            .interact()?
    {
        save_config(&config)?;
        println!("{} API keys saved to config\n", style("✓").green());
    }

    Ok((config, provider))
}

fn prompt_key(label: &str, help_url: &str) -> anyhow::Result<String> {
    println!("{} {} not found", style("!").yellow(), label);
    println!("  Get one at: {}\n", help_url);

    let key: String = Input::new()
        .with_prompt(format!("Enter your {label}"))
        .interact_text()?;

    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("{label} is required");
    }
    Ok(key.to_string())
}

fn save_config(config: &Config) -> anyhow::Result<()> {
    if let Some(config_path) = Config::config_file_path() {
        if let Some(dir) = config_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let toml_content = toml::to_string_pretty(config)?;
        fs::write(config_path, toml_content)?;
    }
    Ok(())
}

fn select_source() -> anyhow::Result<VideoSource> {
    println!("\n{}", style("Select source video:").bold());

    let files = scan_video_files(Path::new("."))?;

    let mut items: Vec<String> = files
        .iter()
        .map(|f| {
            let size = fs::metadata(f)
                .map(|m| format_size(m.len()))
                .unwrap_or_else(|_| "?".to_string());
            format!("{} ({})", f.display(), size)
        })
        .collect();
    items.push("Enter a video URL...".to_string());
    items.push("Enter custom path...".to_string());

    let selection = Select::new()
        .with_prompt("Choose a video")
        .items(&items)
        .default(0)
        .interact()?;

    if selection < files.len() {
        return Ok(VideoSource::Local(files[selection].clone()));
    }

    if selection == files.len() {
        let url: String = Input::new()
            .with_prompt("Enter video URL")
            .validate_with(|input: &String| -> Result<(), String> {
                match url::Url::parse(input.trim()) {
                    Ok(u) if u.scheme() == "http" || u.scheme() == "https" => Ok(()),
                    _ => Err("Enter an http(s) URL".to_string()),
                }
            })
            .interact_text()?;
        return Ok(VideoSource::Url(url.trim().to_string()));
    }

    let path: String = Input::new()
        .with_prompt("Enter file path")
        .interact_text()?;
    let path = PathBuf::from(path.trim());
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    Ok(VideoSource::Local(path))
}

fn scan_video_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() {
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                if VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
                    files.push(path);
                }
            }
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn select_languages() -> anyhow::Result<Vec<String>> {
    let items: Vec<String> = SUPPORTED_LANGUAGES
        .iter()
        .map(|(code, name)| format!("{} ({})", name, code))
        .collect();

    loop {
        let selection = MultiSelect::new()
            .with_prompt("Select target languages (space to toggle)")
            .items(&items)
            .interact()?;

        if !selection.is_empty() {
            return Ok(selection
                .into_iter()
                .map(|i| SUPPORTED_LANGUAGES[i].0.to_string())
                .collect());
        }

        println!("{} Select at least one language", style("!").yellow());
    }
}

fn print_summary(source: &VideoSource, languages: &[String], output: &Path, provider: Provider) {
    println!("\n{}", style("═══ Summary ═══").bold());
    println!("  Source:    {}", style(source.describe()).cyan());
    println!("  Output:    {}", style(output.display()).cyan());
    println!("  Provider:  {}", provider);
    println!("  Languages: {}", describe_languages(languages));
    println!();
}

fn describe_languages(languages: &[String]) -> String {
    languages
        .iter()
        .map(|code| format!("{} ({})", language::label(code), code))
        .collect::<Vec<_>>()
        .join(", ")
}
