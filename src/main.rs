// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use subgrab::app_config::{self, Config};
use subgrab::file_utils::FileManager;
use subgrab::{Controller, Credentials, DownloadOutcome, OutputFormat, TrackSelection};

/// CLI Wrapper for OutputFormat to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Srt,
    Vtt,
    Txt,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(cli_format: CliOutputFormat) -> Self {
        match cli_format {
            CliOutputFormat::Srt => OutputFormat::Srt,
            CliOutputFormat::Vtt => OutputFormat::Vtt,
            CliOutputFormat::Txt => OutputFormat::CleanText,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show video details and the subtitle tracks it offers
    Info(InfoArgs),

    /// Download one subtitle track as SRT, VTT or plain text
    Download(DownloadArgs),

    /// Strip timing and markup from a local subtitle file
    Clean(FileArgs),

    /// Convert a local WebVTT (or SRT) file to SRT
    Convert(FileArgs),

    /// Generate shell completions for subgrab
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Video page URL
    #[arg(value_name = "URL")]
    url: String,

    /// Netscape-format cookies file for restricted videos
    #[arg(long, value_name = "FILE")]
    cookies: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct DownloadArgs {
    /// Video page URL
    #[arg(value_name = "URL")]
    url: String,

    /// Subtitle language code (e.g., 'en', 'pt-BR'); defaults to output.preferred_language
    #[arg(long)]
    lang: Option<String>,

    /// Only consider automatic captions
    #[arg(long, conflicts_with = "manual")]
    auto: bool,

    /// Only consider manually authored subtitles
    #[arg(long)]
    manual: bool,

    /// Output format; defaults to output.default_format
    #[arg(long, value_enum)]
    format: Option<CliOutputFormat>,

    /// Netscape-format cookies file for restricted videos
    #[arg(long, value_name = "FILE")]
    cookies: Option<PathBuf>,

    /// Directory for the subtitle file; defaults to output.directory
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

#[derive(Parser, Debug)]
struct FileArgs {
    /// Input subtitle file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output file (defaults to the input path with a new extension)
    #[arg(short, long, value_name = "OUT")]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

/// subgrab - Subtitle downloader and normalizer
///
/// Fetches the subtitles of online videos and saves them as SRT, WebVTT
/// or a clean plain-text transcript.
#[derive(Parser, Debug)]
#[command(name = "subgrab")]
#[command(version)]
#[command(about = "Download video subtitles as SRT, VTT or clean text")]
#[command(long_about = "subgrab lists and downloads the subtitle tracks of online videos (via yt-dlp) and normalizes them.

EXAMPLES:
    subgrab info https://youtu.be/VIDEO                      # Show details and available tracks
    subgrab download https://youtu.be/VIDEO                  # Preferred language as SRT
    subgrab download --lang fr --auto URL                    # French automatic captions
    subgrab download --format txt -o transcripts URL         # Clean transcript into a folder
    subgrab download --cookies cookies.txt URL               # Restricted video
    subgrab convert talk.vtt                                 # talk.vtt -> talk.srt
    subgrab clean talk.srt -o talk.txt                       # Plain transcript of a local file
    subgrab completions bash > subgrab.bash                  # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn decoration_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::decoration_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set through log::set_max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(level) = cli.log_level {
        log::set_max_level(app_config::LogLevel::from(level).to_level_filter());
    }

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subgrab", &mut std::io::stdout());
            Ok(())
        }
        Commands::Clean(args) => {
            Controller::clean_file(&args.input, args.output.as_deref(), args.force_overwrite)?;
            Ok(())
        }
        Commands::Convert(args) => {
            Controller::convert_file(&args.input, args.output.as_deref(), args.force_overwrite)?;
            Ok(())
        }
        Commands::Info(args) => {
            let config = load_config(&cli.config_path, cli.log_level)?;
            run_info(config, args).await
        }
        Commands::Download(args) => {
            let config = load_config(&cli.config_path, cli.log_level)?;
            run_download(config, args).await
        }
    }
}

// Load or create configuration, then apply command line overrides
fn load_config(config_path: &str, cli_log_level: Option<CliLogLevel>) -> Result<Config> {
    let mut config = Config::load_or_create(config_path)?;

    match cli_log_level {
        Some(level) => config.log_level = level.into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn credentials_from(cookies: Option<PathBuf>) -> Result<Option<Credentials>> {
    match cookies {
        Some(path) if !FileManager::file_exists(&path) => Err(anyhow!("Cookies file does not exist: {:?}", path)),
        Some(path) => Ok(Some(Credentials::from_cookie_file(path))),
        None => Ok(None),
    }
}

async fn run_info(config: Config, args: InfoArgs) -> Result<()> {
    let credentials = credentials_from(args.cookies)?;
    let controller = Controller::with_config(config)?;
    let metadata = controller.inspect(&args.url, credentials.as_ref()).await?;

    println!("🎬 {}", metadata.title);
    println!("   Source:    {}", metadata.extractor_label());
    println!("   Uploader:  {}", metadata.uploader.as_deref().unwrap_or("Unknown"));
    println!("   Duration:  {}", metadata.duration_display());
    if let Some(thumbnail) = &metadata.thumbnail_url {
        println!("   Thumbnail: {}", thumbnail);
    }

    if !metadata.has_subtitles() {
        warn!("No subtitles detected for this video.");
        return Ok(());
    }

    println!();
    println!("Available subtitles:");
    for option in metadata.track_options() {
        let flag = if option.is_automatic { " --auto" } else { "" };
        println!("   {:<40} --lang {}{}", option.label, option.language, flag);
    }

    Ok(())
}

async fn run_download(config: Config, args: DownloadArgs) -> Result<()> {
    let format = args.format.map(OutputFormat::from).unwrap_or(config.output.default_format);
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| PathBuf::from(&config.output.directory));
    let selection = TrackSelection {
        language: args.lang,
        automatic: match (args.auto, args.manual) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
    };
    let credentials = credentials_from(args.cookies)?;

    let controller = Controller::with_config(config)?;
    let outcome = controller
        .prepare_download(&args.url, &selection, format, credentials.as_ref())
        .await?;

    match outcome {
        DownloadOutcome::NoSubtitlesAvailable => {
            warn!("No subtitles detected for this video.");
        }
        DownloadOutcome::Ready(artifact) => {
            info!(
                "Rendered {} ({}, {} bytes)",
                artifact.file_name,
                artifact.mime_type,
                artifact.data.len()
            );
            if let Some(path) = controller.save_artifact(&artifact, &output_dir, args.force_overwrite)? {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
