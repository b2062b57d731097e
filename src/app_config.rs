use anyhow::{anyhow, Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::format_converter::OutputFormat;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Metadata extractor settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Subtitle download settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// yt-dlp settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResolverConfig {
    // @field: Path or name of the yt-dlp executable
    #[serde(default = "default_yt_dlp_path")]
    pub yt_dlp_path: String,

    // @field: Timeout seconds for one yt-dlp invocation
    #[serde(default = "default_resolver_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Arguments appended to every yt-dlp invocation
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: default_yt_dlp_path(),
            timeout_secs: default_resolver_timeout_secs(),
            extra_args: Vec::new(),
        }
    }
}

/// HTTP settings for direct subtitle URLs
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Where and how downloaded subtitles are written
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    /// Directory for downloaded subtitle files
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// Format used when `--format` is not given
    #[serde(default)]
    pub default_format: OutputFormat,

    /// Language picked when `--lang` is not given
    #[serde(default = "default_preferred_language")]
    pub preferred_language: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            default_format: OutputFormat::default(),
            preferred_language: default_preferred_language(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching filter for the log facade
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_yt_dlp_path() -> String {
    "yt-dlp".to_string()
}

fn default_resolver_timeout_secs() -> u64 {
    120
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn default_output_directory() -> String {
    ".".to_string()
}

fn default_preferred_language() -> String {
    "en".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.resolver.yt_dlp_path.trim().is_empty() {
            return Err(anyhow!("resolver.yt_dlp_path must not be empty"));
        }
        if self.resolver.timeout_secs == 0 {
            return Err(anyhow!("resolver.timeout_secs must be greater than zero"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(anyhow!("fetch.timeout_secs must be greater than zero"));
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(anyhow!("fetch.user_agent must not be empty"));
        }
        if self.output.directory.trim().is_empty() {
            return Err(anyhow!("output.directory must not be empty"));
        }

        crate::language_utils::validate_language_code(&self.output.preferred_language)
            .context("output.preferred_language is not a valid language code")?;

        Ok(())
    }

    /// Load a configuration file, writing the defaults to it when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;

        Ok(())
    }
}
