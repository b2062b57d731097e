use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::asset_fetcher::{AssetFetcher, FetchRequest, SubtitleFetcher};
use crate::errors::AppError;
use crate::file_utils::{self, FileManager};
use crate::format_converter::{self, OutputFormat};
use crate::video_resolver::{Credentials, TrackDescriptor, TrackOption, VideoMetadata, VideoResolver, YtDlpResolver};

// @module: Application controller for subtitle downloads

/// A rendered subtitle file ready to be saved or served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleArtifact {
    /// File contents
    pub data: Vec<u8>,

    /// Suggested file name, derived from the video title
    pub file_name: String,

    /// MIME type of the contents
    pub mime_type: String,

    /// Format the contents were rendered to
    pub format: OutputFormat,

    /// Language of the track the artifact was built from
    pub language: String,

    /// Whether the source track was an automatic caption
    pub is_automatic: bool,
}

/// Result of a download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The subtitle file was fetched and rendered
    Ready(SubtitleArtifact),

    /// The video offers neither subtitles nor automatic captions
    NoSubtitlesAvailable,
}

/// Which track the user asked for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackSelection {
    /// Language code; `None` uses the configured preferred language
    pub language: Option<String>,

    /// `Some(true)` for automatic captions only, `Some(false)` for manual
    /// subtitles only, `None` to prefer manual and fall back to automatic
    pub automatic: Option<bool>,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Video metadata source
    resolver: Arc<dyn VideoResolver>,

    // @field: Raw subtitle source
    fetcher: Arc<dyn AssetFetcher>,
}

impl Controller {
    /// Create a controller with explicit collaborators
    pub fn new(config: Config, resolver: Arc<dyn VideoResolver>, fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self { config, resolver, fetcher }
    }

    // @method: Create a controller backed by yt-dlp and HTTP
    pub fn with_config(config: Config) -> Result<Self> {
        let resolver = Arc::new(YtDlpResolver::from_config(&config.resolver));
        let fetcher = Arc::new(SubtitleFetcher::from_config(&config)?);
        Ok(Self::new(config, resolver, fetcher))
    }

    /// Resolve a video and return its metadata and subtitle catalogs
    pub async fn inspect(&self, url: &str, credentials: Option<&Credentials>) -> Result<VideoMetadata, AppError> {
        let spinner = Self::spinner("Fetching video metadata...");
        let result = self.resolver.resolve(url, credentials).await;
        spinner.finish_and_clear();

        let metadata = result?;
        debug!(
            "'{}' offers {} track option(s)",
            metadata.title,
            metadata.track_options().len()
        );
        Ok(metadata)
    }

    /// Resolve, select, fetch and render one subtitle track
    ///
    /// Returns `DownloadOutcome::NoSubtitlesAvailable` without fetching
    /// anything when the video has no subtitle tracks at all.
    pub async fn prepare_download(
        &self,
        url: &str,
        selection: &TrackSelection,
        format: OutputFormat,
        credentials: Option<&Credentials>,
    ) -> Result<DownloadOutcome, AppError> {
        let metadata = self.inspect(url, credentials).await?;
        self.download_from_metadata(url, &metadata, selection, format, credentials).await
    }

    /// Select, fetch and render a track of an already resolved video
    pub async fn download_from_metadata(
        &self,
        url: &str,
        metadata: &VideoMetadata,
        selection: &TrackSelection,
        format: OutputFormat,
        credentials: Option<&Credentials>,
    ) -> Result<DownloadOutcome, AppError> {
        if !metadata.has_subtitles() {
            info!("No subtitles detected for '{}'", metadata.title);
            return Ok(DownloadOutcome::NoSubtitlesAvailable);
        }

        let option = self.select_track(metadata, selection)?;
        let descriptor = Self::choose_rendition(metadata.tracks_for(&option), format).ok_or_else(|| {
            AppError::TrackNotFound {
                language: option.language.clone(),
                kind: kind_label(Some(option.is_automatic)).to_string(),
            }
        })?;
        info!("Selected {} as .{}", option.label, descriptor.format_extension);

        let request = match &descriptor.source_locator {
            Some(locator) => FetchRequest::Locator(locator.clone()),
            None => FetchRequest::Download {
                url: url.to_string(),
                language: option.language.clone(),
                automatic: option.is_automatic,
                preferred_extension: descriptor.format_extension.clone(),
                credentials: credentials.cloned(),
            },
        };

        let spinner = Self::spinner("Downloading subtitles...");
        let fetched = self.fetcher.fetch(&request).await;
        spinner.finish_and_clear();
        let asset = fetched?;

        let source_extension = asset
            .extension
            .clone()
            .unwrap_or_else(|| descriptor.format_extension.clone());
        let mut artifact = Self::render_artifact(&metadata.title, &asset.data, &source_extension, format)?;
        artifact.language = option.language;
        artifact.is_automatic = option.is_automatic;

        Ok(DownloadOutcome::Ready(artifact))
    }

    /// Pick the track option for a selection.
    ///
    /// An explicit language must exist. Without one, the configured preferred
    /// language is tried first and the first listed option is the fallback.
    pub fn select_track(&self, metadata: &VideoMetadata, selection: &TrackSelection) -> Result<TrackOption, AppError> {
        if let Some(language) = &selection.language {
            return metadata
                .find_track(language, selection.automatic)
                .ok_or_else(|| AppError::TrackNotFound {
                    language: language.clone(),
                    kind: kind_label(selection.automatic).to_string(),
                });
        }

        let preferred = &self.config.output.preferred_language;
        if let Some(option) = metadata.find_track(preferred, selection.automatic) {
            return Ok(option);
        }

        let fallback = metadata
            .track_options()
            .into_iter()
            .find(|option| selection.automatic.is_none_or(|automatic| option.is_automatic == automatic));
        match fallback {
            Some(option) => {
                warn!("No '{}' subtitles, using {} instead", preferred, option.label);
                Ok(option)
            }
            None => Err(AppError::TrackNotFound {
                language: preferred.clone(),
                kind: kind_label(selection.automatic).to_string(),
            }),
        }
    }

    /// Rendition to fetch for an output format: the first preferred extension
    /// available, otherwise whatever the site lists first
    pub fn choose_rendition(tracks: &[TrackDescriptor], format: OutputFormat) -> Option<&TrackDescriptor> {
        format
            .preferred_source_extensions()
            .iter()
            .find_map(|ext| {
                tracks
                    .iter()
                    .find(|track| track.format_extension.eq_ignore_ascii_case(ext))
            })
            .or_else(|| tracks.first())
    }

    /// Turn fetched bytes into an artifact of the requested format.
    ///
    /// WebVTT output passes the bytes through untouched; when the source is
    /// not WebVTT the file keeps its own extension.
    pub fn render_artifact(
        title: &str,
        data: &[u8],
        source_extension: &str,
        format: OutputFormat,
    ) -> Result<SubtitleArtifact, AppError> {
        let source_extension = source_extension.trim_start_matches('.').to_lowercase();

        let (data, file_name, mime_type) = match format {
            OutputFormat::Vtt => {
                let (extension, mime_type): (Cow<str>, &str) = if source_extension == "vtt" {
                    (Cow::Borrowed(format.extension()), format.mime_type())
                } else {
                    warn!("No WebVTT rendition, keeping the .{} file as published", source_extension);
                    let mime_type = source_extension
                        .parse::<OutputFormat>()
                        .map(|f| f.mime_type())
                        .unwrap_or("text/plain");
                    (Cow::Owned(format!(".{}", source_extension)), mime_type)
                };
                (data.to_vec(), file_utils::output_file_name(title, &extension), mime_type)
            }
            OutputFormat::Srt | OutputFormat::CleanText => {
                let text = String::from_utf8_lossy(data);
                let rendered = format_converter::render(&text, &source_extension, format)?;
                (
                    rendered.into_bytes(),
                    file_utils::output_file_name(title, format.extension()),
                    format.mime_type(),
                )
            }
        };

        Ok(SubtitleArtifact {
            data,
            file_name,
            mime_type: mime_type.to_string(),
            format,
            language: String::new(),
            is_automatic: false,
        })
    }

    /// Write an artifact into a directory.
    ///
    /// Returns `None` when the file already exists and `force_overwrite` is
    /// off.
    pub fn save_artifact(
        &self,
        artifact: &SubtitleArtifact,
        output_dir: &Path,
        force_overwrite: bool,
    ) -> Result<Option<PathBuf>> {
        FileManager::ensure_dir(output_dir)?;

        let output_path = output_dir.join(&artifact.file_name);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, file already exists (use -f to force overwrite)", output_path);
            return Ok(None);
        }

        FileManager::write_to_file(&output_path, &artifact.data)?;
        info!("Saved {} subtitles to {:?}", artifact.format.display_name(), output_path);
        Ok(Some(output_path))
    }

    /// Convert a local subtitle file to SRT
    pub fn convert_file(input: &Path, output: Option<&Path>, force_overwrite: bool) -> Result<PathBuf> {
        let output = output.map(Path::to_path_buf).unwrap_or_else(|| input.with_extension("srt"));
        Self::transform_file(input, &output, force_overwrite, |text, extension| {
            Ok(format_converter::render(text, extension, OutputFormat::Srt)?)
        })
    }

    /// Write the plain transcript of a local subtitle file
    pub fn clean_file(input: &Path, output: Option<&Path>, force_overwrite: bool) -> Result<PathBuf> {
        let output = output.map(Path::to_path_buf).unwrap_or_else(|| input.with_extension("txt"));
        Self::transform_file(input, &output, force_overwrite, |text, extension| {
            Ok(format_converter::render(text, extension, OutputFormat::CleanText)?)
        })
    }

    fn transform_file<F>(input: &Path, output: &Path, force_overwrite: bool, transform: F) -> Result<PathBuf>
    where
        F: FnOnce(&str, &str) -> Result<String>,
    {
        if !FileManager::file_exists(input) {
            return Err(anyhow!("Input file does not exist: {:?}", input));
        }
        if output.exists() && !force_overwrite {
            return Err(anyhow!("Output file already exists: {:?} (use -f to force overwrite)", output));
        }

        let text = FileManager::read_to_string(input)?;
        let extension = input
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let rendered = transform(&text, &extension)?;

        FileManager::write_to_file(output, rendered.as_bytes())?;
        info!("Wrote {:?}", output);
        Ok(output.to_path_buf())
    }

    // @creates: Spinner for a single network step
    fn spinner(message: &'static str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }
}

fn kind_label(automatic: Option<bool>) -> &'static str {
    match automatic {
        Some(true) => "automatic",
        Some(false) => "manual",
        None => "any",
    }
}
