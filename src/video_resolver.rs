/*!
 * Video metadata resolution.
 *
 * A resolver turns a video page URL (plus optional cookies) into the video's
 * metadata and the catalog of subtitle tracks it offers. The bundled
 * implementation shells out to `yt-dlp` and reads its JSON dump.
 */

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use serde::Deserialize;
use tokio::process::Command;
use url::Url;

use crate::app_config::ResolverConfig;
use crate::errors::ResolutionError;
use crate::language_utils;

/// Authentication material passed through to the extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Netscape-format cookies file
    pub cookie_file: PathBuf,
}

impl Credentials {
    /// Credentials backed by a cookies file
    pub fn from_cookie_file(cookie_file: impl Into<PathBuf>) -> Self {
        Credentials {
            cookie_file: cookie_file.into(),
        }
    }
}

/// One downloadable rendition of a subtitle track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDescriptor {
    /// File extension of this rendition ("vtt", "srt", "json3", ...)
    pub format_extension: String,

    /// Whether the track is machine-generated
    pub is_automatic: bool,

    /// Direct URL of the rendition, when the site exposes one
    pub source_locator: Option<String>,

    /// Track name given by the site
    pub name: Option<String>,
}

/// Subtitle tracks of one kind, keyed by language code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleCatalog {
    tracks: BTreeMap<String, Vec<TrackDescriptor>>,
}

impl SubtitleCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rendition for a language
    pub fn insert(&mut self, language: impl Into<String>, track: TrackDescriptor) {
        self.tracks.entry(language.into()).or_default().push(track);
    }

    /// Renditions available for a language
    pub fn get(&self, language: &str) -> Option<&[TrackDescriptor]> {
        self.tracks.get(language).map(Vec::as_slice)
    }

    /// Language codes in the catalog, sorted
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.tracks.keys().map(String::as_str)
    }

    /// Iterate over languages and their renditions
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[TrackDescriptor])> {
        self.tracks.iter().map(|(lang, tracks)| (lang.as_str(), tracks.as_slice()))
    }

    /// Number of languages
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether no language has any rendition
    pub fn is_empty(&self) -> bool {
        self.tracks.values().all(Vec::is_empty)
    }

    // Exact tag first, then any tag for the same language
    fn find_language(&self, language: &str) -> Option<&str> {
        if let Some((lang, _)) = self.tracks.get_key_value(language) {
            return Some(lang.as_str());
        }
        self.languages()
            .find(|lang| lang.eq_ignore_ascii_case(language))
            .or_else(|| self.languages().find(|lang| language_utils::language_codes_match(lang, language)))
    }
}

/// A language/kind pair the user can pick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackOption {
    /// Language code as listed by the site
    pub language: String,

    /// Whether this is the automatic-captions track
    pub is_automatic: bool,

    /// Label shown to the user
    pub label: String,
}

/// Metadata of a resolved video
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoMetadata {
    /// Video title
    pub title: String,

    /// Duration in seconds
    pub duration_secs: Option<f64>,

    /// Channel or uploader name
    pub uploader: Option<String>,

    /// Thumbnail image URL
    pub thumbnail_url: Option<String>,

    /// Identifier of the extractor that handled the URL ("Youtube", "Dailymotion")
    pub extractor_id: String,

    /// Manually authored subtitles
    pub subtitles: SubtitleCatalog,

    /// Machine-generated captions
    pub automatic_captions: SubtitleCatalog,
}

impl VideoMetadata {
    /// Whether any subtitle track is offered
    pub fn has_subtitles(&self) -> bool {
        !self.subtitles.is_empty() || !self.automatic_captions.is_empty()
    }

    /// Duration as `H:MM:SS`, or "Unknown"
    pub fn duration_display(&self) -> String {
        match self.duration_secs {
            Some(secs) if secs > 0.0 && secs.is_finite() => {
                let total = secs.round() as u64;
                format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
            }
            _ => "Unknown".to_string(),
        }
    }

    /// Extractor name capitalized for display ("youtube" → "Youtube")
    pub fn extractor_label(&self) -> String {
        let lower = self.extractor_id.to_lowercase();
        let mut chars = lower.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => "Video".to_string(),
        }
    }

    /// Selectable tracks: manual subtitles first, then automatic captions
    pub fn track_options(&self) -> Vec<TrackOption> {
        let manual = self.subtitles.iter().map(|(lang, tracks)| (lang, tracks, false));
        let automatic = self.automatic_captions.iter().map(|(lang, tracks)| (lang, tracks, true));

        manual
            .chain(automatic)
            .filter(|(_, tracks, _)| !tracks.is_empty())
            .map(|(lang, tracks, is_automatic)| Self::option_for(lang, tracks, is_automatic))
            .collect()
    }

    fn option_for(language: &str, tracks: &[TrackDescriptor], is_automatic: bool) -> TrackOption {
        let name = tracks
            .iter()
            .find_map(|t| t.name.clone().filter(|n| !n.trim().is_empty()))
            .unwrap_or_else(|| language_utils::display_name(language));
        let label = if is_automatic {
            format!("🤖 {} (Auto)", name)
        } else {
            format!("✅ {} (Manual)", name)
        };
        TrackOption {
            language: language.to_string(),
            is_automatic,
            label,
        }
    }

    /// Find the option for a language.
    ///
    /// `automatic` restricts the search to one kind; `None` prefers manual
    /// subtitles and falls back to automatic captions.
    pub fn find_track(&self, language: &str, automatic: Option<bool>) -> Option<TrackOption> {
        let search = |catalog: &SubtitleCatalog, is_automatic: bool| {
            catalog.find_language(language).and_then(|lang| {
                let tracks = catalog.get(lang)?;
                (!tracks.is_empty()).then(|| Self::option_for(lang, tracks, is_automatic))
            })
        };

        match automatic {
            Some(false) => search(&self.subtitles, false),
            Some(true) => search(&self.automatic_captions, true),
            None => search(&self.subtitles, false).or_else(|| search(&self.automatic_captions, true)),
        }
    }

    /// Renditions behind an option
    pub fn tracks_for(&self, option: &TrackOption) -> &[TrackDescriptor] {
        let catalog = if option.is_automatic {
            &self.automatic_captions
        } else {
            &self.subtitles
        };
        catalog.get(&option.language).unwrap_or(&[])
    }
}

/// Resolves a video URL into metadata and a subtitle catalog
#[async_trait]
pub trait VideoResolver: Send + Sync + Debug {
    /// Resolve a video URL
    ///
    /// # Arguments
    /// * `url` - Video page URL
    /// * `credentials` - Optional cookies for age-gated or region-locked content
    async fn resolve(&self, url: &str, credentials: Option<&Credentials>) -> Result<VideoMetadata, ResolutionError>;
}

/// Resolver backed by the `yt-dlp` executable
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    /// Path or name of the yt-dlp binary
    binary: String,
    /// Maximum time to wait for the extractor
    timeout: Duration,
    /// Extra arguments appended before the URL
    extra_args: Vec<String>,
}

/// Raw `yt-dlp --dump-single-json` document, reduced to the fields we use
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    duration: Option<f64>,
    uploader: Option<String>,
    thumbnail: Option<String>,
    extractor_key: Option<String>,
    extractor: Option<String>,
    subtitles: Option<HashMap<String, Vec<YtDlpTrack>>>,
    automatic_captions: Option<HashMap<String, Vec<YtDlpTrack>>>,
}

#[derive(Debug, Deserialize)]
struct YtDlpTrack {
    ext: Option<String>,
    url: Option<String>,
    name: Option<String>,
}

impl YtDlpResolver {
    /// Create a resolver from configuration
    pub fn from_config(config: &ResolverConfig) -> Self {
        YtDlpResolver {
            binary: config.yt_dlp_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            extra_args: config.extra_args.clone(),
        }
    }

    /// Convert a yt-dlp JSON dump into metadata
    pub fn parse_metadata(json: &str) -> Result<VideoMetadata, ResolutionError> {
        let info: YtDlpInfo = serde_json::from_str(json)
            .map_err(|e| ResolutionError::InvalidResponse(format!("Failed to parse yt-dlp JSON: {}", e)))?;

        Ok(VideoMetadata {
            title: info.title.unwrap_or_else(|| "subtitles".to_string()),
            duration_secs: info.duration,
            uploader: info.uploader,
            thumbnail_url: info.thumbnail,
            extractor_id: info.extractor_key.or(info.extractor).unwrap_or_else(|| "video".to_string()),
            subtitles: Self::catalog_from(info.subtitles.unwrap_or_default(), false),
            automatic_captions: Self::catalog_from(info.automatic_captions.unwrap_or_default(), true),
        })
    }

    fn catalog_from(raw: HashMap<String, Vec<YtDlpTrack>>, is_automatic: bool) -> SubtitleCatalog {
        let mut catalog = SubtitleCatalog::new();
        for (language, tracks) in raw {
            // yt-dlp lists live chat replays alongside subtitles
            if language == "live_chat" {
                continue;
            }
            for track in tracks {
                let Some(ext) = track.ext.filter(|e| !e.is_empty()) else {
                    continue;
                };
                catalog.insert(language.clone(), TrackDescriptor {
                    format_extension: ext,
                    is_automatic,
                    source_locator: track.url,
                    name: track.name,
                });
            }
        }
        catalog
    }

    /// Map yt-dlp's error output to a resolution error
    pub fn classify_failure(stderr: &str) -> ResolutionError {
        let message = Self::filter_stderr(stderr);
        let lower = message.to_lowercase();

        let access_markers = [
            "http error 401",
            "http error 403",
            "sign in to confirm",
            "login required",
            "private video",
            "members-only",
            "age-restricted",
        ];
        let unsupported_markers = ["unsupported url", "is not a valid url"];
        let network_markers = [
            "unable to download",
            "timed out",
            "connection",
            "name or service not known",
            "getaddrinfo",
            "network is unreachable",
            "temporary failure in name resolution",
        ];

        if access_markers.iter().any(|m| lower.contains(m)) {
            ResolutionError::AccessDenied(message)
        } else if unsupported_markers.iter().any(|m| lower.contains(m)) {
            ResolutionError::UnsupportedUrl(message)
        } else if network_markers.iter().any(|m| lower.contains(m)) {
            ResolutionError::Network(message)
        } else {
            ResolutionError::Failed(message)
        }
    }

    /// Keep only yt-dlp's error lines, without the `ERROR:` prefix
    pub(crate) fn filter_stderr(stderr: &str) -> String {
        let errors: Vec<&str> = stderr
            .lines()
            .filter_map(|line| line.trim().strip_prefix("ERROR:"))
            .map(str::trim)
            .collect();

        if !errors.is_empty() {
            return errors.join("\n");
        }

        let meaningful: Vec<&str> = stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("WARNING:"))
            .collect();
        if meaningful.is_empty() {
            "unknown yt-dlp error (stderr was empty)".to_string()
        } else {
            meaningful.join("\n")
        }
    }

    /// Arguments for a metadata-only run
    fn metadata_args(&self, url: &str, credentials: Option<&Credentials>) -> Vec<String> {
        let mut args: Vec<String> = [
            "--dump-single-json",
            "--skip-download",
            "--no-playlist",
            "--no-warnings",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if let Some(credentials) = credentials {
            args.push("--cookies".to_string());
            args.push(credentials.cookie_file.to_string_lossy().to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args.push(url.to_string());
        args
    }
}

/// Check that a URL is an absolute http(s) URL
pub fn validate_url(url: &str) -> Result<Url, ResolutionError> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| ResolutionError::UnsupportedUrl(format!("{}: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
        _ => Err(ResolutionError::UnsupportedUrl(url.to_string())),
    }
}

#[async_trait]
impl VideoResolver for YtDlpResolver {
    async fn resolve(&self, url: &str, credentials: Option<&Credentials>) -> Result<VideoMetadata, ResolutionError> {
        let url = validate_url(url)?;
        let args = self.metadata_args(url.as_str(), credentials);
        debug!("Running {} {}", self.binary, args.join(" "));

        let ytdlp_future = Command::new(&self.binary)
            .args(&args)
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            result = ytdlp_future => {
                result.map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => ResolutionError::ToolUnavailable(
                        format!("'{}' was not found; install yt-dlp or set resolver.yt_dlp_path", self.binary)
                    ),
                    _ => ResolutionError::ToolUnavailable(format!("Failed to run {}: {}", self.binary, e)),
                })?
            },
            _ = tokio::time::sleep(self.timeout) => {
                return Err(ResolutionError::Timeout(self.timeout.as_secs()));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let failure = Self::classify_failure(&stderr);
            error!("Metadata extraction failed: {}", failure);
            return Err(failure);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Err(ResolutionError::InvalidResponse("yt-dlp produced no output".to_string()));
        }

        let metadata = Self::parse_metadata(&stdout)?;
        debug!(
            "Resolved '{}' via {}: {} manual, {} automatic subtitle languages",
            metadata.title,
            metadata.extractor_id,
            metadata.subtitles.len(),
            metadata.automatic_captions.len()
        );
        Ok(metadata)
    }
}
