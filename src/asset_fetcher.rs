/*!
 * Retrieval of raw subtitle bytes.
 *
 * Tracks are fetched either directly from the URL the site published for a
 * rendition, or by asking `yt-dlp` to write the subtitles of a video into a
 * temporary directory when no direct URL is available.
 */

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use tokio::process::Command;

use crate::app_config::Config;
use crate::errors::FetchError;
use crate::video_resolver::{Credentials, YtDlpResolver};

// @const: Subtitle extensions accepted when the preferred one was not produced
const FALLBACK_EXTENSIONS: [&str; 4] = ["srt", "vtt", "ttml", "json3"];

/// What to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    /// Direct URL of a subtitle rendition
    Locator(String),

    /// Let the extractor download the track of a video
    Download {
        /// Video page URL
        url: String,
        /// Language code as listed in the catalog
        language: String,
        /// Whether to download automatic captions instead of manual subtitles
        automatic: bool,
        /// Extension to ask for ("vtt", "srt")
        preferred_extension: String,
        /// Optional cookies
        credentials: Option<Credentials>,
    },
}

/// Raw subtitle bytes and the extension they were published with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAsset {
    /// Undecoded file contents
    pub data: Vec<u8>,

    /// Extension of the fetched file, when known
    pub extension: Option<String>,
}

/// Fetches raw subtitle tracks
#[async_trait]
pub trait AssetFetcher: Send + Sync + Debug {
    /// Fetch the raw bytes of a subtitle track
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedAsset, FetchError>;
}

/// Fetcher using HTTP for direct locators and yt-dlp for downloads
#[derive(Debug, Clone)]
pub struct SubtitleFetcher {
    /// HTTP client for direct track URLs
    client: Client,
    /// yt-dlp binary for resolver-triggered downloads
    yt_dlp_path: String,
    /// Maximum time for a yt-dlp download
    download_timeout: Duration,
    /// Extra yt-dlp arguments
    extra_args: Vec<String>,
}

impl SubtitleFetcher {
    /// Create a fetcher from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch.timeout_secs))
            .user_agent(config.fetch.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(SubtitleFetcher {
            client,
            yt_dlp_path: config.resolver.yt_dlp_path.clone(),
            download_timeout: Duration::from_secs(config.resolver.timeout_secs),
            extra_args: config.resolver.extra_args.clone(),
        })
    }

    async fn fetch_locator(&self, url: &str) -> Result<FetchedAsset, FetchError> {
        debug!("Fetching subtitle track from {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("Subtitle request to {} failed with status {}", url, status);
            return Err(FetchError::Status {
                status_code: status.as_u16(),
                url: url.to_string(),
            });
        }

        let data = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Request(e.to_string())
            }
        })?;

        Ok(FetchedAsset {
            data: data.to_vec(),
            extension: extension_from_url(url),
        })
    }

    async fn download_via_ytdlp(
        &self,
        url: &str,
        language: &str,
        automatic: bool,
        preferred_extension: &str,
        credentials: Option<&Credentials>,
    ) -> Result<FetchedAsset, FetchError> {
        let tmpdir = tempfile::tempdir()
            .map_err(|e| FetchError::Download(format!("Failed to create temporary directory: {}", e)))?;
        let out_template = tmpdir.path().join("sub_file.%(ext)s");

        let mut args: Vec<String> = vec![
            "--skip-download".to_string(),
            if automatic { "--write-auto-subs" } else { "--write-subs" }.to_string(),
            "--sub-langs".to_string(),
            language.to_string(),
            "--sub-format".to_string(),
            format!("{}/best", preferred_extension),
            "-o".to_string(),
            out_template.to_string_lossy().to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
        ];
        if let Some(credentials) = credentials {
            args.push("--cookies".to_string());
            args.push(credentials.cookie_file.to_string_lossy().to_string());
        }
        args.extend(self.extra_args.iter().cloned());
        args.push(url.to_string());

        debug!("Running {} {}", self.yt_dlp_path, args.join(" "));
        let ytdlp_future = Command::new(&self.yt_dlp_path)
            .args(&args)
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            result = ytdlp_future => {
                result.map_err(|e| FetchError::Download(format!("Failed to run {}: {}", self.yt_dlp_path, e)))?
            },
            _ = tokio::time::sleep(self.download_timeout) => {
                return Err(FetchError::Timeout(format!(
                    "yt-dlp download did not finish within {} seconds", self.download_timeout.as_secs()
                )));
            }
        };

        if !output.status.success() {
            let message = YtDlpResolver::filter_stderr(&String::from_utf8_lossy(&output.stderr));
            error!("Subtitle download failed: {}", message);
            return Err(FetchError::Download(message));
        }

        let files: Vec<PathBuf> = std::fs::read_dir(tmpdir.path())
            .map_err(|e| FetchError::Download(format!("Failed to read download directory: {}", e)))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();

        let path = pick_subtitle_file(&files, preferred_extension)
            .ok_or_else(|| FetchError::NoSubtitleFile(language.to_string()))?;
        let extension = path.extension().map(|e| e.to_string_lossy().to_lowercase());
        if extension.as_deref() != Some(preferred_extension) {
            warn!(
                "Requested .{} subtitles but yt-dlp produced {:?}",
                preferred_extension,
                path.file_name().unwrap_or_default()
            );
        }

        let data = std::fs::read(&path)
            .map_err(|e| FetchError::Download(format!("Failed to read {}: {}", path.display(), e)))?;

        Ok(FetchedAsset { data, extension })
    }
}

#[async_trait]
impl AssetFetcher for SubtitleFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchedAsset, FetchError> {
        match request {
            FetchRequest::Locator(url) => self.fetch_locator(url).await,
            FetchRequest::Download {
                url,
                language,
                automatic,
                preferred_extension,
                credentials,
            } => {
                self.download_via_ytdlp(url, language, *automatic, preferred_extension, credentials.as_ref())
                    .await
            }
        }
    }
}

/// Choose the downloaded file to use: the preferred extension first, then any
/// known subtitle extension.
pub fn pick_subtitle_file(files: &[PathBuf], preferred_extension: &str) -> Option<PathBuf> {
    let has_extension = |path: &Path, ext: &str| {
        path.extension()
            .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
    };

    let mut sorted = files.to_vec();
    sorted.sort();

    sorted
        .iter()
        .find(|path| has_extension(path, preferred_extension))
        .or_else(|| {
            sorted
                .iter()
                .find(|path| FALLBACK_EXTENSIONS.iter().any(|ext| has_extension(path, ext)))
        })
        .cloned()
}

/// Extension of the last path segment of a URL, ignoring the query string
fn extension_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let (_, ext) = segment.rsplit_once('.')?;
    (!ext.is_empty() && ext.len() <= 5).then(|| ext.to_lowercase())
}
