/*!
 * Error types for the subgrab application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur while resolving a video URL into metadata
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// The URL is malformed or no extractor supports it
    #[error("Unsupported URL: {0}")]
    UnsupportedUrl(String),

    /// The site refused access (HTTP 401/403, sign-in or age gate)
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Network failure while talking to the site
    #[error("Network error: {0}")]
    Network(String),

    /// The extractor did not finish in time
    #[error("Metadata extraction timed out after {0} seconds")]
    Timeout(u64),

    /// The extractor executable could not be started
    #[error("Extractor unavailable: {0}")]
    ToolUnavailable(String),

    /// The extractor produced output we could not understand
    #[error("Invalid extractor response: {0}")]
    InvalidResponse(String),

    /// Any other extractor failure
    #[error("Extraction failed: {0}")]
    Failed(String),
}

/// Errors that can occur while fetching raw subtitle bytes
#[derive(Error, Debug)]
pub enum FetchError {
    /// The server answered with a non-success status
    #[error("Subtitle download failed with HTTP {status_code}: {url}")]
    Status {
        /// HTTP status code
        status_code: u16,
        /// Requested URL
        url: String,
    },

    /// The request did not complete in time
    #[error("Subtitle download timed out: {0}")]
    Timeout(String),

    /// Transport-level failure
    #[error("Subtitle request failed: {0}")]
    Request(String),

    /// A resolver-triggered download failed
    #[error("Subtitle download failed: {0}")]
    Download(String),

    /// A resolver-triggered download finished without producing a subtitle file
    #[error("No subtitle file was produced for language {0}")]
    NoSubtitleFile(String),
}

/// Errors that can occur during subtitle rendering
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The source track format cannot be turned into the requested output
    #[error("Cannot convert .{source_extension} subtitles to {target}")]
    UnsupportedSource {
        /// Extension of the fetched track
        source_extension: String,
        /// Requested output format
        target: String,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the video resolver
    #[error("{0}")]
    Resolution(#[from] ResolutionError),

    /// Error from the subtitle fetcher
    #[error("{0}")]
    Fetch(#[from] FetchError),

    /// Error from subtitle rendering
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// The requested language/kind is not in the catalog
    #[error("No {kind} subtitles found for language '{language}'")]
    TrackNotFound {
        /// Requested language code
        language: String,
        /// "manual", "automatic" or "any"
        kind: String,
    },

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
