/*!
 * Conversion of raw timed-text documents into the output formats offered to users.
 *
 * The only dialect conversion is WebVTT → SRT. WebVTT output is the fetched
 * document passed through untouched, and plain-text output is delegated to
 * the transcript cleaner.
 */

use std::fmt;
use std::str::FromStr;
use anyhow::anyhow;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::SubtitleError;
use crate::subtitle_processor::{SubtitleDocument, SubtitleFormat};
use crate::transcript_cleaner;

/// Output format requested by the user
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// SubRip
    #[default]
    Srt,
    /// WebVTT, as published by the site
    Vtt,
    /// Plain transcript without timing or markup
    #[serde(rename = "txt")]
    CleanText,
}

impl OutputFormat {
    /// File extension including the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => ".srt",
            Self::Vtt => ".vtt",
            Self::CleanText => ".txt",
        }
    }

    /// MIME type used when serving the file
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Srt => "text/srt",
            Self::Vtt => "text/vtt",
            Self::CleanText => "text/plain",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Srt => "SRT",
            Self::Vtt => "VTT",
            Self::CleanText => "Clean TXT",
        }
    }

    /// Track extension to ask the site for, in order of preference
    pub fn preferred_source_extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Srt => &["srt", "vtt"],
            Self::Vtt => &["vtt"],
            Self::CleanText => &["vtt", "srt"],
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" | "webvtt" => Ok(Self::Vtt),
            "txt" | "text" | "clean" | "clean txt" => Ok(Self::CleanText),
            _ => Err(anyhow!("Invalid output format: {}", s)),
        }
    }
}

/// Convert a raw WebVTT document into SRT.
///
/// The header block is dropped, timestamps are rewritten with `,` and a full
/// hour field, and blocks are numbered from 1 in cue order.
pub fn convert_to_srt(raw_vtt: &str) -> String {
    let document = SubtitleDocument::parse(raw_vtt);
    debug!("Converting {} cues to SRT", document.len());
    document.to_srt()
}

/// Produce the requested output format from a fetched track.
///
/// `source_extension` is the extension the track was published with; when it
/// is not a timed-text dialect we know, the content itself is sniffed.
pub fn render(raw: &str, source_extension: &str, format: OutputFormat) -> Result<String, SubtitleError> {
    match format {
        OutputFormat::Vtt => Ok(raw.to_string()),
        OutputFormat::CleanText => Ok(transcript_cleaner::clean(raw)),
        OutputFormat::Srt => {
            let dialect = match SubtitleFormat::from_extension(source_extension) {
                SubtitleFormat::Unknown => SubtitleFormat::detect(raw),
                known => known,
            };
            match dialect {
                SubtitleFormat::WebVtt => Ok(convert_to_srt(raw)),
                // Re-emit through the parser so numbering is contiguous
                SubtitleFormat::Srt => Ok(SubtitleDocument::parse(raw).to_srt()),
                SubtitleFormat::Unknown => Err(SubtitleError::UnsupportedSource {
                    source_extension: source_extension.trim_start_matches('.').to_string(),
                    target: format.display_name().to_string(),
                }),
            }
        }
    }
}
