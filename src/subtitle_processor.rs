use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use regex::Regex;
use once_cell::sync::Lazy;
use log::debug;

// @module: Timed-text parsing for WebVTT and SRT documents

// @const: Cue boundary separator shared by both dialects
pub const BOUNDARY_SEPARATOR: &str = " --> ";

// @const: Timestamp in either dialect, hours optional
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+):)?(\d{1,2}):(\d{2})[.,](\d{1,3})$").unwrap()
});

// @const: Hour digits written when the source had no hour field
const DEFAULT_HOUR_WIDTH: usize = 2;

/// A position in a subtitle document, in milliseconds since its start
///
/// The hour width of a parsed timestamp is kept so re-serialization leaves an
/// existing hour field as it was (`1:02:03.004` stays `1:02:03,004`).
/// Equality, ordering and hashing only consider the time.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    millis: u64,
    hour_width: usize,
}

impl Timestamp {
    /// Create a timestamp from a millisecond offset
    pub fn from_millis(millis: u64) -> Self {
        Timestamp {
            millis,
            hour_width: DEFAULT_HOUR_WIDTH,
        }
    }

    /// Milliseconds since the start of the document
    pub fn as_millis(&self) -> u64 {
        self.millis
    }

    /// Parse a WebVTT (`HH:MM:SS.mmm`, `MM:SS.mmm`) or SRT (`HH:MM:SS,mmm`) timestamp.
    ///
    /// Either fractional separator is accepted in either form. A fraction with
    /// fewer than three digits is read as a decimal fraction (`1.5` is 1500 ms).
    pub fn parse(text: &str) -> Option<Self> {
        let caps = TIMESTAMP_REGEX.captures(text.trim())?;

        let (hours, hour_width): (u64, usize) = match caps.get(1) {
            Some(m) => (m.as_str().parse().ok()?, m.as_str().len()),
            None => (0, DEFAULT_HOUR_WIDTH),
        };
        let minutes: u64 = caps.get(2)?.as_str().parse().ok()?;
        let seconds: u64 = caps.get(3)?.as_str().parse().ok()?;
        let fraction = caps.get(4)?.as_str();
        let millis: u64 = fraction.parse::<u64>().ok()? * 10u64.pow(3 - fraction.len() as u32);

        if minutes >= 60 || seconds >= 60 {
            return None;
        }

        let total = hours
            .checked_mul(3_600_000)?
            .checked_add(minutes * 60_000 + seconds * 1_000 + millis)?;
        Some(Timestamp {
            millis: total,
            hour_width,
        })
    }

    fn format_with(&self, fraction_separator: char) -> String {
        let hours = self.millis / 3_600_000;
        let minutes = (self.millis % 3_600_000) / 60_000;
        let seconds = (self.millis % 60_000) / 1_000;
        let millis = self.millis % 1_000;
        format!(
            "{:0width$}:{:02}:{:02}{}{:03}",
            hours,
            minutes,
            seconds,
            fraction_separator,
            millis,
            width = self.hour_width
        )
    }

    /// Format as an SRT timestamp (`HH:MM:SS,mmm`)
    pub fn to_srt(&self) -> String {
        self.format_with(',')
    }

    /// Format as a WebVTT timestamp (`HH:MM:SS.mmm`)
    pub fn to_vtt(&self) -> String {
        self.format_with('.')
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::from_millis(0)
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.millis == other.millis
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.millis.cmp(&other.millis)
    }
}

impl Hash for Timestamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.millis.hash(state);
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_vtt())
    }
}

/// One timed caption unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// When the cue appears
    pub start: Timestamp,

    /// When the cue disappears
    pub end: Timestamp,

    /// Payload lines, in document order
    pub lines: Vec<String>,

    /// WebVTT cue settings following the end timestamp, if any
    pub settings: Option<String>,
}

impl Cue {
    /// Creates a cue without settings
    pub fn new(start: Timestamp, end: Timestamp, lines: Vec<String>) -> Self {
        Cue {
            start,
            end,
            lines,
            settings: None,
        }
    }

    /// Payload lines joined with line breaks
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Render this cue as an SRT block with the given sequence number
    pub fn to_srt_block(&self, seq_num: usize) -> String {
        format!(
            "{}\n{}{}{}\n{}\n",
            seq_num,
            self.start.to_srt(),
            BOUNDARY_SEPARATOR,
            self.end.to_srt(),
            self.text()
        )
    }

    /// Render this cue as a WebVTT block
    pub fn to_vtt_block(&self) -> String {
        let settings = match &self.settings {
            Some(settings) => format!(" {}", settings),
            None => String::new(),
        };
        format!(
            "{}{}{}{}\n{}\n",
            self.start.to_vtt(),
            BOUNDARY_SEPARATOR,
            self.end.to_vtt(),
            settings,
            self.text()
        )
    }
}

/// Timed-text dialect of a raw document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// WebVTT (`WEBVTT` header, `.` fractional separator)
    WebVtt,
    /// SubRip (`,` fractional separator, numbered blocks)
    Srt,
    /// Anything else (TTML, JSON3, ...)
    Unknown,
}

impl SubtitleFormat {
    /// Guess the dialect from the document contents
    pub fn detect(raw: &str) -> Self {
        let text = normalize_text(raw);

        if text
            .lines()
            .find(|line| !line.trim().is_empty())
            .is_some_and(is_webvtt_header)
        {
            return Self::WebVtt;
        }

        let has_srt_boundary = text
            .lines()
            .any(|line| line.contains(',') && parse_boundary(line).is_some());
        if has_srt_boundary {
            return Self::Srt;
        }

        Self::Unknown
    }

    /// Map a track file extension (with or without the leading dot) to a dialect
    pub fn from_extension(extension: &str) -> Self {
        match extension.trim_start_matches('.').to_lowercase().as_str() {
            "vtt" | "webvtt" => Self::WebVtt,
            "srt" => Self::Srt,
            _ => Self::Unknown,
        }
    }
}

/// A parsed timed-text document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleDocument {
    /// Cues in document order
    pub cues: Vec<Cue>,

    /// Number of header/metadata lines that were discarded
    pub header_lines: usize,
}

impl SubtitleDocument {
    /// Parse a raw WebVTT or SRT document.
    ///
    /// Parsing is structural and lenient: it never fails, ignores lines it
    /// cannot place, and flushes a trailing cue even without a final blank line.
    pub fn parse(raw: &str) -> Self {
        let text = normalize_text(raw);
        let mut lines = text.lines().peekable();

        // Skip the WEBVTT header and its metadata block
        let mut header_lines = 0;
        while lines.peek().is_some_and(|line| line.trim().is_empty()) {
            lines.next();
        }
        if lines.peek().copied().is_some_and(is_webvtt_header) {
            while let Some(line) = lines.peek() {
                if line.trim().is_empty() || parse_boundary(line).is_some() {
                    break;
                }
                header_lines += 1;
                lines.next();
            }
        }

        let mut cues = Vec::new();
        let mut current: Option<Cue> = None;
        let mut ignored_boundaries = 0;

        for line in lines {
            if line.contains(BOUNDARY_SEPARATOR) {
                match parse_boundary(line) {
                    Some((start, end, settings)) => {
                        Self::flush(&mut cues, current.take());
                        current = Some(Cue {
                            settings,
                            ..Cue::new(start, end, Vec::new())
                        });
                    }
                    // Not flanked by timestamps, so it is cue text
                    None => match current.as_mut() {
                        Some(cue) => cue.lines.push(line.to_string()),
                        None => {
                            ignored_boundaries += 1;
                            debug!("Ignoring malformed cue boundary: {}", line.trim());
                        }
                    },
                }
                continue;
            }

            if line.trim().is_empty() {
                Self::flush(&mut cues, current.take());
                continue;
            }

            if let Some(cue) = current.as_mut() {
                cue.lines.push(line.to_string());
            }
        }
        Self::flush(&mut cues, current.take());

        debug!(
            "Parsed {} cues ({} header lines, {} malformed boundaries)",
            cues.len(), header_lines, ignored_boundaries
        );

        SubtitleDocument { cues, header_lines }
    }

    // Close a cue: trim its payload as a block and drop it if nothing is left
    fn flush(cues: &mut Vec<Cue>, cue: Option<Cue>) {
        let Some(mut cue) = cue else {
            return;
        };

        let block = cue.lines.join("\n");
        let trimmed = block.trim();
        if trimmed.is_empty() {
            debug!("Dropping cue at {} with empty payload", cue.start);
            return;
        }

        cue.lines = trimmed.split('\n').map(str::to_string).collect();
        cues.push(cue);
    }

    /// Number of cues
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Whether the document has no cues
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Serialize as SRT, numbering blocks from 1 in cue order
    pub fn to_srt(&self) -> String {
        self.cues
            .iter()
            .enumerate()
            .map(|(i, cue)| cue.to_srt_block(i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Serialize as WebVTT with a bare header
    pub fn to_vtt(&self) -> String {
        let blocks: Vec<String> = self.cues.iter().map(Cue::to_vtt_block).collect();
        if blocks.is_empty() {
            return "WEBVTT\n".to_string();
        }
        format!("WEBVTT\n\n{}", blocks.join("\n"))
    }
}

/// Strip a leading byte order mark and normalize line endings to `\n`
pub(crate) fn normalize_text(raw: &str) -> Cow<'_, str> {
    let text = raw.trim_start_matches('\u{FEFF}');
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Whether a line opens a WebVTT header
pub(crate) fn is_webvtt_header(line: &str) -> bool {
    let line = line.trim();
    match line.strip_prefix("WEBVTT") {
        Some(rest) => rest.is_empty() || rest.starts_with([' ', '\t']),
        None => false,
    }
}

/// Parse a cue boundary line into start, end and trailing cue settings
pub fn parse_boundary(line: &str) -> Option<(Timestamp, Timestamp, Option<String>)> {
    let (left, right) = line.split_once(BOUNDARY_SEPARATOR)?;
    let start = Timestamp::parse(left)?;

    let right = right.trim();
    let (end_text, settings) = match right.split_once(char::is_whitespace) {
        Some((end_text, rest)) => {
            let rest = rest.trim();
            (end_text, (!rest.is_empty()).then(|| rest.to_string()))
        }
        None => (right, None),
    };
    let end = Timestamp::parse(end_text)?;

    Some((start, end, settings))
}
