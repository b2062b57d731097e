use regex::Regex;
use once_cell::sync::Lazy;

use crate::subtitle_processor::{is_webvtt_header, normalize_text, parse_boundary};

// @module: Plain-text transcripts from timed-text documents

// @const: Inline markup such as <i>, </c>, <v Speaker> or <00:00:01.000>
static MARKUP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>\n]*>").unwrap()
});

// @const: WebVTT blocks that carry no payload text
const VTT_NON_CUE_BLOCKS: [&str; 3] = ["NOTE", "STYLE", "REGION"];

/// Strip timing, markup and sequence numbers from a WebVTT or SRT document.
///
/// The result is the remaining payload lines in document order, trimmed, one
/// per line, with blank lines removed. Cleaning already-clean text returns it
/// unchanged.
pub fn clean(raw: &str) -> String {
    let text = normalize_text(raw);
    let lines: Vec<&str> = text.lines().collect();

    let (body, is_webvtt) = strip_webvtt_header(&lines);
    let body = if is_webvtt {
        strip_non_cue_blocks(body)
    } else {
        body.to_vec()
    };

    let mut transcript = Vec::new();
    for line in body {
        let line = MARKUP_REGEX.replace_all(line, "");
        let line = line.trim();

        if line.is_empty() || is_timing_line(line) || is_sequence_number(line) {
            continue;
        }
        transcript.push(line.to_string());
    }

    transcript.join("\n").trim().to_string()
}

// Drop the WEBVTT line and the metadata run that follows it, only when a
// blank or boundary line closes the run
fn strip_webvtt_header<'a>(lines: &'a [&'a str]) -> (&'a [&'a str], bool) {
    let Some(first) = lines.iter().position(|line| !line.trim().is_empty()) else {
        return (lines, false);
    };
    if !is_webvtt_header(lines[first]) {
        return (lines, false);
    }

    let closing = lines[first + 1..]
        .iter()
        .position(|line| line.trim().is_empty() || parse_boundary(line).is_some());
    match closing {
        Some(offset) => (&lines[first + 1 + offset..], true),
        None => (lines, false),
    }
}

// Remove NOTE/STYLE/REGION blocks, which run until the next blank line
fn strip_non_cue_blocks<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let mut kept = Vec::with_capacity(lines.len());
    let mut in_block = false;
    let mut at_block_start = true;

    for &line in lines {
        if line.trim().is_empty() {
            in_block = false;
            at_block_start = true;
            kept.push(line);
            continue;
        }
        if at_block_start && starts_non_cue_block(line) {
            in_block = true;
        }
        at_block_start = false;
        if !in_block {
            kept.push(line);
        }
    }
    kept
}

fn starts_non_cue_block(line: &str) -> bool {
    VTT_NON_CUE_BLOCKS.iter().any(|keyword| {
        line.strip_prefix(keyword)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
    })
}

// Any cue boundary, well-formed or not, in either dialect
fn is_timing_line(line: &str) -> bool {
    line.contains("-->")
}

fn is_sequence_number(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| c.is_ascii_digit())
}
