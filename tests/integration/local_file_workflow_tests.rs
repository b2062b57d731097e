/*!
 * Integration tests for converting and cleaning local subtitle files
 */

use std::fs;
use anyhow::Result;

use subgrab::app_controller::Controller;
use subgrab::subtitle_processor::SubtitleDocument;
use crate::common;

/// Test converting a WebVTT file next to itself
#[test]
fn test_convert_file_withVttFile_shouldWriteSrtBesideIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_vtt(temp_dir.path(), "talk.vtt")?;

    let output = Controller::convert_file(&input, None, false)?;

    assert_eq!(output, temp_dir.path().join("talk.srt"));
    let srt = fs::read_to_string(&output)?;
    assert_eq!(SubtitleDocument::parse(&srt).len(), 3);
    assert!(srt.starts_with("1\n00:00:01,000 --> 00:00:03,500\n"));
    Ok(())
}

/// Test that an existing output is protected unless forced
#[test]
fn test_convert_file_withExistingOutput_shouldRequireForce() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "talk.vtt", common::EXAMPLE_VTT)?;
    let existing = common::create_test_file(temp_dir.path(), "talk.srt", "keep me")?;

    assert!(Controller::convert_file(&input, None, false).is_err());
    assert_eq!(fs::read_to_string(&existing)?, "keep me");

    Controller::convert_file(&input, None, true)?;
    assert_eq!(fs::read_to_string(&existing)?, common::EXAMPLE_SRT);
    Ok(())
}

/// Test renumbering an SRT file into an explicit output
#[test]
fn test_convert_file_withSrtFile_shouldRenumber() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "messy.srt", common::SAMPLE_SRT)?;
    let target = temp_dir.path().join("out").join("clean.srt");

    let output = Controller::convert_file(&input, Some(target.as_path()), false)?;

    assert_eq!(output, target);
    let srt = fs::read_to_string(&target)?;
    let numbers: Vec<&str> = srt.split("\n\n").filter_map(|block| block.lines().next()).collect();
    assert_eq!(numbers, vec!["1", "2", "3"]);
    Ok(())
}

/// Test cleaning a WebVTT file with a BOM and CRLF line endings
#[test]
fn test_clean_file_withCrlfVtt_shouldWriteTranscript() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let content = format!("\u{FEFF}{}", common::SAMPLE_VTT.replace('\n', "\r\n"));
    let input = common::create_test_file(temp_dir.path(), "talk.vtt", &content)?;

    let output = Controller::clean_file(&input, None, false)?;

    assert_eq!(output, temp_dir.path().join("talk.txt"));
    assert_eq!(
        fs::read_to_string(&output)?,
        "Welcome to the show\nSecond cue\nspans two lines\nFinal words"
    );
    Ok(())
}

/// Test that a missing input file is an error
#[test]
fn test_clean_file_withMissingInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let result = Controller::clean_file(&temp_dir.path().join("missing.vtt"), None, false);
    assert!(result.is_err());
    Ok(())
}
