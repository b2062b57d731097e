/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use log::LevelFilter;
use subgrab::app_config::{Config, LogLevel};
use subgrab::format_converter::OutputFormat;
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.resolver.yt_dlp_path, "yt-dlp");
    assert_eq!(config.resolver.timeout_secs, 120);
    assert!(config.resolver.extra_args.is_empty());
    assert_eq!(config.fetch.timeout_secs, 30);
    assert!(config.fetch.user_agent.starts_with("subgrab/"));
    assert_eq!(config.output.directory, ".");
    assert_eq!(config.output.default_format, OutputFormat::Srt);
    assert_eq!(config.output.preferred_language, "en");
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.resolver.yt_dlp_path = "  ".to_string();
    assert!(config.validate().is_err());
    config.resolver.yt_dlp_path = "/usr/local/bin/yt-dlp".to_string();

    config.resolver.timeout_secs = 0;
    assert!(config.validate().is_err());
    config.resolver.timeout_secs = 60;

    config.fetch.timeout_secs = 0;
    assert!(config.validate().is_err());
    config.fetch.timeout_secs = 10;

    config.fetch.user_agent = String::new();
    assert!(config.validate().is_err());
    config.fetch.user_agent = "agent".to_string();

    config.output.preferred_language = "123".to_string();
    assert!(config.validate().is_err());
    config.output.preferred_language = "pt-BR".to_string();

    assert!(config.validate().is_ok());
}

/// Test that partial JSON falls back to defaults for missing fields
#[test]
fn test_config_deserialize_withPartialJson_shouldFillDefaults() -> Result<()> {
    let json = r#"{
        "log_level": "debug",
        "resolver": { "extra_args": ["--geo-bypass"] },
        "output": { "default_format": "txt" }
    }"#;
    let config: Config = serde_json::from_str(json)?;

    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.resolver.yt_dlp_path, "yt-dlp");
    assert_eq!(config.resolver.extra_args, vec!["--geo-bypass"]);
    assert_eq!(config.fetch.timeout_secs, 30);
    assert_eq!(config.output.default_format, OutputFormat::CleanText);
    assert_eq!(config.output.preferred_language, "en");
    Ok(())
}

/// Test that a missing config file is created with defaults
#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;
    assert!(path.exists());

    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.resolver.yt_dlp_path, config.resolver.yt_dlp_path);
    assert_eq!(reloaded.output.default_format, config.output.default_format);
    Ok(())
}

/// Test that an existing config file is read rather than replaced
#[test]
fn test_load_or_create_withExistingFile_shouldReadIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{"output": {"directory": "subs", "preferred_language": "fr"}}"#,
    )?;

    let config = Config::load_or_create(&path)?;
    assert_eq!(config.output.directory, "subs");
    assert_eq!(config.output.preferred_language, "fr");
    Ok(())
}

/// Test that a broken config file is an error
#[test]
fn test_load_or_create_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

/// Test log level mapping
#[test]
fn test_log_level_toLevelFilter_shouldMapEachLevel() {
    assert_eq!(LogLevel::Error.to_level_filter(), LevelFilter::Error);
    assert_eq!(LogLevel::Warn.to_level_filter(), LevelFilter::Warn);
    assert_eq!(LogLevel::Info.to_level_filter(), LevelFilter::Info);
    assert_eq!(LogLevel::Debug.to_level_filter(), LevelFilter::Debug);
    assert_eq!(LogLevel::Trace.to_level_filter(), LevelFilter::Trace);
}
