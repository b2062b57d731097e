/*!
 * Integration tests for the download workflow with mock collaborators
 */

use std::sync::Arc;
use anyhow::Result;

use subgrab::app_config::Config;
use subgrab::app_controller::{Controller, DownloadOutcome, TrackSelection};
use subgrab::asset_fetcher::FetchRequest;
use subgrab::errors::{AppError, FetchError, ResolutionError};
use subgrab::format_converter::OutputFormat;
use subgrab::video_resolver::{Credentials, SubtitleCatalog, VideoMetadata};
use crate::common;
use crate::common::mock_collaborators::{metadata, track, MockFetcher, MockResolver};

const VIDEO_URL: &str = "https://www.youtube.com/watch?v=abc123";

fn build_controller(resolver: MockResolver, fetcher: MockFetcher) -> (Controller, Arc<MockResolver>, Arc<MockFetcher>) {
    let resolver = Arc::new(resolver);
    let fetcher = Arc::new(fetcher);
    let controller = Controller::new(Config::default(), resolver.clone(), fetcher.clone());
    (controller, resolver, fetcher)
}

/// Test that a video without tracks yields no subtitles and no fetch
#[tokio::test]
async fn test_prepare_download_withEmptyCatalog_shouldReturnNoSubtitlesWithoutFetching() -> Result<()> {
    let empty = VideoMetadata {
        title: "Silent film".to_string(),
        subtitles: SubtitleCatalog::new(),
        automatic_captions: SubtitleCatalog::new(),
        ..Default::default()
    };
    let (controller, resolver, fetcher) = build_controller(MockResolver::new(empty), MockFetcher::new("unused", None));

    for format in [OutputFormat::Srt, OutputFormat::Vtt, OutputFormat::CleanText] {
        let outcome = controller
            .prepare_download(VIDEO_URL, &TrackSelection::default(), format, None)
            .await?;
        assert_eq!(outcome, DownloadOutcome::NoSubtitlesAvailable);
    }

    assert_eq!(resolver.calls().lock().unwrap().len(), 3);
    assert!(fetcher.requests().lock().unwrap().is_empty());
    Ok(())
}

/// Test that clean text output fetches the WebVTT rendition
#[tokio::test]
async fn test_prepare_download_withCleanText_shouldFetchVttAndClean() -> Result<()> {
    let (controller, _, fetcher) = build_controller(
        MockResolver::new(metadata("Bad:Name/Test?\"", &["en"], &[])),
        MockFetcher::new(common::EXAMPLE_VTT, Some("vtt")),
    );

    let outcome = controller
        .prepare_download(VIDEO_URL, &TrackSelection::default(), OutputFormat::CleanText, None)
        .await?;

    let DownloadOutcome::Ready(artifact) = outcome else {
        panic!("Expected an artifact");
    };
    assert_eq!(artifact.file_name, "BadNameTest.txt");
    assert_eq!(artifact.data, b"Hello world\nSecond line");
    assert_eq!(artifact.language, "en");
    assert!(!artifact.is_automatic);

    let requests = fetcher.requests();
    let requests = requests.lock().unwrap();
    assert_eq!(requests.as_slice(), &[FetchRequest::Locator("https://example.com/en.vtt".to_string())]);
    Ok(())
}

/// Test conversion when only a WebVTT rendition exists
#[tokio::test]
async fn test_prepare_download_withOnlyVttRendition_shouldConvertToSrt() -> Result<()> {
    let mut subtitles = SubtitleCatalog::new();
    subtitles.insert("en", track("vtt", false, Some("https://example.com/en.vtt")));
    let video = VideoMetadata {
        title: "Talk".to_string(),
        subtitles,
        ..Default::default()
    };
    let (controller, _, _) = build_controller(MockResolver::new(video), MockFetcher::new(common::EXAMPLE_VTT, Some("vtt")));

    let outcome = controller
        .prepare_download(VIDEO_URL, &TrackSelection::default(), OutputFormat::Srt, None)
        .await?;

    match outcome {
        DownloadOutcome::Ready(artifact) => {
            assert_eq!(artifact.file_name, "Talk.srt");
            assert_eq!(artifact.mime_type, "text/srt");
            assert_eq!(String::from_utf8(artifact.data)?, common::EXAMPLE_SRT);
        }
        other => panic!("Expected an artifact, got {:?}", other),
    }
    Ok(())
}

/// Test that tracks without a direct URL are downloaded through the extractor
#[tokio::test]
async fn test_prepare_download_withoutLocator_shouldRequestDownload() -> Result<()> {
    let mut automatic_captions = SubtitleCatalog::new();
    automatic_captions.insert("de", track("vtt", true, None));
    let video = VideoMetadata {
        title: "Vortrag".to_string(),
        automatic_captions,
        ..Default::default()
    };
    let (controller, resolver, fetcher) =
        build_controller(MockResolver::new(video), MockFetcher::new(common::SAMPLE_VTT, Some("vtt")));
    let credentials = Credentials::from_cookie_file("/tmp/cookies.txt");
    let selection = TrackSelection {
        language: Some("deu".to_string()),
        automatic: None,
    };

    let outcome = controller
        .prepare_download(VIDEO_URL, &selection, OutputFormat::Vtt, Some(&credentials))
        .await?;

    let DownloadOutcome::Ready(artifact) = outcome else {
        panic!("Expected an artifact");
    };
    assert_eq!(artifact.file_name, "Vortrag.vtt");
    assert_eq!(artifact.data, common::SAMPLE_VTT.as_bytes());
    assert!(artifact.is_automatic);

    assert_eq!(resolver.calls().lock().unwrap()[0], (VIDEO_URL.to_string(), true));
    let requests = fetcher.requests();
    let requests = requests.lock().unwrap();
    assert_eq!(
        requests[0],
        FetchRequest::Download {
            url: VIDEO_URL.to_string(),
            language: "de".to_string(),
            automatic: true,
            preferred_extension: "vtt".to_string(),
            credentials: Some(credentials.clone()),
        }
    );
    Ok(())
}

/// Test that the extension actually fetched drives the rendering
#[tokio::test]
async fn test_prepare_download_withFallbackSrtFile_shouldRenumberSrt() -> Result<()> {
    let mut subtitles = SubtitleCatalog::new();
    subtitles.insert("en", track("vtt", false, None));
    let video = VideoMetadata {
        title: "Talk".to_string(),
        subtitles,
        ..Default::default()
    };
    let (controller, _, _) = build_controller(MockResolver::new(video), MockFetcher::new(common::SAMPLE_SRT, Some("srt")));

    let outcome = controller
        .prepare_download(VIDEO_URL, &TrackSelection::default(), OutputFormat::Srt, None)
        .await?;

    let DownloadOutcome::Ready(artifact) = outcome else {
        panic!("Expected an artifact");
    };
    let srt = String::from_utf8(artifact.data)?;
    assert!(srt.starts_with("1\n00:00:01,000 --> 00:00:04,000\n"));
    assert!(srt.contains("\n\n3\n"));
    Ok(())
}

/// Test that a missing language is reported, not fetched
#[tokio::test]
async fn test_prepare_download_withUnknownLanguage_shouldReturnTrackNotFound() {
    let (controller, _, fetcher) = build_controller(
        MockResolver::new(metadata("Talk", &["en"], &["fr"])),
        MockFetcher::new(common::EXAMPLE_VTT, Some("vtt")),
    );
    let selection = TrackSelection {
        language: Some("ja".to_string()),
        automatic: None,
    };

    let result = controller
        .prepare_download(VIDEO_URL, &selection, OutputFormat::Srt, None)
        .await;

    assert!(matches!(result, Err(AppError::TrackNotFound { .. })));
    assert!(fetcher.requests().lock().unwrap().is_empty());
}

/// Test that resolver errors surface unchanged
#[tokio::test]
async fn test_prepare_download_withDeniedAccess_shouldSurfaceResolutionError() {
    let (controller, _, fetcher) = build_controller(
        MockResolver::denying("Sign in to confirm your age"),
        MockFetcher::new(common::EXAMPLE_VTT, Some("vtt")),
    );

    let result = controller
        .prepare_download(VIDEO_URL, &TrackSelection::default(), OutputFormat::Srt, None)
        .await;

    match result {
        Err(AppError::Resolution(ResolutionError::AccessDenied(message))) => {
            assert_eq!(message, "Sign in to confirm your age");
        }
        other => panic!("Expected access denied, got {:?}", other),
    }
    assert!(fetcher.requests().lock().unwrap().is_empty());
}

/// Test that fetch errors surface unchanged
#[tokio::test]
async fn test_prepare_download_withFetchFailure_shouldSurfaceFetchError() {
    let (controller, _, _) = build_controller(MockResolver::new(metadata("Talk", &["en"], &[])), MockFetcher::failing(403));

    let result = controller
        .prepare_download(VIDEO_URL, &TrackSelection::default(), OutputFormat::Srt, None)
        .await;

    assert!(matches!(
        result,
        Err(AppError::Fetch(FetchError::Status { status_code: 403, .. }))
    ));
}

/// Test download followed by saving to disk
#[tokio::test]
async fn test_download_and_save_withOutputDir_shouldWriteFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let (controller, _, _) = build_controller(
        MockResolver::new(metadata("Episode 1: Pilot", &["en"], &[])),
        MockFetcher::new(common::EXAMPLE_VTT, Some("vtt")),
    );

    let outcome = controller
        .prepare_download(VIDEO_URL, &TrackSelection::default(), OutputFormat::Vtt, None)
        .await?;
    let DownloadOutcome::Ready(artifact) = outcome else {
        panic!("Expected an artifact");
    };

    let path = controller
        .save_artifact(&artifact, temp_dir.path(), false)?
        .expect("file should be written");
    assert_eq!(path, temp_dir.path().join("Episode 1 Pilot.vtt"));
    assert_eq!(std::fs::read_to_string(path)?, common::EXAMPLE_VTT);
    Ok(())
}
