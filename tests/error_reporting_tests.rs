//! Integration tests for error reporting on bad activity data
//!
//! Covers how import and aggregation failures surface as typed errors with
//! severities and user-facing messages.

use runsplits::error::{ErrorSeverity, ImportError};
use runsplits::import::details::{ActivityDetails, DetailsImporter};
use runsplits::import::{ActivityFile, ImportFormat};
use runsplits::{RawSample, RunSplitsError, SplitAggregator};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_missing_distance_descriptor_is_structural() {
    let json = r#"{
        "metricDescriptors": [{"metricsIndex": 0, "key": "sumDuration"}],
        "activityDetailMetrics": [{"metrics": [10.0]}]
    }"#;

    let err = ActivityDetails::from_json(json)
        .and_then(|details| details.to_samples())
        .unwrap_err();

    assert!(matches!(
        err,
        RunSplitsError::Import(ImportError::InvalidStructure { .. })
    ));
    assert_eq!(err.severity(), ErrorSeverity::Error);
    assert!(err.to_string().contains("sumDistance"));
}

#[test]
fn test_null_distance_row_is_invalid_input() {
    let json = r#"{
        "metricDescriptors": [
            {"metricsIndex": 0, "key": "sumDistance"},
            {"metricsIndex": 1, "key": "sumDuration"}
        ],
        "activityDetailMetrics": [
            {"metrics": [5.0, 2.0]},
            {"metrics": [null, 4.0]}
        ]
    }"#;

    let err = ActivityDetails::from_json(json)
        .and_then(|details| details.to_samples())
        .unwrap_err();

    assert!(matches!(err, RunSplitsError::InvalidInput(_)));
    assert_eq!(err.severity(), ErrorSeverity::Warning);
    assert_eq!(err.severity().to_tracing_level(), tracing::Level::WARN);
    assert!(err.user_message().starts_with("Activity has no usable telemetry"));
}

#[test]
fn test_non_finite_sample_rejected_by_aggregator() {
    let samples = vec![
        RawSample::new(100.0, 30.0, Some(140.0)),
        RawSample::new(f64::NAN, 60.0, Some(141.0)),
    ];

    let err = SplitAggregator::aggregate(&samples).unwrap_err();
    assert!(matches!(err, RunSplitsError::InvalidInput(_)));
    assert!(!err.is_retryable());
}

#[test]
fn test_details_file_without_rows_is_invalid_input() {
    let dir = tempdir().unwrap();
    let path = dir
        .path()
        .join("2024-11-20T14:19:54+00:00_17582889898_details.json");
    fs::write(
        &path,
        r#"{"metricDescriptors": [
            {"metricsIndex": 0, "key": "sumDistance"},
            {"metricsIndex": 1, "key": "sumDuration"}
        ], "activityDetailMetrics": []}"#,
    )
    .unwrap();

    let samples = DetailsImporter::new().import_file(&path).unwrap();
    assert!(samples.is_empty());
    assert!(matches!(
        SplitAggregator::aggregate(&samples),
        Err(RunSplitsError::InvalidInput(_))
    ));
}

#[test]
fn test_missing_file_reports_path() {
    let err = DetailsImporter::new()
        .import_file(Path::new("activities/2024-01-01T00:00:00+00:00_9_details.json"))
        .unwrap_err();

    assert_eq!(err.severity(), ErrorSeverity::Warning);
    assert!(err.user_message().contains("2024-01-01T00:00:00+00:00_9_details.json"));
}

#[test]
fn test_bad_file_name() {
    let err = ActivityFile::from_path(Path::new("yesterday_123_details.json")).unwrap_err();
    assert!(matches!(
        err,
        RunSplitsError::Import(ImportError::BadFileName { .. })
    ));

    let err = ActivityFile::from_path(Path::new("2024-01-01T00:00:00+00:00_9.json")).unwrap_err();
    assert!(err.to_string().contains("Unrecognized activity file name"));
}
