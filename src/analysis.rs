//! Single-activity and batch split analysis
//!
//! Batch analysis runs independent activity files in parallel with rayon.
//! A file that fails to load, or that has no valid split past the warm-up,
//! is logged and skipped so one bad download never aborts the batch.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::import::details::DetailsImporter;
use crate::import::{collect_activity_files, ActivityFile, ActivityFileKind, ImportFormat};
use crate::models::{format_pace, FastestSplitResult, RawSample, SplitRecord, METERS_PER_KM};
use crate::splits::{fastest_split, SplitAggregator, DEFAULT_WARMUP_KM};

/// Per-kilometer breakdown of one activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityReport {
    pub splits: Vec<SplitRecord>,
    /// Furthest cumulative distance reached, in km
    pub total_distance_km: f64,
}

impl ActivityReport {
    /// Highest kilometer bucket reached
    pub fn last_km(&self) -> Option<i64> {
        self.splits.last().map(|s| s.km_index)
    }
}

/// Aggregate one activity's samples into its split report
pub fn analyze_activity(samples: &[RawSample]) -> Result<ActivityReport> {
    let splits = SplitAggregator::aggregate(samples)?;
    let total_distance_km = samples
        .iter()
        .map(|s| s.cumulative_distance_meters)
        .fold(0.0, f64::max)
        / METERS_PER_KM;

    Ok(ActivityReport {
        splits,
        total_distance_km,
    })
}

/// Load and aggregate a single details file
pub fn analyze_details_file(path: &Path) -> Result<ActivityReport> {
    let samples = DetailsImporter::new().import_file(path)?;
    analyze_activity(&samples)
}

/// Fastest split of one cached activity, `None` when no split survives the filter
pub fn fastest_split_for_file(
    file: &ActivityFile,
    min_index: i64,
) -> Result<Option<FastestSplitResult>> {
    let report = analyze_details_file(&file.path)?;

    Ok(fastest_split(&report.splits, min_index).and_then(|split| {
        let pace = split.pace_min_per_km?;
        Some(FastestSplitResult {
            timestamp: file.timestamp,
            activity_id: file.activity_id.clone(),
            distance_km: report.total_distance_km,
            fastest_km: split.km_index,
            fastest_pace: pace,
            fastest_pace_str: format_pace(pace),
            hr_at_fastest: split.mean_heart_rate,
        })
    }))
}

/// Batch analysis settings
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Kilometers below this index are never the fastest split
    pub min_index: i64,
    /// Show progress bar during analysis
    pub show_progress: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            min_index: DEFAULT_WARMUP_KM,
            show_progress: true,
        }
    }
}

/// Why an activity produced no result
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Loading or aggregation failed
    Failed(String),
    /// No split survived the validity and warm-up filter
    NoValidSplits,
}

/// Outcome of a batch run
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// Total files found
    pub total_files: usize,
    /// One entry per usable activity, ordered by start time
    pub results: Vec<FastestSplitResult>,
    /// Files that produced no result
    pub skipped: Vec<(PathBuf, SkipReason)>,
    /// Wall time in milliseconds
    pub duration_ms: u128,
}

impl BatchSummary {
    pub fn failed_count(&self) -> usize {
        self.skipped
            .iter()
            .filter(|(_, reason)| matches!(reason, SkipReason::Failed(_)))
            .count()
    }
}

/// Fastest split of every details file in `dir`
pub fn analyze_multiple_activities(dir: &Path, config: &BatchConfig) -> Result<BatchSummary> {
    let start = Instant::now();
    let files = collect_activity_files(dir, ActivityFileKind::Details)?;
    info!(
        "Analyzing {} details files from directory \"{}\"",
        files.len(),
        dir.display()
    );

    let pb = if config.show_progress {
        let pb = ProgressBar::new(files.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let outcomes: Vec<(&ActivityFile, Result<Option<FastestSplitResult>>)> = files
        .par_iter()
        .map(|file| {
            let outcome = fastest_split_for_file(file, config.min_index);
            pb.inc(1);
            (file, outcome)
        })
        .collect();
    pb.finish_and_clear();

    let mut results = Vec::new();
    let mut skipped = Vec::new();
    for (file, outcome) in outcomes {
        match outcome {
            Ok(Some(result)) => {
                debug!(
                    activity = %file.activity_id,
                    km = result.fastest_km,
                    pace = %result.fastest_pace_str,
                    "Fastest split"
                );
                results.push(result);
            }
            Ok(None) => {
                warn!(
                    "No valid splits found after km {} in {}",
                    config.min_index,
                    file.path.display()
                );
                skipped.push((file.path.clone(), SkipReason::NoValidSplits));
            }
            Err(e) => {
                warn!("Error processing {}: {}", file.path.display(), e);
                skipped.push((file.path.clone(), SkipReason::Failed(e.to_string())));
            }
        }
    }

    results.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let summary = BatchSummary {
        total_files: files.len(),
        results,
        skipped,
        duration_ms: start.elapsed().as_millis(),
    };
    info!(
        analyzed = summary.results.len(),
        skipped = summary.skipped.len(),
        failed = summary.failed_count(),
        duration_ms = summary.duration_ms as u64,
        "Batch analysis complete"
    );

    Ok(summary)
}
