//! Garmin activity summary decoding
//!
//! Summary exports carry whole-activity averages. Only running activities
//! with an average speed are kept; everything else is skipped with a log line.

use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{ImportError, Result};
use crate::import::{collect_activity_files, ActivityFile, ActivityFileKind, ImportFormat};
use crate::models::ActivitySummary;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityTypeDto {
    type_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDto {
    average_speed: Option<f64>,
    #[serde(rename = "averageHR")]
    average_hr: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryJson {
    activity_name: Option<String>,
    #[serde(rename = "activityTypeDTO", default)]
    activity_type: ActivityTypeDto,
    #[serde(rename = "summaryDTO", default)]
    summary: SummaryDto,
}

/// Importer for `*_summary.json` files
#[derive(Debug, Default)]
pub struct SummaryImporter;

impl SummaryImporter {
    pub fn new() -> Self {
        Self
    }

    /// Decode one summary document, taking start time and id from the file name
    pub fn parse(file: &ActivityFile, json: &str) -> Result<ActivitySummary> {
        let raw: SummaryJson = serde_json::from_str(json).map_err(|e| ImportError::ParseError {
            format: "summary json".to_string(),
            reason: e.to_string(),
        })?;

        Ok(ActivitySummary {
            timestamp: file.timestamp,
            activity_id: Some(file.activity_id.clone()),
            name: raw.activity_name.unwrap_or_else(|| "Unknown".to_string()),
            activity_type: raw.activity_type.type_key,
            average_speed_mps: raw.summary.average_speed,
            average_pace_min_per_km: None,
            average_heart_rate: raw.summary.average_hr,
        })
    }
}

impl ImportFormat for SummaryImporter {
    type Output = ActivitySummary;

    fn can_import(&self, file_path: &Path) -> bool {
        ActivityFile::from_path(file_path)
            .is_ok_and(|file| file.kind == ActivityFileKind::Summary)
    }

    fn import_file(&self, file_path: &Path) -> Result<Self::Output> {
        let file = ActivityFile::from_path(file_path)?;
        let content = std::fs::read_to_string(file_path)?;
        Self::parse(&file, &content)
    }

    fn get_format_name(&self) -> &'static str {
        "Garmin summary"
    }
}

/// Load every running activity with an average speed, ordered by start time
pub fn load_running_activities(dir: &Path) -> Result<Vec<ActivitySummary>> {
    let files = collect_activity_files(dir, ActivityFileKind::Summary)?;
    info!("Found {} summary files", files.len());

    let importer = SummaryImporter::new();
    let mut running_count = 0;
    let mut activities = Vec::new();

    for file in &files {
        let summary = match importer.import_file(&file.path) {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Error processing {}: {}", file.path.display(), e);
                continue;
            }
        };

        if !summary.is_running() {
            continue;
        }
        running_count += 1;

        if summary.pace_min_per_km().is_none() {
            warn!("No average speed found for {}", file.path.display());
            continue;
        }
        activities.push(summary);
    }

    info!(
        "Found {} running activities, {} with speed data",
        running_count,
        activities.len()
    );

    activities.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    Ok(activities)
}
