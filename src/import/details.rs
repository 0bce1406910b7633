//! Garmin activity details decoding
//!
//! A details export stores telemetry as rows of bare numbers; the meaning of
//! each column is given by `metricDescriptors`, which map a metric key such as
//! `sumDistance` to its column index.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::error::{ImportError, Result, RunSplitsError};
use crate::import::{ActivityFileKind, ImportFormat};
use crate::models::RawSample;

pub const DISTANCE_KEY: &str = "sumDistance";
pub const DURATION_KEY: &str = "sumDuration";
pub const HEART_RATE_KEY: &str = "directHeartRate";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDescriptor {
    pub metrics_index: usize,
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricRow {
    #[serde(default)]
    pub metrics: Vec<Option<f64>>,
}

/// Raw shape of a `*_details.json` file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDetails {
    pub metric_descriptors: Vec<MetricDescriptor>,
    #[serde(default)]
    pub activity_detail_metrics: Vec<MetricRow>,
}

impl ActivityDetails {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            ImportError::ParseError {
                format: "details json".to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn column_index(&self) -> HashMap<&str, usize> {
        self.metric_descriptors
            .iter()
            .map(|d| (d.key.as_str(), d.metrics_index))
            .collect()
    }

    /// Normalize the rows into samples, keeping row order
    pub fn to_samples(&self) -> Result<Vec<RawSample>> {
        let columns = self.column_index();
        let required = |key: &str| {
            columns.get(key).copied().ok_or_else(|| ImportError::InvalidStructure {
                reason: format!("no metric descriptor for {}", key),
            })
        };

        let distance_col = required(DISTANCE_KEY)?;
        let duration_col = required(DURATION_KEY)?;
        let hr_col = columns.get(HEART_RATE_KEY).copied();

        let value = |row: &MetricRow, col: usize| row.metrics.get(col).copied().flatten();

        let samples = self
            .activity_detail_metrics
            .iter()
            .enumerate()
            .map(|(i, row)| -> Result<RawSample> {
                let distance = value(row, distance_col).ok_or_else(|| {
                    RunSplitsError::InvalidInput(format!("row {} has no {}", i, DISTANCE_KEY))
                })?;
                let duration = value(row, duration_col).ok_or_else(|| {
                    RunSplitsError::InvalidInput(format!("row {} has no {}", i, DURATION_KEY))
                })?;
                let heart_rate = hr_col.and_then(|col| value(row, col));

                Ok(RawSample::new(distance, duration, heart_rate))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            rows = samples.len(),
            has_heart_rate = hr_col.is_some(),
            "Decoded activity details"
        );
        Ok(samples)
    }
}

/// Importer for `*_details.json` telemetry files
#[derive(Debug, Default)]
pub struct DetailsImporter;

impl DetailsImporter {
    pub fn new() -> Self {
        Self
    }
}

impl ImportFormat for DetailsImporter {
    type Output = Vec<RawSample>;

    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(ActivityFileKind::Details.suffix()))
    }

    fn import_file(&self, file_path: &Path) -> Result<Self::Output> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound {
                path: file_path.to_path_buf(),
            }
            .into());
        }

        let content = std::fs::read_to_string(file_path)?;
        ActivityDetails::from_json(&content)?.to_samples()
    }

    fn get_format_name(&self) -> &'static str {
        "Garmin details"
    }
}
