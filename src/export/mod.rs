use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

use crate::models::{ActivitySummary, FastestSplitResult, SplitRecord};
use crate::trends::{centered_rolling_mean, rolling_mean, LinearTrend, SeriesStatistics};

pub mod csv;
pub mod json;
pub mod text;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Text,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Result<Self, ExportError> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "text" | "txt" => Ok(ExportFormat::Text),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }

    /// Guess the format from an output file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| Self::from_str(ext).ok())
    }
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

impl From<::csv::Error> for ExportError {
    fn from(err: ::csv::Error) -> Self {
        ExportError::SerializationError(err.to_string())
    }
}

/// One kilometer of a split table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitRow {
    pub km: i64,
    pub distance_km: f64,
    pub duration_min: f64,
    pub pace_min_per_km: Option<f64>,
    pub pace: String,
    pub avg_heart_rate: Option<f64>,
}

impl From<&SplitRecord> for SplitRow {
    fn from(record: &SplitRecord) -> Self {
        SplitRow {
            km: record.km_index,
            distance_km: record.interval_distance_km,
            duration_min: record.interval_duration_minutes,
            pace_min_per_km: record.pace_min_per_km,
            pace: record.pace_label(),
            avg_heart_rate: record.mean_heart_rate,
        }
    }
}

/// One activity of a fastest-split report, with smoothed values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FastestSplitRow {
    pub timestamp: DateTime<FixedOffset>,
    pub activity_id: String,
    pub distance_km: f64,
    pub fastest_km: i64,
    pub fastest_pace: f64,
    pub fastest_pace_str: String,
    pub hr_at_fastest: Option<f64>,
    pub rolling_pace: Option<f64>,
    pub rolling_hr: Option<f64>,
}

/// Fastest split of each activity plus trends over the whole series
#[derive(Debug, Clone, Serialize)]
pub struct FastestSplitReport {
    pub window: usize,
    pub min_km: i64,
    pub rows: Vec<FastestSplitRow>,
    pub pace_stats: Option<SeriesStatistics>,
    pub pace_trend: Option<LinearTrend>,
}

impl FastestSplitReport {
    /// Attach trailing rolling means over `window` activities
    pub fn build(results: &[FastestSplitResult], window: usize, min_km: i64) -> Self {
        let paces: Vec<Option<f64>> = results.iter().map(|r| Some(r.fastest_pace)).collect();
        let heart_rates: Vec<Option<f64>> = results.iter().map(|r| r.hr_at_fastest).collect();
        let rolling_paces = rolling_mean(&paces, window);
        let rolling_hrs = rolling_mean(&heart_rates, window);

        let rows = results
            .iter()
            .zip(rolling_paces.into_iter().zip(rolling_hrs))
            .map(|(r, (rolling_pace, rolling_hr))| FastestSplitRow {
                timestamp: r.timestamp,
                activity_id: r.activity_id.clone(),
                distance_km: r.distance_km,
                fastest_km: r.fastest_km,
                fastest_pace: r.fastest_pace,
                fastest_pace_str: r.fastest_pace_str.clone(),
                hr_at_fastest: r.hr_at_fastest,
                rolling_pace,
                rolling_hr,
            })
            .collect();

        let pace_values: Vec<f64> = results.iter().map(|r| r.fastest_pace).collect();
        let pace_points: Vec<_> = results.iter().map(|r| (r.timestamp, r.fastest_pace)).collect();

        Self {
            window,
            min_km,
            rows,
            pace_stats: SeriesStatistics::from_values(&pace_values),
            pace_trend: LinearTrend::fit(&pace_points),
        }
    }
}

/// Average pace and heart rate trends over many activities
#[derive(Debug, Clone, Serialize)]
pub struct PaceTrendReport {
    pub activities: Vec<ActivityTrendRow>,
    pub pace_stats: Option<SeriesStatistics>,
    pub pace_trend: Option<LinearTrend>,
    pub heart_rate_stats: Option<SeriesStatistics>,
    pub heart_rate_trend: Option<LinearTrend>,
    /// Activities lacking heart rate data
    pub missing_heart_rate: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityTrendRow {
    pub timestamp: DateTime<FixedOffset>,
    pub name: String,
    pub pace_min_per_km: Option<f64>,
    pub heart_rate: Option<f64>,
    pub smoothed_pace: Option<f64>,
    pub smoothed_heart_rate: Option<f64>,
}

impl PaceTrendReport {
    /// Build from summaries ordered by time, smoothing with a centered window
    pub fn build(activities: &[ActivitySummary], window: usize) -> Self {
        let paces: Vec<Option<f64>> = activities.iter().map(|a| a.pace_min_per_km()).collect();
        let heart_rates: Vec<Option<f64>> =
            activities.iter().map(|a| a.average_heart_rate).collect();
        let smoothed_paces = centered_rolling_mean(&paces, window);
        let smoothed_hrs = centered_rolling_mean(&heart_rates, window);

        let rows = activities
            .iter()
            .enumerate()
            .map(|(i, a)| ActivityTrendRow {
                timestamp: a.timestamp,
                name: a.name.clone(),
                pace_min_per_km: paces[i],
                heart_rate: heart_rates[i],
                smoothed_pace: smoothed_paces[i],
                smoothed_heart_rate: smoothed_hrs[i],
            })
            .collect();

        let pace_points: Vec<_> = activities
            .iter()
            .filter_map(|a| a.pace_min_per_km().map(|p| (a.timestamp, p)))
            .collect();
        let hr_points: Vec<_> = activities
            .iter()
            .filter_map(|a| a.average_heart_rate.map(|hr| (a.timestamp, hr)))
            .collect();
        let pace_values: Vec<f64> = pace_points.iter().map(|(_, p)| *p).collect();
        let hr_values: Vec<f64> = hr_points.iter().map(|(_, hr)| *hr).collect();

        Self {
            activities: rows,
            pace_stats: SeriesStatistics::from_values(&pace_values),
            pace_trend: LinearTrend::fit(&pace_points),
            heart_rate_stats: SeriesStatistics::from_values(&hr_values),
            heart_rate_trend: LinearTrend::fit(&hr_points),
            missing_heart_rate: activities.len() - hr_points.len(),
        }
    }
}

/// Write any report in the requested format
pub struct ExportManager;

impl ExportManager {
    pub fn export_splits<P: AsRef<Path>>(
        splits: &[SplitRecord],
        format: ExportFormat,
        output_path: P,
    ) -> Result<(), ExportError> {
        let rows: Vec<SplitRow> = splits.iter().map(SplitRow::from).collect();
        match format {
            ExportFormat::Csv => csv::export_rows(&rows, output_path),
            ExportFormat::Json => json::export_json(&rows, output_path),
            ExportFormat::Text => {
                let mut file = std::fs::File::create(output_path)?;
                text::write_split_table(&mut file, &rows)
            }
        }
    }

    pub fn export_fastest_splits<P: AsRef<Path>>(
        report: &FastestSplitReport,
        format: ExportFormat,
        output_path: P,
    ) -> Result<(), ExportError> {
        if report.rows.is_empty() {
            return Err(ExportError::InsufficientData(
                "no activities with valid splits".to_string(),
            ));
        }

        match format {
            ExportFormat::Csv => csv::export_rows(&report.rows, output_path),
            ExportFormat::Json => json::export_json(report, output_path),
            ExportFormat::Text => {
                let mut file = std::fs::File::create(output_path)?;
                text::write_fastest_split_report(&mut file, report)
            }
        }
    }

    pub fn export_pace_trend<P: AsRef<Path>>(
        report: &PaceTrendReport,
        format: ExportFormat,
        output_path: P,
    ) -> Result<(), ExportError> {
        match format {
            ExportFormat::Csv => csv::export_rows(&report.activities, output_path),
            ExportFormat::Json => json::export_json(report, output_path),
            ExportFormat::Text => {
                let mut file = std::fs::File::create(output_path)?;
                text::write_pace_trend_report(&mut file, report, true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::format_pace;

    fn result(day: u32, pace: f64, hr: Option<f64>) -> FastestSplitResult {
        FastestSplitResult {
            timestamp: DateTime::parse_from_rfc3339(&format!("2024-11-{:02}T07:00:00+00:00", day))
                .unwrap(),
            activity_id: day.to_string(),
            distance_km: 8.0,
            fastest_km: 4,
            fastest_pace: pace,
            fastest_pace_str: format_pace(pace),
            hr_at_fastest: hr,
        }
    }

    #[test]
    fn test_export_format_parsing() {
        assert_eq!(ExportFormat::from_str("CSV").unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_str("txt").unwrap(), ExportFormat::Text);
        assert!(ExportFormat::from_str("pdf").is_err());
        assert_eq!(ExportFormat::from_path(Path::new("out.json")), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_path(Path::new("out")), None);
    }

    #[test]
    fn test_fastest_split_report_rolling_means() {
        let results = vec![
            result(1, 6.0, Some(160.0)),
            result(2, 5.0, None),
            result(3, 4.0, Some(170.0)),
        ];

        let report = FastestSplitReport::build(&results, 2, 2);
        assert_eq!(report.rows[0].rolling_pace, Some(6.0));
        assert_eq!(report.rows[1].rolling_pace, Some(5.5));
        assert_eq!(report.rows[2].rolling_pace, Some(4.5));
        assert_eq!(report.rows[1].rolling_hr, Some(160.0));
        assert_eq!(report.rows[2].rolling_hr, Some(170.0));
        assert_eq!(report.pace_trend.unwrap().pace_direction(), "improving");
        assert_eq!(report.pace_stats.unwrap().min, 4.0);
    }

    #[test]
    fn test_pace_trend_report_counts_missing_heart_rate() {
        let summary = |day: u32, speed: f64, hr: Option<f64>| ActivitySummary {
            timestamp: DateTime::parse_from_rfc3339(&format!("2024-11-{:02}T07:00:00+00:00", day))
                .unwrap(),
            activity_id: None,
            name: format!("Run {}", day),
            activity_type: Some("running".to_string()),
            average_speed_mps: Some(speed),
            average_pace_min_per_km: None,
            average_heart_rate: hr,
        };

        let activities = vec![
            summary(1, 2.5, Some(150.0)),
            summary(2, 2.6, None),
            summary(3, 2.7, Some(148.0)),
        ];

        let report = PaceTrendReport::build(&activities, 3);
        assert_eq!(report.missing_heart_rate, 1);
        assert_eq!(report.heart_rate_stats.unwrap().count, 2);
        assert!(report.activities[1].smoothed_pace.is_some());
        assert_eq!(report.activities[1].smoothed_heart_rate, None);
        assert_eq!(report.pace_trend.unwrap().pace_direction(), "improving");
    }

    #[test]
    fn test_empty_fastest_split_report_is_not_exported() {
        let report = FastestSplitReport::build(&[], 5, 2);
        let dir = tempfile::tempdir().unwrap();
        let result = ExportManager::export_fastest_splits(
            &report,
            ExportFormat::Csv,
            dir.path().join("out.csv"),
        );
        assert!(matches!(result, Err(ExportError::InsufficientData(_))));
    }
}
