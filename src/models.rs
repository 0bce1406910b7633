use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Meters per kilometer
pub const METERS_PER_KM: f64 = 1000.0;

/// Seconds per minute
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// Individual telemetry reading from an activity's time series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Distance covered since activity start in meters
    pub cumulative_distance_meters: f64,

    /// Elapsed time since activity start in seconds
    pub cumulative_duration_seconds: f64,

    /// Heart rate in beats per minute
    pub heart_rate: Option<f64>,
}

impl RawSample {
    pub fn new(distance_meters: f64, duration_seconds: f64, heart_rate: Option<f64>) -> Self {
        Self {
            cumulative_distance_meters: distance_meters,
            cumulative_duration_seconds: duration_seconds,
            heart_rate,
        }
    }

    /// Integer kilometer bucket this sample falls into
    pub fn km_index(&self) -> i64 {
        (self.cumulative_distance_meters / METERS_PER_KM).floor() as i64
    }
}

/// Aggregated statistics for one integer kilometer bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRecord {
    /// Zero-based kilometer bucket
    pub km_index: i64,

    /// Mean heart rate over samples in the bucket
    pub mean_heart_rate: Option<f64>,

    /// Distance covered since the previous bucket's boundary, in km
    pub interval_distance_km: f64,

    /// Time taken since the previous bucket's boundary, in minutes
    pub interval_duration_minutes: f64,

    /// Split pace in minutes per kilometer, absent when undefined
    pub pace_min_per_km: Option<f64>,

    /// Cumulative distance at the bucket's last sample
    pub boundary_distance_meters: f64,

    /// Cumulative duration at the bucket's last sample
    pub boundary_duration_seconds: f64,
}

impl SplitRecord {
    /// Pace rendered as `MM:SS`, or `--` when undefined
    pub fn pace_label(&self) -> String {
        self.pace_min_per_km
            .map(format_pace)
            .unwrap_or_else(|| "--".to_string())
    }
}

/// Average metrics for one activity, read from a summary export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    /// Activity start time
    pub timestamp: DateTime<FixedOffset>,

    /// Provider activity identifier
    pub activity_id: Option<String>,

    /// Display name of the activity
    pub name: String,

    /// Provider activity type key (e.g. "running")
    pub activity_type: Option<String>,

    /// Average speed in meters per second
    pub average_speed_mps: Option<f64>,

    /// Average pace in minutes per kilometer, when given directly
    pub average_pace_min_per_km: Option<f64>,

    /// Average heart rate in beats per minute
    pub average_heart_rate: Option<f64>,
}

impl ActivitySummary {
    /// Average pace in minutes per kilometer
    pub fn pace_min_per_km(&self) -> Option<f64> {
        if let Some(pace) = self.average_pace_min_per_km {
            return (pace.is_finite() && pace > 0.0).then_some(pace);
        }

        self.average_speed_mps
            .filter(|speed| speed.is_finite() && *speed > 0.0)
            .map(|speed| METERS_PER_KM / (speed * SECONDS_PER_MINUTE))
    }

    pub fn is_running(&self) -> bool {
        self.activity_type.as_deref() == Some("running")
    }
}

/// Fastest eligible kilometer of one activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastestSplitResult {
    pub timestamp: DateTime<FixedOffset>,
    pub activity_id: String,
    /// Total distance of the activity in km
    pub distance_km: f64,
    pub fastest_km: i64,
    /// Pace of the fastest split in min/km
    pub fastest_pace: f64,
    pub fastest_pace_str: String,
    pub hr_at_fastest: Option<f64>,
}

/// Format decimal minutes per kilometer as `MM:SS`
pub fn format_pace(pace_min_per_km: f64) -> String {
    if !pace_min_per_km.is_finite() || pace_min_per_km < 0.0 {
        return "--".to_string();
    }

    let total_seconds = (pace_min_per_km * SECONDS_PER_MINUTE).round() as u64;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Parse `M:SS` pace text into decimal minutes
pub fn parse_pace(text: &str) -> Option<f64> {
    let (minutes, seconds) = text.trim().split_once(':')?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    let seconds: u32 = seconds.trim().parse().ok()?;
    if seconds >= 60 {
        return None;
    }
    Some(minutes as f64 + seconds as f64 / SECONDS_PER_MINUTE)
}
