//! Trend statistics over activity series
//!
//! Descriptive statistics, least-squares linear trends against calendar time
//! and rolling means used to smooth pace and heart rate across activities.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use statrs::statistics::Statistics;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Descriptive statistics of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStatistics {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SeriesStatistics {
    /// Statistics over the finite values, `None` when there are none
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }

        Some(Self {
            count: finite.len(),
            mean: finite.iter().mean(),
            std_dev: finite.iter().population_std_dev(),
            min: finite.iter().copied().fold(f64::INFINITY, f64::min),
            max: finite.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Least-squares line `value = intercept + slope_per_day * days`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearTrend {
    /// Change in value per day
    pub slope_per_day: f64,
    /// Fitted value at the first timestamp
    pub intercept: f64,
    /// Start of the fitted series
    pub origin: DateTime<FixedOffset>,
}

impl LinearTrend {
    /// Fit a line through `(timestamp, value)` points.
    ///
    /// Needs at least two points at distinct times.
    pub fn fit(points: &[(DateTime<FixedOffset>, f64)]) -> Option<Self> {
        let points: Vec<&(DateTime<FixedOffset>, f64)> =
            points.iter().filter(|(_, v)| v.is_finite()).collect();
        let origin = points.iter().map(|(t, _)| *t).min()?;
        if points.len() < 2 {
            return None;
        }

        let days: Vec<f64> = points
            .iter()
            .map(|(t, _)| (*t - origin).num_seconds() as f64 / SECONDS_PER_DAY)
            .collect();
        let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();

        let x_mean = days.iter().mean();
        let y_mean = values.iter().mean();

        let (sxy, sxx) = days
            .iter()
            .zip(&values)
            .fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
                let dx = x - x_mean;
                (sxy + dx * (y - y_mean), sxx + dx * dx)
            });

        if sxx <= f64::EPSILON {
            return None;
        }

        let slope_per_day = sxy / sxx;
        Some(Self {
            slope_per_day,
            intercept: y_mean - slope_per_day * x_mean,
            origin,
        })
    }

    /// Fitted value at `timestamp`
    pub fn value_at(&self, timestamp: DateTime<FixedOffset>) -> f64 {
        let days = (timestamp - self.origin).num_seconds() as f64 / SECONDS_PER_DAY;
        self.intercept + self.slope_per_day * days
    }

    /// Direction label for a pace series (lower pace is faster)
    pub fn pace_direction(&self) -> &'static str {
        if self.slope_per_day < 0.0 {
            "improving"
        } else {
            "declining"
        }
    }

    /// Direction label for a heart rate series
    pub fn heart_rate_direction(&self) -> &'static str {
        if self.slope_per_day > 0.0 {
            "increasing"
        } else {
            "decreasing"
        }
    }
}

/// Trailing mean over up to `window` values ending at each position.
///
/// Absent values are skipped; a position is `None` only when its whole window
/// is absent.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);

    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            mean_of_present(&values[start..=i])
        })
        .collect()
}

/// Mean over a full window centered on each position.
///
/// Positions whose window runs off either end, or contains an absent value,
/// are `None`. Even windows reach one further back than forward.
pub fn centered_rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    let back = window / 2;

    (0..values.len())
        .map(|i| {
            let start = i.checked_sub(back)?;
            let end = start + window;
            let slice = values.get(start..end)?;
            if slice.iter().any(Option::is_none) {
                return None;
            }
            mean_of_present(slice)
        })
        .collect()
}

fn mean_of_present(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().mean())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(day: i64) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-01-01T07:00:00+00:00").unwrap() + Duration::days(day)
    }

    #[test]
    fn test_series_statistics() {
        let stats = SeriesStatistics::from_values(&[6.0, 5.0, 7.0, f64::NAN]).unwrap();

        assert_eq!(stats.count, 3);
        assert!((stats.mean - 6.0).abs() < 1e-12);
        assert!((stats.std_dev - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(stats.min, 5.0);
        assert_eq!(stats.range(), 2.0);
        assert!(SeriesStatistics::from_values(&[]).is_none());
    }

    #[test]
    fn test_linear_trend_improving_pace() {
        let points = vec![(at(0), 7.0), (at(10), 6.5), (at(20), 6.0)];
        let trend = LinearTrend::fit(&points).unwrap();

        assert!((trend.slope_per_day + 0.05).abs() < 1e-9);
        assert!((trend.intercept - 7.0).abs() < 1e-9);
        assert!((trend.value_at(at(30)) - 5.5).abs() < 1e-9);
        assert_eq!(trend.pace_direction(), "improving");
    }

    #[test]
    fn test_linear_trend_needs_distinct_times() {
        assert!(LinearTrend::fit(&[(at(0), 150.0)]).is_none());
        assert!(LinearTrend::fit(&[(at(0), 150.0), (at(0), 152.0)]).is_none());
        assert!(LinearTrend::fit(&[]).is_none());

        let trend = LinearTrend::fit(&[(at(0), 140.0), (at(1), 142.0)]).unwrap();
        assert_eq!(trend.heart_rate_direction(), "increasing");
    }

    #[test]
    fn test_rolling_mean_min_periods_one() {
        let values = vec![Some(6.0), Some(8.0), None, Some(4.0), Some(5.0)];
        let means = rolling_mean(&values, 3);

        assert_eq!(means[0], Some(6.0));
        assert_eq!(means[1], Some(7.0));
        assert_eq!(means[2], Some(7.0));
        assert_eq!(means[3], Some(6.0));
        assert_eq!(means[4], Some(4.5));
        assert_eq!(rolling_mean(&[None], 5), vec![None]);
    }

    #[test]
    fn test_centered_rolling_mean_full_window() {
        let values: Vec<Option<f64>> = (1..=6).map(|v| Some(v as f64)).collect();
        let means = centered_rolling_mean(&values, 5);

        assert_eq!(means, vec![None, None, Some(3.0), Some(4.0), None, None]);

        let with_gap = vec![Some(1.0), None, Some(3.0)];
        assert_eq!(centered_rolling_mean(&with_gap, 3), vec![None, None, None]);
        assert_eq!(centered_rolling_mean(&[Some(2.0), Some(4.0)], 2), vec![None, Some(3.0)]);
    }
}
