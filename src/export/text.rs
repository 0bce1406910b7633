use super::{ExportError, FastestSplitReport, PaceTrendReport, SplitRow};
use crate::models::format_pace;
use crate::trends::SeriesStatistics;
use std::io::Write;

fn or_dash(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "-".to_string())
}

/// Per-kilometer table of a single activity
pub fn write_split_table<W: Write>(out: &mut W, rows: &[SplitRow]) -> Result<(), ExportError> {
    let total_km: f64 = rows.iter().map(|r| r.distance_km).sum();

    writeln!(out, "Activity Summary:")?;
    writeln!(out, "Total Distance: {:.2} km", total_km)?;
    writeln!(out)?;
    writeln!(out, "Per Kilometer Stats:")?;
    writeln!(
        out,
        "{:>4} {:>10} {:>10} {:>8} {:>10}",
        "KM", "Dist (km)", "Time (min)", "Pace", "HR (bpm)"
    )?;
    writeln!(out, "{:-<46}", "")?;

    for row in rows {
        writeln!(
            out,
            "{:>4} {:>10.2} {:>10.2} {:>8} {:>10}",
            row.km,
            row.distance_km,
            row.duration_min,
            row.pace,
            or_dash(row.avg_heart_rate, 1)
        )?;
    }

    Ok(())
}

fn write_pace_stats<W: Write>(out: &mut W, stats: &SeriesStatistics) -> Result<(), ExportError> {
    writeln!(out, "Mean pace: {} min/km", format_pace(stats.mean))?;
    writeln!(out, "Standard deviation: {:.2} min/km", stats.std_dev)?;
    writeln!(out, "Best pace (fastest): {} min/km", format_pace(stats.min))?;
    writeln!(out, "Worst pace (slowest): {} min/km", format_pace(stats.max))?;
    writeln!(out, "Pace range: {:.2} min/km", stats.range())?;
    Ok(())
}

/// Fastest kilometer of every activity, oldest first
pub fn write_fastest_split_report<W: Write>(
    out: &mut W,
    report: &FastestSplitReport,
) -> Result<(), ExportError> {
    writeln!(out, "Activity Analysis Summary:")?;
    writeln!(out, "{:=<80}", "")?;
    writeln!(out, "Total Activities Analyzed: {}", report.rows.len())?;
    writeln!(out)?;
    writeln!(out, "Fastest Kilometers (after km {}):", report.min_km)?;
    writeln!(out, "{:-<80}", "")?;
    writeln!(
        out,
        "{:<12} {:>9} {:>11} {:>7} {:>11} {:>16}",
        "Date", "Distance", "Fastest KM", "Pace", "Heart Rate",
        format!("Pace ({} avg)", report.window)
    )?;
    writeln!(out, "{:-<80}", "")?;

    for row in &report.rows {
        let heart_rate = row
            .hr_at_fastest
            .map(|hr| format!("{:.0} bpm", hr))
            .unwrap_or_else(|| "-".to_string());
        let rolling = row
            .rolling_pace
            .map(format_pace)
            .unwrap_or_else(|| "-".to_string());

        writeln!(
            out,
            "{:<12} {:>7.1}km {:>8}{:>3} {:>7} {:>11} {:>16}",
            row.timestamp.format("%Y-%m-%d"),
            row.distance_km,
            "KM",
            row.fastest_km,
            row.fastest_pace_str,
            heart_rate,
            rolling
        )?;
    }

    if let Some(stats) = &report.pace_stats {
        writeln!(out)?;
        writeln!(out, "Statistics:")?;
        write_pace_stats(out, stats)?;
    }

    if let Some(trend) = &report.pace_trend {
        writeln!(
            out,
            "Trend: {:.2} sec/km per day ({})",
            (trend.slope_per_day * 60.0).abs(),
            trend.pace_direction()
        )?;
    }

    Ok(())
}

/// Pace and heart rate statistics, optionally preceded by every activity
pub fn write_pace_trend_report<W: Write>(
    out: &mut W,
    report: &PaceTrendReport,
    list_activities: bool,
) -> Result<(), ExportError> {
    writeln!(out, "Running activities: {}", report.activities.len())?;

    if list_activities {
        writeln!(out)?;
        for row in &report.activities {
            let heart_rate = row
                .heart_rate
                .map(|hr| format!("{:.0} bpm", hr))
                .unwrap_or_else(|| "No HR".to_string());
            let pace = row
                .pace_min_per_km
                .map(format_pace)
                .unwrap_or_else(|| "--".to_string());

            writeln!(
                out,
                "{} - {}: {} min/km, {}",
                row.timestamp.format("%Y-%m-%d"),
                row.name,
                pace,
                heart_rate
            )?;
        }
    }

    if let Some(stats) = &report.pace_stats {
        writeln!(out)?;
        writeln!(out, "Pace Statistics:")?;
        write_pace_stats(out, stats)?;
    }
    if let Some(trend) = &report.pace_trend {
        writeln!(
            out,
            "Pace trend: {:.2} sec/km per day ({})",
            (trend.slope_per_day * 60.0).abs(),
            trend.pace_direction()
        )?;
    }

    match &report.heart_rate_stats {
        Some(stats) => {
            writeln!(out)?;
            writeln!(out, "Heart Rate Statistics:")?;
            writeln!(out, "Activities with HR data: {}", stats.count)?;
            writeln!(out, "Mean heart rate: {:.0} bpm", stats.mean)?;
            writeln!(out, "Standard deviation: {:.1} bpm", stats.std_dev)?;
            writeln!(out, "Min heart rate: {:.0} bpm", stats.min)?;
            writeln!(out, "Max heart rate: {:.0} bpm", stats.max)?;
            writeln!(out, "HR range: {:.0} bpm", stats.range())?;
        }
        None => {
            writeln!(out)?;
            writeln!(out, "No heart rate data available")?;
        }
    }
    if let Some(trend) = &report.heart_rate_trend {
        writeln!(
            out,
            "Heart rate trend: {:.2} bpm per day ({})",
            trend.slope_per_day.abs(),
            trend.heart_rate_direction()
        )?;
    }
    if report.missing_heart_rate > 0 {
        writeln!(out, "{} activities missing heart rate data", report.missing_heart_rate)?;
    }

    if let (Some(first), Some(last)) = (report.activities.first(), report.activities.last()) {
        writeln!(
            out,
            "Date range: {} to {}",
            first.timestamp.format("%Y-%m-%d"),
            last.timestamp.format("%Y-%m-%d")
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FastestSplitResult;
    use chrono::DateTime;

    #[test]
    fn test_split_table_total_distance() {
        let rows = vec![
            SplitRow {
                km: 0,
                distance_km: 0.999,
                duration_min: 6.65,
                pace_min_per_km: Some(6.657),
                pace: "06:39".to_string(),
                avg_heart_rate: Some(151.0),
            },
            SplitRow {
                km: 1,
                distance_km: 0.501,
                duration_min: 4.18,
                pace_min_per_km: Some(8.35),
                pace: "08:21".to_string(),
                avg_heart_rate: None,
            },
        ];

        let mut out = Vec::new();
        write_split_table(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Total Distance: 1.50 km"));
        assert!(text.contains("06:39"));
        assert!(text.lines().last().unwrap().ends_with('-'));
    }

    #[test]
    fn test_fastest_split_report_text() {
        let results = vec![FastestSplitResult {
            timestamp: DateTime::parse_from_rfc3339("2024-11-20T14:19:54+00:00").unwrap(),
            activity_id: "1".to_string(),
            distance_km: 8.0,
            fastest_km: 5,
            fastest_pace: 5.5,
            fastest_pace_str: "05:30".to_string(),
            hr_at_fastest: Some(168.0),
        }];
        let report = FastestSplitReport::build(&results, 5, 2);

        let mut out = Vec::new();
        write_fastest_split_report(&mut out, &report).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Total Activities Analyzed: 1"));
        assert!(text.contains("2024-11-20"));
        assert!(text.contains("168 bpm"));
        assert!(text.contains("Best pace (fastest): 05:30 min/km"));
    }

    #[test]
    fn test_pace_trend_report_without_heart_rate() {
        let activity = |day: u32, pace: f64| crate::models::ActivitySummary {
            timestamp: DateTime::parse_from_rfc3339(&format!("2024-03-{:02}T07:00:00+01:00", day))
                .unwrap(),
            activity_id: None,
            name: format!("Morning Run {}", day),
            activity_type: Some("Løping".to_string()),
            average_speed_mps: None,
            average_pace_min_per_km: Some(pace),
            average_heart_rate: None,
        };
        let report = crate::export::PaceTrendReport::build(&[activity(1, 6.0), activity(8, 5.5)], 5);

        let mut listed = Vec::new();
        write_pace_trend_report(&mut listed, &report, true).unwrap();
        let listed = String::from_utf8(listed).unwrap();
        assert!(listed.contains("2024-03-01 - Morning Run 1: 06:00 min/km, No HR"));
        assert!(listed.contains("No heart rate data available"));
        assert!(listed.contains("(improving)"));
        assert!(listed.contains("Date range: 2024-03-01 to 2024-03-08"));

        let mut brief = Vec::new();
        write_pace_trend_report(&mut brief, &report, false).unwrap();
        let brief = String::from_utf8(brief).unwrap();
        assert!(!brief.contains("Morning Run"));
        assert!(brief.contains("Mean pace: 05:45 min/km"));
    }
}
