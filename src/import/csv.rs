use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{ImportError, Result};
use crate::import::ImportFormat;
use crate::models::{parse_pace, ActivitySummary};

/// Importer for the account-wide `Activities.csv` export, with localized headers
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Header variations across export languages
        Self::add_mapping(&mut column_mapping, "date", &["date", "dato", "datum"]);
        Self::add_mapping(
            &mut column_mapping,
            "avg_hr",
            &["avg hr", "average heart rate", "gjennomsnittlig puls", "snittpuls"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "avg_pace",
            &["avg pace", "average pace", "gjennomsnittlig tempo", "snittempo"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "activity_type",
            &["activity type", "aktivitetstype"],
        );
        Self::add_mapping(&mut column_mapping, "title", &["title", "tittel"]);

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase();

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    fn parse_datetime(date_str: &str) -> Option<DateTime<FixedOffset>> {
        let date_str = date_str.trim();
        let formats = [
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M",
            "%d.%m.%Y %H:%M",
        ];

        if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
            return Some(dt);
        }

        for format in &formats {
            if let Ok(naive_dt) = NaiveDateTime::parse_from_str(date_str, format) {
                return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive_dt, Utc).fixed_offset());
            }
        }

        NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive_dt| DateTime::<Utc>::from_naive_utc_and_offset(naive_dt, Utc).fixed_offset())
    }

    /// Numeric cell, treating the export's `--` placeholder as absent
    fn parse_number(cell: &str) -> Option<f64> {
        let cell = cell.trim().replace(',', "");
        if cell.is_empty() || cell == "--" {
            return None;
        }
        cell.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Read rows from any reader, ordered by date ascending
    pub fn read_activities<R: Read>(&self, reader: R) -> Result<Vec<ActivitySummary>> {
        let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
        let parse_err = |e: csv::Error| ImportError::ParseError {
            format: "csv".to_string(),
            reason: e.to_string(),
        };

        let headers: Vec<String> = rdr
            .headers()
            .map_err(parse_err)?
            .iter()
            .map(|h| self.normalize_column_name(h))
            .collect();
        let column = |name: &str| headers.iter().position(|h| h == name);

        let date_col = column("date").ok_or_else(|| ImportError::MissingData {
            field: "date column".to_string(),
        })?;
        let pace_col = column("avg_pace");
        let hr_col = column("avg_hr");
        let type_col = column("activity_type");
        let title_col = column("title");

        if pace_col.is_none() && hr_col.is_none() {
            return Err(ImportError::MissingData {
                field: "average pace or heart rate column".to_string(),
            }
            .into());
        }

        let mut activities = Vec::new();
        for (line, record) in rdr.records().enumerate() {
            let record = record.map_err(parse_err)?;
            let cell = |col: Option<usize>| col.and_then(|c| record.get(c)).unwrap_or("");

            let Some(timestamp) = Self::parse_datetime(cell(Some(date_col))) else {
                warn!("Skipping row {}: unparseable date {:?}", line + 2, cell(Some(date_col)));
                continue;
            };

            let activity_type = Some(cell(type_col).trim().to_lowercase()).filter(|t| !t.is_empty());
            let title = cell(title_col).trim();

            activities.push(ActivitySummary {
                timestamp,
                activity_id: None,
                name: if title.is_empty() { "Unknown".to_string() } else { title.to_string() },
                activity_type,
                average_speed_mps: None,
                average_pace_min_per_km: parse_pace(cell(pace_col)),
                average_heart_rate: Self::parse_number(cell(hr_col)),
            });
        }

        activities.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        debug!("Read {} activities from csv", activities.len());
        Ok(activities)
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for CsvImporter {
    type Output = Vec<ActivitySummary>;

    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
    }

    fn import_file(&self, file_path: &Path) -> Result<Self::Output> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound {
                path: file_path.to_path_buf(),
            }
            .into());
        }

        let file = std::fs::File::open(file_path)?;
        self.read_activities(file)
    }

    fn get_format_name(&self) -> &'static str {
        "CSV"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norwegian_export() {
        let data = "\
Aktivitetstype,Dato,Tittel,Distanse,Gjennomsnittlig puls,Gjennomsnittlig tempo
Løping,2024-11-22 17:05:11,Oslo Løping,8.01,152,6:12
Løping,2024-11-20 14:19:54,Oslo Løping,5.00,148,9:04
Løping,2024-11-18 07:00:00,Intervall,6.50,--,5:45
";
        let activities = CsvImporter::new().read_activities(data.as_bytes()).unwrap();

        assert_eq!(activities.len(), 3);
        assert_eq!(activities[0].name, "Intervall");
        assert_eq!(activities[0].average_heart_rate, None);
        assert!((activities[1].pace_min_per_km().unwrap() - (9.0 + 4.0 / 60.0)).abs() < 1e-9);
        assert_eq!(activities[2].average_heart_rate, Some(152.0));
        assert_eq!(activities[2].activity_type.as_deref(), Some("løping"));
    }

    #[test]
    fn test_english_headers() {
        let data = "Activity Type,Date,Title,Avg HR,Avg Pace\nRunning,2024-01-05 06:30:00,Easy,141,6:30\n";
        let activities = CsvImporter::new().read_activities(data.as_bytes()).unwrap();

        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].pace_min_per_km(), Some(6.5));
        assert_eq!(activities[0].activity_type.as_deref(), Some("running"));
    }

    #[test]
    fn test_missing_date_column() {
        let data = "Title,Avg HR\nEasy,141\n";
        assert!(CsvImporter::new().read_activities(data.as_bytes()).is_err());
    }

    #[test]
    fn test_unparseable_date_row_is_skipped() {
        let data = "Date,Avg Pace\nyesterday,6:00\n2024-01-05 06:30:00,6:30\n";
        let activities = CsvImporter::new().read_activities(data.as_bytes()).unwrap();
        assert_eq!(activities.len(), 1);
    }
}
