use chrono::{DateTime, FixedOffset};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ImportError, Result};

pub mod csv;
pub mod details;
pub mod summary;

/// Trait for importing activity data from different file formats
pub trait ImportFormat {
    /// What one file decodes into
    type Output;

    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Import activity data from the file
    fn import_file(&self, file_path: &Path) -> Result<Self::Output>;

    /// Get the format name for this importer
    fn get_format_name(&self) -> &'static str;
}

/// Kind of cached activity file, taken from the file name suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityFileKind {
    /// Time-series telemetry (`*_details.json`)
    Details,
    /// Activity averages (`*_summary.json`)
    Summary,
}

impl ActivityFileKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            ActivityFileKind::Details => "_details.json",
            ActivityFileKind::Summary => "_summary.json",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityFileKind::Details => "details",
            ActivityFileKind::Summary => "summary",
        }
    }
}

/// A cached activity file named `<timestamp>_<activityId>_<kind>.json`
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityFile {
    pub path: PathBuf,
    pub timestamp: DateTime<FixedOffset>,
    pub activity_id: String,
    pub kind: ActivityFileKind,
}

impl ActivityFile {
    /// Parse the start time and activity id out of a cached file's name
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let bad_name = || ImportError::BadFileName { name: name.clone() };

        let kind = [ActivityFileKind::Details, ActivityFileKind::Summary]
            .into_iter()
            .find(|kind| name.ends_with(kind.suffix()))
            .ok_or_else(bad_name)?;

        let stem = &name[..name.len() - kind.suffix().len()];
        let (timestamp, activity_id) = stem.split_once('_').ok_or_else(bad_name)?;
        let timestamp = DateTime::parse_from_rfc3339(timestamp).map_err(|_| bad_name())?;

        Ok(Self {
            path: path.to_path_buf(),
            timestamp,
            activity_id: activity_id.to_string(),
            kind,
        })
    }
}

/// Collect every file of `kind` in `dir`, ordered by start time.
///
/// Fails when the directory holds no such file, so a wrong `--dir` is
/// reported instead of producing an empty report.
pub fn collect_activity_files(dir: &Path, kind: ActivityFileKind) -> Result<Vec<ActivityFile>> {
    if !dir.is_dir() {
        return Err(ImportError::FileNotFound {
            path: dir.to_path_buf(),
        }
        .into());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let is_kind = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(kind.suffix()));
        if !is_kind {
            continue;
        }

        match ActivityFile::from_path(&path) {
            Ok(file) => files.push(file),
            Err(e) => debug!("Skipping {}: {}", path.display(), e),
        }
    }

    if files.is_empty() {
        return Err(ImportError::EmptyDirectory {
            path: dir.to_path_buf(),
            kind: kind.label().to_string(),
        }
        .into());
    }

    files.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.path.cmp(&b.path)));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunSplitsError;
    use tempfile::tempdir;

    #[test]
    fn test_activity_file_from_path() {
        let path = Path::new("activities/2024-11-20T14:19:54+00:00_17582889898_details.json");
        let file = ActivityFile::from_path(path).unwrap();

        assert_eq!(file.kind, ActivityFileKind::Details);
        assert_eq!(file.activity_id, "17582889898");
        assert_eq!(file.timestamp.to_rfc3339(), "2024-11-20T14:19:54+00:00");
    }

    #[test]
    fn test_activity_file_rejects_unknown_names() {
        assert!(ActivityFile::from_path(Path::new("activities.json")).is_err());
        assert!(ActivityFile::from_path(Path::new("yesterday_123_summary.json")).is_err());
        assert!(ActivityFile::from_path(Path::new("2024-11-20T14:19:54+00:00_details.json")).is_err());
    }

    #[test]
    fn test_collect_activity_files_sorted_by_timestamp() {
        let dir = tempdir().unwrap();
        for name in [
            "2024-12-01T08:00:00+00:00_2_details.json",
            "2024-11-20T14:19:54+00:00_1_details.json",
            "2024-11-20T14:19:54+00:00_1_summary.json",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }

        let files = collect_activity_files(dir.path(), ActivityFileKind::Details).unwrap();
        let ids: Vec<&str> = files.iter().map(|f| f.activity_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_collect_activity_files_empty_directory() {
        let dir = tempdir().unwrap();
        let err = collect_activity_files(dir.path(), ActivityFileKind::Summary).unwrap_err();
        assert!(matches!(
            err,
            RunSplitsError::Import(ImportError::EmptyDirectory { .. })
        ));
    }
}
