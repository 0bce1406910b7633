use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::LogConfig;
use crate::splits::DEFAULT_WARMUP_KM;

/// Environment variable that overrides the token directory
pub const TOKEN_DIR_ENV: &str = "GARMINTOKENS";

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Split analysis defaults
    pub analysis: AnalysisSettings,

    /// Cached login token location
    pub credentials: CredentialSettings,

    /// Logging setup
    pub logging: LogConfig,
}

/// Split analysis defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Directory holding downloaded `*_details.json` and `*_summary.json` files
    pub activities_dir: PathBuf,

    /// Kilometers skipped before searching for the fastest split
    pub warmup_km: i64,

    /// Number of activities in rolling means
    pub rolling_window: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            activities_dir: PathBuf::from("activities"),
            warmup_km: DEFAULT_WARMUP_KM,
            rolling_window: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    pub token_dir: PathBuf,
}

impl Default for CredentialSettings {
    fn default() -> Self {
        CredentialSettings {
            token_dir: PathBuf::from(".garmintokens"),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".runsplits")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Using default configuration ({:#})", e);
                Self::default()
            }
        }
    }

    /// Token directory, with `GARMINTOKENS` taking precedence
    pub fn token_dir(&self) -> PathBuf {
        self.token_dir_with_override(std::env::var(TOKEN_DIR_ENV).ok())
    }

    fn token_dir_with_override(&self, env_value: Option<String>) -> PathBuf {
        match env_value {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => self.credentials.token_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, deserialized);
        assert_eq!(deserialized.analysis.warmup_km, 2);
        assert_eq!(deserialized.analysis.rolling_window, 5);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [analysis]
            rolling_window = 3

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.analysis.rolling_window, 3);
        assert_eq!(config.analysis.warmup_km, 2);
        assert_eq!(config.analysis.activities_dir, PathBuf::from("activities"));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.credentials.token_dir, PathBuf::from(".garmintokens"));
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original_config = AppConfig::default();
        original_config.analysis.warmup_km = 1;
        original_config.credentials.token_dir = PathBuf::from("/tmp/tokens");

        original_config.save_to_file(&config_path).unwrap();
        let loaded_config = AppConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded_config, original_config);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[analysis\nwarmup_km = ").unwrap();

        assert!(AppConfig::load_from_file(&config_path).is_err());
        assert!(AppConfig::load_from_file(temp_dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_token_dir_override() {
        let config = AppConfig::default();

        assert_eq!(
            config.token_dir_with_override(Some("/secure/tokens".to_string())),
            PathBuf::from("/secure/tokens")
        );
        assert_eq!(
            config.token_dir_with_override(Some("  ".to_string())),
            PathBuf::from(".garmintokens")
        );
        assert_eq!(config.token_dir_with_override(None), PathBuf::from(".garmintokens"));
    }
}
