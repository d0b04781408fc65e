//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::fetch::SheetsConfig;
use crate::normalize::{ColumnNames, DefaultValues, NormalizePolicy};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Spreadsheet-file conversion settings. Updated every semester.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    #[serde(default = "default_input_file")]
    pub input_file: PathBuf,

    /// Worksheet to read; the first one when unset
    #[serde(default)]
    pub sheet: Option<String>,

    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,
}

fn default_input_file() -> PathBuf {
    PathBuf::from("Spring2026_Schedule.xlsx")
}

fn default_output_file() -> PathBuf {
    PathBuf::from("S26schedule.json")
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            input_file: default_input_file(),
            sheet: None,
            output_file: default_output_file(),
        }
    }
}

/// Google Sheets conversion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_spreadsheet")]
    pub spreadsheet: String,

    #[serde(default = "default_worksheet")]
    pub worksheet: String,

    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,

    /// Environment variable holding the service-account key JSON
    #[serde(default = "default_credentials_env")]
    pub credentials_env: String,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_sheets_base_url")]
    pub sheets_base_url: String,

    #[serde(default = "default_drive_base_url")]
    pub drive_base_url: String,
}

fn default_spreadsheet() -> String {
    "Teaching Assignments 2025-2026".to_string()
}

fn default_worksheet() -> String {
    "Spring Summary".to_string()
}

fn default_credentials_env() -> String {
    "GCP_SA_KEY".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_sheets_base_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_drive_base_url() -> String {
    "https://www.googleapis.com".to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            spreadsheet: default_spreadsheet(),
            worksheet: default_worksheet(),
            output_file: default_output_file(),
            credentials_env: default_credentials_env(),
            timeout_seconds: default_timeout(),
            sheets_base_url: default_sheets_base_url(),
            drive_base_url: default_drive_base_url(),
        }
    }
}

impl RemoteConfig {
    /// Client settings for the Sheets source.
    pub fn sheets_config(&self) -> SheetsConfig {
        SheetsConfig {
            spreadsheet: self.spreadsheet.clone(),
            worksheet: self.worksheet.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
            sheets_base_url: self.sheets_base_url.clone(),
            drive_base_url: self.drive_base_url.clone(),
            ..SheetsConfig::default()
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub local: LocalConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    /// Source column headers
    #[serde(default)]
    pub columns: ColumnNames,

    /// Values for missing cells (remote conversion only)
    #[serde(default)]
    pub defaults: DefaultValues,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            local: LocalConfig::default(),
            remote: RemoteConfig::default(),
            columns: ColumnNames::default(),
            defaults: DefaultValues::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.remote.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Remote timeout must be greater than 0".to_string(),
            ));
        }

        if self.remote.spreadsheet.trim().is_empty() || self.remote.worksheet.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Remote spreadsheet and worksheet names must not be empty".to_string(),
            ));
        }

        if self.remote.credentials_env.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Credentials environment variable name must not be empty".to_string(),
            ));
        }

        let columns = [
            &self.columns.course,
            &self.columns.instructor,
            &self.columns.days,
            &self.columns.time,
            &self.columns.location,
            &self.columns.class_type,
            &self.columns.notes,
            &self.columns.enroll,
        ];
        if columns.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "Column names must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Policy for spreadsheet-file conversion.
    pub fn local_policy(&self) -> NormalizePolicy {
        NormalizePolicy::local().with_columns(self.columns.clone())
    }

    /// Policy for Google Sheets conversion.
    pub fn remote_policy(&self) -> NormalizePolicy {
        NormalizePolicy::remote()
            .with_columns(self.columns.clone())
            .with_defaults(self.defaults.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.local.output_file, PathBuf::from("S26schedule.json"));
        assert_eq!(config.remote.worksheet, "Spring Summary");
        assert_eq!(config.remote.credentials_env, "GCP_SA_KEY");
        assert_eq!(config.columns.course, "COURSE");
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_timeout() {
        let mut config = AppConfig::default();
        config.remote.timeout_seconds = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_column() {
        let mut config = AppConfig::default();
        config.columns.location = " ".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [local]
            input_file = "Fall2026_Schedule.xlsx"

            [columns]
            enroll = "ENROLLMENT"

            [defaults]
            type = "Lecture"
            "#,
        )
        .unwrap();

        assert_eq!(config.local.input_file, PathBuf::from("Fall2026_Schedule.xlsx"));
        assert_eq!(config.local.output_file, PathBuf::from("S26schedule.json"));
        assert_eq!(config.columns.enroll, "ENROLLMENT");
        assert_eq!(config.columns.time, "TIME");
        assert_eq!(config.defaults.class_type, "Lecture");
        assert_eq!(config.defaults.location, "TBD");
    }

    #[test]
    fn test_policies_pick_up_overrides() {
        let mut config = AppConfig::default();
        config.columns.enroll = "ENROLLMENT".to_string();
        config.defaults.location = "Online".to_string();

        let remote = config.remote_policy();
        assert_eq!(remote.columns.enroll, "ENROLLMENT");
        assert_eq!(remote.defaults.unwrap().location, "Online");

        let local = config.local_policy();
        assert_eq!(local.columns.enroll, "ENROLLMENT");
        assert!(local.defaults.is_none());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::load_or_default(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[remote]\ntimeout_seconds = 0\n").unwrap();

        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_sheets_config_from_remote() {
        let remote = RemoteConfig {
            timeout_seconds: 5,
            ..RemoteConfig::default()
        };
        let sheets = remote.sheets_config();
        assert_eq!(sheets.timeout, Duration::from_secs(5));
        assert_eq!(sheets.worksheet, "Spring Summary");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        // Should be parseable
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.local.input_file, parsed.local.input_file);
        assert_eq!(config.defaults, parsed.defaults);
    }
}
