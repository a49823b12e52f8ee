//! Configuration system for cell access

use crate::error::{Result, SheetError};
use crate::reader::AccessMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Ceiling on rows visited by a column scan
pub const DEFAULT_MAX_SCAN_ROWS: u32 = 10_000;
/// Ceiling on columns visited by a row scan
pub const DEFAULT_MAX_SCAN_COLUMNS: u32 = 10_000;

// xlsx grid limits
const SHEET_MAX_ROWS: u32 = 1_048_576;
const SHEET_MAX_COLUMNS: u32 = 16_384;

/// Main reader configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReaderConfig {
    #[serde(default)]
    pub reader: ReaderSection,
    #[serde(default)]
    pub remote: RemoteConfig,
}

impl ReaderConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| SheetError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ReaderConfig =
            toml::from_str(content).map_err(|e| SheetError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check scan limits against the spreadsheet grid
    pub fn validate(&self) -> Result<()> {
        let reader = &self.reader;
        if reader.max_scan_rows == 0 || reader.max_scan_rows > SHEET_MAX_ROWS {
            return Err(SheetError::Config(format!(
                "max_scan_rows must be between 1 and {}, got {}",
                SHEET_MAX_ROWS, reader.max_scan_rows
            )));
        }
        if reader.max_scan_columns == 0 || reader.max_scan_columns > SHEET_MAX_COLUMNS {
            return Err(SheetError::Config(format!(
                "max_scan_columns must be between 1 and {}, got {}",
                SHEET_MAX_COLUMNS, reader.max_scan_columns
            )));
        }
        if self.remote.timeout_secs == 0 {
            return Err(SheetError::Config(
                "remote timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Same configuration with a different access strategy
    pub fn with_mode(mut self, mode: AccessMode) -> Self {
        self.reader.mode = mode;
        self
    }
}

/// `[reader]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderSection {
    #[serde(default)]
    pub mode: AccessMode,
    #[serde(default = "default_max_scan_rows")]
    pub max_scan_rows: u32,
    #[serde(default = "default_max_scan_columns")]
    pub max_scan_columns: u32,
}

impl Default for ReaderSection {
    fn default() -> Self {
        Self {
            mode: AccessMode::default(),
            max_scan_rows: DEFAULT_MAX_SCAN_ROWS,
            max_scan_columns: DEFAULT_MAX_SCAN_COLUMNS,
        }
    }
}

/// `[remote]` section; unset fields fall back to the AWS environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub region: Option<String>,
    /// Custom endpoint (path-style addressing), e.g. a MinIO server
    pub endpoint: Option<String>,
    /// Profile in the shared credentials file
    pub profile: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint: None,
            profile: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_max_scan_rows() -> u32 {
    DEFAULT_MAX_SCAN_ROWS
}

fn default_max_scan_columns() -> u32 {
    DEFAULT_MAX_SCAN_COLUMNS
}

fn default_timeout_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReaderConfig::default();
        assert_eq!(config.reader.mode, AccessMode::Direct);
        assert_eq!(config.reader.max_scan_rows, 10_000);
        assert_eq!(config.reader.max_scan_columns, 10_000);
        assert_eq!(config.remote.timeout_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_sections() {
        let config = ReaderConfig::from_toml(
            r#"
            [reader]
            mode = "table"
            max_scan_rows = 500

            [remote]
            region = "eu-west-1"
            endpoint = "http://localhost:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.reader.mode, AccessMode::Table);
        assert_eq!(config.reader.max_scan_rows, 500);
        assert_eq!(config.reader.max_scan_columns, 10_000);
        assert_eq!(config.remote.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.remote.endpoint.as_deref(), Some("http://localhost:9000"));
        assert!(config.remote.access_key_id.is_none());
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(ReaderConfig::from_toml("").unwrap(), ReaderConfig::default());
    }

    #[test]
    fn test_validation() {
        for bad in [
            "[reader]\nmax_scan_rows = 0",
            "[reader]\nmax_scan_columns = 20000",
            "[reader]\nmode = \"eager\"",
            "[remote]\ntimeout_secs = 0",
        ] {
            assert!(
                matches!(ReaderConfig::from_toml(bad), Err(SheetError::Config(_))),
                "{bad}"
            );
        }
    }
}
