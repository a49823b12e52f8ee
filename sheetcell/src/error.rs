//! Error taxonomy for cell access

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving, opening or reading a workbook
#[derive(Debug, Error)]
pub enum SheetError {
    /// Malformed cell, column or range string
    #[error("invalid cell address: {0:?}")]
    InvalidAddress(String),

    /// Range whose start lies after its end on either axis
    #[error("invalid range: {start} to {end}. Start must be before end")]
    InvalidRange { start: String, end: String },

    /// Explicit sheet name absent from the workbook
    #[error("sheet '{name}' not found. Available sheets: {available:?}")]
    SheetNotFound {
        name: String,
        available: Vec<String>,
    },

    /// Local workbook path does not exist
    #[error("workbook not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Remote object or its bucket does not exist
    #[error("remote object not found: {0}")]
    RemoteNotFound(String),

    /// Remote URI without bucket or key
    #[error("invalid remote locator {0:?}. Expected format: s3://bucket-name/path/to/file.xlsx")]
    InvalidLocator(String),

    /// No credentials available for a remote fetch
    #[error(
        "no credentials found for remote fetch. Configure [remote] credentials, \
         AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY, a shared credentials profile, \
         or a container/instance IAM role"
    )]
    CredentialsMissing,

    /// Operation not allowed in the current session state
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Remote service answered with an error other than "not found"
    #[error("remote fetch failed (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    /// Transport failure talking to the remote service
    #[error("remote transport error: {0}")]
    Http(String),

    /// Remote fetch support was compiled out
    #[error("remote locator {0:?} requires the `s3` feature")]
    RemoteUnsupported(String),

    /// The decoder could not open or read the workbook
    #[error("failed to read workbook {}: {source}", .path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    /// Invalid configuration value or file
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SheetError {
    /// True for the "does not exist" family (local or remote)
    pub fn is_not_found(&self) -> bool {
        matches!(self, SheetError::NotFound(_) | SheetError::RemoteNotFound(_))
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, SheetError>;
