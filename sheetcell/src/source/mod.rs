//! Locating workbooks on disk or in object storage
//!
//! A [`Locator`] is either a filesystem path or an `s3://bucket/key` URI.
//! [`SourceResolver::resolve`] turns it into a [`SourceLease`] on a local file:
//! local paths are used in place, remote objects are downloaded into a fresh
//! temporary file that the lease deletes when released or dropped.

use crate::config::RemoteConfig;
use crate::error::{Result, SheetError};
use log::{debug, warn};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[cfg(feature = "s3")]
pub mod aws;
#[cfg(feature = "s3")]
pub mod s3;

/// URI prefix of the only recognized remote scheme
pub const S3_SCHEME: &str = "s3://";

const DEFAULT_EXTENSION: &str = "xlsx";

/// Bucket and key of a remote object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocation {
    pub bucket: String,
    pub key: String,
}

impl BlobLocation {
    /// Parse `s3://bucket/path/to/key`
    pub fn parse(uri: &str) -> Result<Self> {
        let invalid = || SheetError::InvalidLocator(uri.to_string());
        let rest = uri.strip_prefix(S3_SCHEME).ok_or_else(invalid)?;
        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        let key = key.trim_start_matches('/');

        let location = Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        };
        location.validate().map_err(|_| invalid())?;
        Ok(location)
    }

    /// Reject an empty bucket or key, and keys with `.` / `..` segments
    /// (URL normalization would silently collapse them into another key)
    pub fn validate(&self) -> Result<()> {
        let dot_segment = self
            .key
            .split('/')
            .any(|segment| segment == "." || segment == "..");
        if self.bucket.is_empty() || self.key.is_empty() || dot_segment {
            return Err(SheetError::InvalidLocator(self.to_string()));
        }
        Ok(())
    }

    /// File extension of the key, used to name the local copy
    pub fn extension(&self) -> Option<&str> {
        let file_name = self.key.rsplit('/').next()?;
        let (_, ext) = file_name.rsplit_once('.')?;
        (!ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .then_some(ext)
    }
}

impl fmt::Display for BlobLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", S3_SCHEME, self.bucket, self.key)
    }
}

/// Where a workbook lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Local(PathBuf),
    Remote(BlobLocation),
}

impl Locator {
    /// Classify a path or URI; only the `s3://` prefix is treated as remote
    pub fn parse(input: &str) -> Result<Self> {
        if input.starts_with(S3_SCHEME) {
            BlobLocation::parse(input).map(Locator::Remote)
        } else {
            Ok(Locator::Local(PathBuf::from(input)))
        }
    }

    pub fn local<P: Into<PathBuf>>(path: P) -> Self {
        Locator::Local(path.into())
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Locator::Remote(_))
    }
}

impl FromStr for Locator {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Local(path) => write!(f, "{}", path.display()),
            Locator::Remote(location) => write!(f, "{}", location),
        }
    }
}

/// Capability to copy a remote object into a local file
pub trait BlobFetcher: Send + Sync {
    /// Download `location` into `dest`, returning the number of bytes written.
    ///
    /// Must fail with `RemoteNotFound` for a missing object or bucket and with
    /// `CredentialsMissing` when no authentication is available.
    fn fetch(&self, location: &BlobLocation, dest: &Path) -> Result<u64>;
}

/// Local file backing an open workbook.
///
/// Temporary downloads are deleted exactly once, on [`SourceLease::release`]
/// or on drop.
#[derive(Debug)]
pub struct SourceLease {
    path: PathBuf,
    temporary: bool,
    released: bool,
}

impl SourceLease {
    fn new(path: PathBuf, temporary: bool) -> Self {
        Self {
            path,
            temporary,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// Give the file back now instead of at drop
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            release(&self.path, self.temporary);
        }
    }
}

impl Drop for SourceLease {
    fn drop(&mut self) {
        self.release_once();
    }
}

/// Delete `path` if it was created as a temporary download.
///
/// Failures are logged and swallowed; cleanup never masks the caller's
/// result.
pub fn release(path: &Path, temporary: bool) {
    if !temporary {
        return;
    }
    match fs::remove_file(path) {
        Ok(()) => debug!("removed temporary workbook {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("temporary workbook {} already gone", path.display())
        }
        Err(e) => warn!(
            "failed to remove temporary workbook {}: {}",
            path.display(),
            e
        ),
    }
}

/// Turns locators into local files
pub struct SourceResolver {
    fetcher: Option<Box<dyn BlobFetcher>>,
}

impl SourceResolver {
    /// Resolver that fetches remote locators through `fetcher`
    pub fn new(fetcher: Box<dyn BlobFetcher>) -> Self {
        Self {
            fetcher: Some(fetcher),
        }
    }

    /// Resolver that rejects remote locators
    pub fn local_only() -> Self {
        Self { fetcher: None }
    }

    /// Resolver using the S3 fetcher built from `[remote]` settings
    #[cfg(feature = "s3")]
    pub fn from_config(remote: &RemoteConfig) -> Result<Self> {
        Ok(Self::new(Box::new(s3::S3Fetcher::from_config(remote)?)))
    }

    #[cfg(not(feature = "s3"))]
    pub fn from_config(_remote: &RemoteConfig) -> Result<Self> {
        Ok(Self::local_only())
    }

    /// Produce a local file for `locator`, downloading it if remote
    pub fn resolve(&self, locator: &Locator) -> Result<SourceLease> {
        match locator {
            Locator::Local(path) => {
                if !path.exists() {
                    return Err(SheetError::NotFound(path.clone()));
                }
                debug!("using local workbook {}", path.display());
                Ok(SourceLease::new(path.clone(), false))
            }
            Locator::Remote(location) => {
                let fetcher = self
                    .fetcher
                    .as_ref()
                    .ok_or_else(|| SheetError::RemoteUnsupported(location.to_string()))?;

                let suffix = format!(".{}", location.extension().unwrap_or(DEFAULT_EXTENSION));
                let path = tempfile::Builder::new()
                    .prefix("sheetcell-")
                    .suffix(&suffix)
                    .tempfile()?
                    .into_temp_path()
                    .keep()
                    .map_err(|e| e.error)?;

                // From here on the lease owns the file, including on fetch failure
                let lease = SourceLease::new(path, true);
                let bytes = fetcher.fetch(location, lease.path())?;
                debug!(
                    "downloaded {} ({} bytes) to {}",
                    location,
                    bytes,
                    lease.path().display()
                );
                Ok(lease)
            }
        }
    }
}
