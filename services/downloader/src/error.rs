//! Error types for the downloader.
//!
//! [`DownloadError`] covers problems that stop the whole run before any
//! network activity. [`RetrievalError`] is scoped to a single forecast hour
//! and never cancels the other hours of a run.

use std::path::PathBuf;

use grib_inventory::InventoryError;
use thiserror::Error;

/// Errors that abort the run.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Failed to load config file {path}: {message}")]
    ConfigFile { path: PathBuf, message: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for run-level operations.
pub type Result<T> = std::result::Result<T, DownloadError>;

/// Failure of one forecast hour.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Malformed index {url}: {source}")]
    MalformedIndex {
        url: String,
        #[source]
        source: InventoryError,
    },

    #[error("Access forbidden for {url}")]
    Forbidden { url: String },

    #[error("Unexpected HTTP status {status} for {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Request timed out for {url}")]
    Timeout { url: String },

    #[error("Network failure for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RetrievalError {
    /// Short, stable name used when aggregating failures.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedIndex { .. } => "malformed_index",
            Self::Forbidden { .. } => "forbidden",
            Self::UnexpectedStatus { .. } => "unexpected_status",
            Self::Timeout { .. } => "timeout",
            Self::Network { .. } => "network",
            Self::Write { .. } => "write",
        }
    }

    /// Classify a transport-level failure from the HTTP client.
    pub(crate) fn from_transport(url: &str, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}
