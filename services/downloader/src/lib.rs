//! Selective downloader for GFS GRIB2 files on NOMADS.
//!
//! For every requested forecast hour the `.idx` inventory is fetched and
//! only the messages matching the requested variable/level pairs are
//! downloaded with one multi-range HTTP request:
//! - [`request`] validates the run and splits it per forecast hour
//! - [`download`] retrieves one forecast hour with pacing and retries
//! - [`scheduler`] runs forecast hours over a bounded worker pool
//! - [`report`] aggregates per-hour outcomes

pub mod config;
pub mod download;
pub mod error;
pub mod report;
pub mod request;
pub mod scheduler;

pub use config::{load_model_config, ModelConfig, RetrievalConfig, SourceConfig};
pub use download::{DownloadConfig, DownloadManager, RetrievalOutcome};
pub use error::{DownloadError, Result, RetrievalError};
pub use report::RunReport;
pub use request::{Cycle, ForecastHour, ForecastRequest, RunRequest};
pub use scheduler::Scheduler;
