//! Selective retrieval of one forecast hour.
//!
//! Key features:
//! - Reads the `.idx` inventory and requests only the selected messages
//!   with a single multi-range `Range` header
//! - Paces requests (random start jitter, fixed pause before the ranged
//!   request) to stay under the archive's throttling limit
//! - Retries empty responses and transport errors with a fixed delay
//! - Classifies HTTP status explicitly; 403 is a soft failure
//!
//! The archive regularly answers with an empty body instead of an error
//! when it is busy. If every attempt comes back empty the (empty) payload is
//! still written and the outcome is flagged, so callers must check sizes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use grib_inventory::{ByteRangeSet, Inventory, Selection};
use rand::Rng;
use reqwest::{header, Client, StatusCode};
use tracing::{debug, error, info, instrument, warn};

use crate::config::{ModelConfig, SourceConfig};
use crate::error::{Result, RetrievalError};
use crate::request::ForecastRequest;

/// Configuration for the download manager.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Archive layout
    pub source: SourceConfig,
    /// Directory for completed downloads
    pub output_dir: PathBuf,
    /// Bounds of the random delay before a task's first request
    pub jitter: (Duration, Duration),
    /// Pause between the index request and the ranged request
    pub range_pause: Duration,
    /// Additional attempts after an empty response or transport error
    pub max_retries: u32,
    /// Delay between attempts
    pub retry_delay: Duration,
    /// HTTP request timeout
    pub request_timeout: Duration,
    /// HTTP connect timeout
    pub connect_timeout: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self::from_model(&ModelConfig::default(), PathBuf::from("."))
    }
}

impl DownloadConfig {
    pub fn from_model(model: &ModelConfig, output_dir: PathBuf) -> Self {
        let retrieval = &model.retrieval;
        Self {
            source: model.source.clone(),
            output_dir,
            jitter: retrieval.jitter(),
            range_pause: retrieval.range_pause(),
            max_retries: retrieval.max_retries,
            retry_delay: retrieval.retry_delay(),
            request_timeout: retrieval.request_timeout(),
            connect_timeout: retrieval.connect_timeout(),
        }
    }
}

/// Result of retrieving one forecast hour.
#[derive(Debug)]
pub enum RetrievalOutcome {
    /// Payload written to `path`.
    Written {
        path: PathBuf,
        bytes: u64,
        attempts: u32,
        /// Every attempt returned an empty body; the file is empty.
        empty_after_retries: bool,
    },
    /// No requested field exists in the inventory; no ranged request was made.
    NothingToFetch,
    Failed(RetrievalError),
}

impl RetrievalOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Written { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Body of a successful response, or the last empty one.
#[derive(Debug)]
struct Fetched {
    body: Bytes,
    attempts: u32,
    exhausted: bool,
}

/// Retrieves forecast hours from the archive.
pub struct DownloadManager {
    client: Client,
    config: DownloadConfig,
}

impl DownloadManager {
    /// Create a new download manager with the given configuration.
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()?;

        Ok(Self { client, config })
    }

    /// Random delay in the configured jitter window.
    fn start_delay(&self) -> Duration {
        let (min, max) = self.config.jitter;
        rand::thread_rng().gen_range(min..=max)
    }

    /// Retrieve the requested fields of one forecast hour and write them to
    /// the output directory.
    ///
    /// Never returns an error: failures are reported in the outcome so that
    /// sibling forecast hours keep running.
    #[instrument(skip(self, request), fields(forecast_hour = %request.forecast_hour))]
    pub async fn retrieve(&self, request: &ForecastRequest) -> RetrievalOutcome {
        match self.try_retrieve(request).await {
            Ok(outcome) => outcome,
            Err(e @ RetrievalError::Forbidden { .. }) => {
                warn!(error = %e, "Could not download forecast hour");
                RetrievalOutcome::Failed(e)
            }
            Err(e) => {
                error!(error = %e, kind = e.kind(), "Retrieval failed");
                RetrievalOutcome::Failed(e)
            }
        }
    }

    async fn try_retrieve(
        &self,
        request: &ForecastRequest,
    ) -> std::result::Result<RetrievalOutcome, RetrievalError> {
        // Desynchronize workers hitting the same server.
        tokio::time::sleep(self.start_delay()).await;

        let url = self.config.source.file_url(request);
        let idx_url = format!("{}.idx", url);

        let index = self.fetch(&idx_url, None).await?;
        let text = String::from_utf8_lossy(&index.body);
        let inventory =
            Inventory::parse(&text).map_err(|source| RetrievalError::MalformedIndex {
                url: idx_url.clone(),
                source,
            })?;

        let selection = Selection::select(&inventory, &request.fields);
        for field in selection.missing(&request.fields) {
            warn!(field = %field, "Requested field not found in inventory");
        }

        let ranges = ByteRangeSet::from_selection(&selection);
        let Some(range_header) = ranges.header_value() else {
            warn!(url = %url, "No requested field matched, nothing to fetch");
            return Ok(RetrievalOutcome::NothingToFetch);
        };

        debug!(
            messages = ranges.len(),
            inventory = inventory.len(),
            range = %range_header,
            "Assembled byte ranges"
        );

        tokio::time::sleep(self.config.range_pause).await;

        let fetched = self.fetch(&url, Some(&range_header)).await?;
        if fetched.exhausted {
            warn!(
                url = %url,
                max_retries = self.config.max_retries,
                "Reached maximum number of retries, payload is empty"
            );
        }

        let path = self.config.output_dir.join(request.output_file_name());
        tokio::fs::write(&path, &fetched.body)
            .await
            .map_err(|source| RetrievalError::Write {
                path: path.clone(),
                source,
            })?;

        info!(
            path = %path.display(),
            bytes = fetched.body.len(),
            attempts = fetched.attempts,
            "Download completed"
        );

        Ok(RetrievalOutcome::Written {
            path,
            bytes: fetched.body.len() as u64,
            attempts: fetched.attempts,
            empty_after_retries: fetched.exhausted,
        })
    }

    /// GET `url`, retrying empty bodies and transport errors.
    ///
    /// 206 carries a payload, as does 200 for an unranged request. A 200
    /// with a body in reply to a ranged request means the range was ignored
    /// and is rejected; an empty 200 is the archive's busy signal and is
    /// retried. 403 and any other status end the task at once.
    async fn fetch(
        &self,
        url: &str,
        range: Option<&str>,
    ) -> std::result::Result<Fetched, RetrievalError> {
        let max_attempts = self.config.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let mut request = self.client.get(url);
            if let Some(range) = range {
                request = request.header(header::RANGE, range);
            }

            let result = match request.send().await {
                Ok(response) => match response.status() {
                    StatusCode::PARTIAL_CONTENT => response.bytes().await,
                    StatusCode::OK if range.is_none() => response.bytes().await,
                    StatusCode::OK if response.content_length().unwrap_or(0) == 0 => {
                        match response.bytes().await {
                            Ok(body) if !body.is_empty() => {
                                return Err(RetrievalError::UnexpectedStatus {
                                    url: url.to_string(),
                                    status: StatusCode::OK.as_u16(),
                                });
                            }
                            other => other,
                        }
                    }
                    StatusCode::FORBIDDEN => {
                        return Err(RetrievalError::Forbidden {
                            url: url.to_string(),
                        });
                    }
                    status => {
                        return Err(RetrievalError::UnexpectedStatus {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }
                },
                Err(e) => Err(e),
            };

            match result {
                Ok(body) if !body.is_empty() => {
                    debug!(url = %url, attempt, bytes = body.len(), "Received response");
                    return Ok(Fetched {
                        body,
                        attempts: attempt,
                        exhausted: false,
                    });
                }
                Ok(body) => {
                    if attempt >= max_attempts {
                        return Ok(Fetched {
                            body,
                            attempts: attempt,
                            exhausted: true,
                        });
                    }
                    debug!(url = %url, attempt, "Empty response, retrying");
                }
                Err(e) => {
                    if attempt >= max_attempts {
                        return Err(RetrievalError::from_transport(url, &e));
                    }
                    warn!(url = %url, attempt, error = %e, "Request failed, retrying");
                }
            }

            tokio::time::sleep(self.config.retry_delay).await;
        }
    }
}
