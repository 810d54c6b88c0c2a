//! Bounded fan-out of forecast hours over a worker pool.
//!
//! Requests are grouped into chunks of `chunk_size` consecutive hours. Each
//! chunk is handled by one worker, which retrieves its hours one after the
//! other; at most `max_workers` chunks run at once. Together with the pacing
//! in [`DownloadManager`] this keeps the request rate under the archive's
//! throttling limit.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::download::{DownloadManager, RetrievalOutcome};
use crate::report::RunReport;
use crate::request::{ForecastHour, ForecastRequest};

pub const DEFAULT_MAX_WORKERS: usize = 4;
pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// Runs every forecast hour of a run and collects the outcomes.
pub struct Scheduler {
    download_manager: Arc<DownloadManager>,
    max_workers: usize,
    chunk_size: usize,
}

impl Scheduler {
    /// Zero values are raised to 1.
    pub fn new(download_manager: Arc<DownloadManager>, max_workers: usize, chunk_size: usize) -> Self {
        Self {
            download_manager,
            max_workers: max_workers.max(1),
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Retrieve all requests. A failing hour never cancels the others.
    ///
    /// Each forecast hour runs at most once; later requests for an hour
    /// already queued are dropped, since they would write the same file.
    pub async fn run(&self, requests: Vec<ForecastRequest>) -> RunReport {
        let mut queued = HashSet::new();
        let requests: Vec<ForecastRequest> = requests
            .into_iter()
            .filter(|request| {
                let first = queued.insert(request.forecast_hour);
                if !first {
                    warn!(
                        forecast_hour = %request.forecast_hour,
                        "Duplicate forecast hour request ignored"
                    );
                }
                first
            })
            .collect();

        let total = requests.len();
        let chunks: Vec<Vec<ForecastRequest>> = requests
            .chunks(self.chunk_size)
            .map(<[ForecastRequest]>::to_vec)
            .collect();

        info!(
            forecast_hours = total,
            chunks = chunks.len(),
            max_workers = self.max_workers,
            "Starting retrieval"
        );

        let results: Vec<Vec<(ForecastHour, RetrievalOutcome)>> = stream::iter(chunks)
            .enumerate()
            .map(|(index, chunk)| {
                let manager = self.download_manager.clone();
                async move {
                    debug!(chunk = index, size = chunk.len(), "Worker picked up chunk");
                    let mut outcomes = Vec::with_capacity(chunk.len());
                    for request in &chunk {
                        let outcome = manager.retrieve(request).await;
                        outcomes.push((request.forecast_hour, outcome));
                    }
                    outcomes
                }
            })
            .buffer_unordered(self.max_workers)
            .collect()
            .await;

        let mut report = RunReport::new();
        for (hour, outcome) in results.into_iter().flatten() {
            report.record(hour, outcome);
        }

        info!(
            total = report.total(),
            written = report.written(),
            empty = report.empty(),
            nothing_to_fetch = report.nothing_to_fetch(),
            failed = report.failed(),
            "Retrieval complete"
        );

        report
    }
}
