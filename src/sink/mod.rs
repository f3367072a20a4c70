pub mod stats;
pub mod webhook;

use crate::pipeline::{BatchReceiver, LogFilters};
use crate::record::LogRecord;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub use stats::{run_status_reporter, DeliveryStats, StatsSnapshot};
pub use webhook::WebhookSink;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("sink returned error status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid header {0}")]
    Header(String),
}

/// A delivery target for enriched batches.
#[async_trait]
pub trait Sink: Send + Sync {
    fn name(&self) -> &str;

    /// Per-sink filters applied on top of the global ones.
    fn filters(&self) -> &LogFilters;

    async fn deliver(&self, records: &[LogRecord]) -> Result<(), SinkError>;
}

/// Records of `batch` that pass the sink's own filters.
pub fn select_for_sink(sink: &dyn Sink, batch: &[LogRecord]) -> Vec<LogRecord> {
    let filters = sink.filters();
    if filters.is_allow_all() {
        return batch.to_vec();
    }

    batch
        .iter()
        .filter(|record| filters.allows_record(record))
        .cloned()
        .collect()
}

/// Fan every batch from the supervisor out to all sinks.
///
/// Runs until the channel closes or `cancel` fires. A failing sink is logged
/// and counted; it never stops delivery to the others.
pub async fn run_distributor(
    mut input: BatchReceiver,
    sinks: Vec<Arc<dyn Sink>>,
    stats: Arc<DeliveryStats>,
    cancel: CancellationToken,
) {
    info!(sinks = sinks.len(), "Distributor started");

    loop {
        let batch = tokio::select! {
            _ = cancel.cancelled() => break,
            batch = input.recv() => match batch {
                Some(batch) => batch,
                None => break,
            },
        };

        stats.record_batch(batch.len());

        for sink in &sinks {
            let selected = select_for_sink(sink.as_ref(), &batch);
            if selected.is_empty() {
                debug!(sink = sink.name(), "No records for sink after filtering");
                continue;
            }

            match sink.deliver(&selected).await {
                Ok(()) => stats.record_delivered(selected.len()),
                Err(e) => {
                    stats.record_failure();
                    error!(sink = sink.name(), error = %e, count = selected.len(), "Failed to deliver logs");
                }
            }
        }
    }

    info!("Distributor stopped");
}
