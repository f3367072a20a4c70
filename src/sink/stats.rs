use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Counters shared between the distribution stage and the status reporter.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    batches_received: AtomicU64,
    records_received: AtomicU64,
    records_delivered: AtomicU64,
    delivery_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub batches_received: u64,
    pub records_received: u64,
    pub records_delivered: u64,
    pub delivery_failures: u64,
}

impl DeliveryStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_batch(&self, records: usize) {
        self.batches_received.fetch_add(1, Ordering::Relaxed);
        self.records_received
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    pub fn record_delivered(&self, records: usize) {
        self.records_delivered
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            batches_received: self.batches_received.load(Ordering::Relaxed),
            records_received: self.records_received.load(Ordering::Relaxed),
            records_delivered: self.records_delivered.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
        }
    }
}

/// Log a stats snapshot every `every` until cancelled.
pub async fn run_status_reporter(
    stats: Arc<DeliveryStats>,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(every);
    // First tick fires immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {
                let s = stats.snapshot();
                info!(
                    batches_received = s.batches_received,
                    records_received = s.records_received,
                    records_delivered = s.records_delivered,
                    delivery_failures = s.delivery_failures,
                    "Status"
                );
            }
        }
    }
}
