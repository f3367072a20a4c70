use crate::record::LogRecord;
use tokio::sync::mpsc;

/// A non-empty batch of enriched records, in stream order.
pub type Batch = Vec<LogRecord>;

pub type BatchSender = mpsc::Sender<Batch>;
pub type BatchReceiver = mpsc::Receiver<Batch>;

/// Create the bounded hand-off channel between the supervisor and the
/// distribution stage. A full channel blocks the supervisor.
pub fn create_channel(buffer_size: usize) -> (BatchSender, BatchReceiver) {
    mpsc::channel(buffer_size.max(1))
}
