pub mod channel;
pub mod enrich;
pub mod filter;

pub use channel::{create_channel, Batch, BatchReceiver, BatchSender};
pub use enrich::{drop_reason, process, DropReason};
pub use filter::LogFilters;
