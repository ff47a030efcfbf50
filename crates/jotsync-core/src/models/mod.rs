mod entry;
mod event;
mod log;
mod queue;

pub use entry::{Classification, Entry, WriteRequest};
pub use event::{DiscardReason, RealtimeEvent, RealtimeOp, SyncMessage, SyncNotice};
pub use log::RequestLogEntry;
pub use queue::{
    FlushReport, FlushTrigger, QueueCounts, QueuedWrite, SubmitReceipt, SubmitStatus,
};
