use std::sync::mpsc::Sender;

use thiserror::Error;

use crate::error::{JotError, Result};
use crate::models::{RealtimeEvent, SyncMessage};

/// The underlying push transport dropped the subscription.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("realtime transport dropped: {0}")]
pub struct TransportDropped(pub String);

/// A server-pushed change feed scoped to the authenticated user. `next_event`
/// returns `Ok(None)` when no notification is currently available;
/// `resubscribe` re-establishes the feed after a drop.
pub trait RealtimeChannel: Send {
    fn next_event(&mut self) -> std::result::Result<Option<RealtimeEvent>, TransportDropped>;
    fn resubscribe(&mut self) -> std::result::Result<(), TransportDropped>;
}

/// Holds the single subscription and forwards notifications to the
/// reconciler in arrival order. A transport drop is not an error state:
/// the ingestor resubscribes and missed notifications are tolerated (the
/// next full fetch restores ground truth).
pub struct RealtimeIngestor {
    channel: Box<dyn RealtimeChannel>,
    reconnects: u64,
}

impl std::fmt::Debug for RealtimeIngestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeIngestor")
            .field("reconnects", &self.reconnects)
            .finish_non_exhaustive()
    }
}

impl RealtimeIngestor {
    #[must_use]
    pub fn new(channel: Box<dyn RealtimeChannel>) -> Self {
        Self {
            channel,
            reconnects: 0,
        }
    }

    #[must_use]
    pub fn reconnects(&self) -> u64 {
        self.reconnects
    }

    /// Forwards every currently available event. On a drop the subscription
    /// is re-established once per poll; a second consecutive drop ends the
    /// poll early and the next poll tries again.
    pub fn poll(&mut self, tx: &Sender<SyncMessage>) -> Result<usize> {
        let mut forwarded = 0usize;
        let mut just_resubscribed = false;

        loop {
            match self.channel.next_event() {
                Ok(Some(event)) => {
                    just_resubscribed = false;
                    tx.send(SyncMessage::Apply { event })
                        .map_err(|_| JotError::Internal("reconciler channel closed".to_string()))?;
                    forwarded += 1;
                }
                Ok(None) => break,
                Err(_dropped) if just_resubscribed => break,
                Err(_dropped) => {
                    self.channel
                        .resubscribe()
                        .map_err(|e| JotError::RealtimeUnavailable(e.to_string()))?;
                    self.reconnects += 1;
                    just_resubscribed = true;
                }
            }
        }

        Ok(forwarded)
    }
}
