use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::Duration;

use crate::config::SyncConfig;
use crate::error::{JotError, Result};
use crate::flusher::RetryFlusher;
use crate::ingestor::RealtimeIngestor;
use crate::models::{Entry, QueueCounts, SyncMessage, SyncNotice};
use crate::queue::DurableQueueStore;
use crate::reconciler::Reconciler;
use crate::remote::{EntryWriter, HttpEntryWriter, RemoteConfig};
use crate::store::SqliteSlotStore;

mod flush_service;
mod realtime_service;
mod request_log_service;
mod submit_service;

pub use submit_service::SubmitOptions;

/// The client-side sync core. Owns the reconciler (and through it the
/// optimistic view), the retry flusher (and through it the durable queue),
/// the optional realtime ingestor, and the single message channel that
/// every producer feeds.
pub struct JotSync {
    config: SyncConfig,
    root: PathBuf,
    remote: Arc<dyn EntryWriter>,
    reconciler: Reconciler,
    flusher: RetryFlusher,
    ingestor: Option<RealtimeIngestor>,
    tx: Sender<SyncMessage>,
    rx: Receiver<SyncMessage>,
}

impl std::fmt::Debug for JotSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JotSync").finish_non_exhaustive()
    }
}

impl JotSync {
    /// Opens a client rooted at `root_dir` with configuration from the
    /// `JOTSYNC_*` environment and the HTTP writer pointed at the configured
    /// endpoint.
    pub fn from_env(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let config = SyncConfig::from_env();
        let remote_config = RemoteConfig::from_sync_config(&config).ok_or_else(|| {
            JotError::Validation("JOTSYNC_ENDPOINT is required to build the HTTP writer".to_string())
        })?;
        let remote: Arc<dyn EntryWriter> = Arc::new(HttpEntryWriter::new(remote_config)?);
        Self::with_config(root_dir, config, remote)
    }

    pub fn new(root_dir: impl Into<PathBuf>, remote: Arc<dyn EntryWriter>) -> Result<Self> {
        Self::with_config(root_dir, SyncConfig::from_env(), remote)
    }

    pub fn with_config(
        root_dir: impl Into<PathBuf>,
        config: SyncConfig,
        remote: Arc<dyn EntryWriter>,
    ) -> Result<Self> {
        let root = root_dir.into();
        fs::create_dir_all(&root)?;
        let slots = SqliteSlotStore::open(root.join(".jotsync_state.sqlite3"))?;
        let queue = DurableQueueStore::open(Box::new(slots))?;
        let (tx, rx) = channel();

        let client = Self {
            flusher: RetryFlusher::new(queue, config.max_retries),
            config,
            root,
            remote,
            reconciler: Reconciler::new(),
            ingestor: None,
            tx,
            rx,
        };
        client.log_queue_open_discards();
        Ok(client)
    }

    /// Entries currently visible, newest first.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        self.reconciler.entries()
    }

    /// Drains accumulated user-facing notices (dropped writes, rejections,
    /// suspected conflicts) for the presentation layer.
    pub fn take_notices(&mut self) -> Vec<SyncNotice> {
        self.reconciler.take_notices()
    }

    #[must_use]
    pub fn queue_counts(&self) -> QueueCounts {
        self.flusher.queue().counts()
    }

    #[must_use]
    pub fn realtime_reconnects(&self) -> Option<u64> {
        self.ingestor.as_ref().map(RealtimeIngestor::reconnects)
    }

    /// How often the host should fire the interval fallback trigger when no
    /// connectivity signal is available.
    #[must_use]
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.config.flush_interval_secs)
    }

    /// Merges every message currently buffered on the producer channel into
    /// the view. Called after each producer step; harmless to call again.
    /// Notices produced by the merge get a warning record in the request log.
    pub fn pump_messages(&mut self) -> usize {
        let notices_before = self.reconciler.notices().len();
        let merged = self.reconciler.drain(&self.rx);
        for notice in &self.reconciler.notices()[notices_before..] {
            self.log_notice_warning(notice);
        }
        merged
    }

    fn send(&self, message: SyncMessage) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| JotError::Internal("reconciler channel closed".to_string()))
    }

    fn log_queue_open_discards(&self) {
        let queue = self.flusher.queue();
        if queue.discarded_legacy_slot() {
            self.log_warning_simple(
                "queue.open",
                "discarded queue data stored under the legacy slot key",
            );
        }
        if queue.discarded_corrupt_slot() {
            self.log_warning_simple("queue.open", "discarded undecodable queue slot");
        }
    }
}
