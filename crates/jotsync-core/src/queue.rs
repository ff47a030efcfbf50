use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{JotError, Result};
use crate::models::{QueueCounts, QueuedWrite};
use crate::store::SqliteSlotStore;

/// Slot key holding the serialized queue. The unversioned key was used by an
/// earlier release with an incompatible payload shape; whatever is still
/// stored under it is discarded once at open.
pub const QUEUE_SLOT_KEY: &str = "pending_writes_v2";
pub const LEGACY_QUEUE_SLOT_KEY: &str = "pending_writes";

/// Persistence port for the durable queue: a single keyed text slot.
/// Swappable for an in-memory fake in tests.
pub trait QueuePersistence: Send {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn store(&self, key: &str, value: &str) -> Result<()>;
    fn clear(&self, key: &str) -> Result<bool>;
}

impl QueuePersistence for SqliteSlotStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        self.get_slot(key)
    }

    fn store(&self, key: &str, value: &str) -> Result<()> {
        self.set_slot(key, value)
    }

    fn clear(&self, key: &str) -> Result<bool> {
        self.clear_slot(key)
    }
}

/// In-memory persistence fake. Lets queue and client behavior be exercised
/// without touching a real database.
#[derive(Debug, Default)]
pub struct InMemorySlots {
    slots: Mutex<HashMap<String, String>>,
}

impl QueuePersistence for InMemorySlots {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| JotError::mutex_poisoned("memory slots"))?;
        Ok(slots.get(key).cloned())
    }

    fn store(&self, key: &str, value: &str) -> Result<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| JotError::mutex_poisoned("memory slots"))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<bool> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| JotError::mutex_poisoned("memory slots"))?;
        Ok(slots.remove(key).is_some())
    }
}

/// Ordered list of not-yet-confirmed writes, kept in insertion (FIFO) order
/// and re-serialized to the slot on every mutation. Exclusively owned by the
/// retry flusher; the submitter reaches it only through `enqueue`.
pub struct DurableQueueStore {
    persistence: Box<dyn QueuePersistence>,
    writes: Vec<QueuedWrite>,
    discarded_legacy_slot: bool,
    discarded_corrupt_slot: bool,
}

impl std::fmt::Debug for DurableQueueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableQueueStore")
            .field("len", &self.writes.len())
            .finish_non_exhaustive()
    }
}

impl DurableQueueStore {
    pub fn open(persistence: Box<dyn QueuePersistence>) -> Result<Self> {
        let discarded_legacy_slot = persistence.clear(LEGACY_QUEUE_SLOT_KEY)?;

        let mut discarded_corrupt_slot = false;
        let writes = match persistence.load(QUEUE_SLOT_KEY)? {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<QueuedWrite>>(&raw) {
                Ok(writes) => writes,
                Err(_) => {
                    // An undecodable slot must not poison every startup;
                    // treated like the legacy key.
                    persistence.clear(QUEUE_SLOT_KEY)?;
                    discarded_corrupt_slot = true;
                    Vec::new()
                }
            },
        };

        Ok(Self {
            persistence,
            writes,
            discarded_legacy_slot,
            discarded_corrupt_slot,
        })
    }

    #[must_use]
    pub fn discarded_legacy_slot(&self) -> bool {
        self.discarded_legacy_slot
    }

    #[must_use]
    pub fn discarded_corrupt_slot(&self) -> bool {
        self.discarded_corrupt_slot
    }

    pub fn enqueue(&mut self, write: QueuedWrite) -> Result<()> {
        self.writes.push(write);
        self.persist()
    }

    #[must_use]
    pub fn list(&self) -> &[QueuedWrite] {
        &self.writes
    }

    pub fn remove(&mut self, temp_id: &str) -> Result<bool> {
        let before = self.writes.len();
        self.writes
            .retain(|write| write.temp_id.as_str() != temp_id);
        if self.writes.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn update(
        &mut self,
        temp_id: &str,
        patch: impl FnOnce(&mut QueuedWrite),
    ) -> Result<bool> {
        let Some(write) = self
            .writes
            .iter_mut()
            .find(|write| write.temp_id.as_str() == temp_id)
        else {
            return Ok(false);
        };
        patch(write);
        self.persist()?;
        Ok(true)
    }

    #[must_use]
    pub fn counts(&self) -> QueueCounts {
        QueueCounts {
            queued: self.writes.len(),
            retrying: self
                .writes
                .iter()
                .filter(|write| write.retry_count > 0)
                .count(),
            earliest_enqueued_at: self.writes.iter().map(|write| write.enqueued_at).min(),
        }
    }

    fn persist(&self) -> Result<()> {
        let raw = serde_json::to_string(&self.writes)?;
        self.persistence.store(QUEUE_SLOT_KEY, &raw)
    }
}
