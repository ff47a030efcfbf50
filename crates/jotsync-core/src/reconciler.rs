use std::sync::mpsc::Receiver;

use crate::models::{DiscardReason, Entry, RealtimeEvent, RealtimeOp, SyncMessage, SyncNotice};
use crate::view::ViewStore;

/// The single point of truth-merging. Owns the optimistic view outright and
/// performs no I/O: every operation is a pure, synchronous merge over
/// in-memory state, so it cannot fail and needs no locks. The merges are
/// idempotent and commutative for duplicate or out-of-order delivery of the
/// same logical write, which is the property the whole sync core leans on.
#[derive(Debug, Default)]
pub struct Reconciler {
    view: ViewStore,
    notices: Vec<SyncNotice>,
}

impl Reconciler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn view(&self) -> &ViewStore {
        &self.view
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        self.view.entries()
    }

    #[must_use]
    pub fn notices(&self) -> &[SyncNotice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<SyncNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Drains every message currently buffered on the channel. Returns how
    /// many were merged.
    pub fn drain(&mut self, rx: &Receiver<SyncMessage>) -> usize {
        let mut merged = 0usize;
        while let Ok(message) = rx.try_recv() {
            self.handle(message);
            merged += 1;
        }
        merged
    }

    pub fn handle(&mut self, message: SyncMessage) {
        match message {
            SyncMessage::Stage { entry } => self.stage(entry),
            SyncMessage::Confirm { temp_id, canonical } => self.confirm(&temp_id, canonical),
            SyncMessage::Discard {
                temp_id,
                content,
                reason,
            } => self.discard(&temp_id, &content, reason),
            SyncMessage::Apply { event } => self.apply(event),
        }
    }

    /// Inserts a freshly submitted pending entry at the head of the view.
    /// A repeated stage for the same temp_id is a no-op.
    pub fn stage(&mut self, entry: Entry) {
        if let Some(temp_id) = entry.temp_id.as_deref()
            && self.view.position_of_temp_id(temp_id).is_some()
        {
            return;
        }
        self.view.insert_head(entry);
    }

    /// Replaces the pending entry keyed by `temp_id` with the canonical
    /// server record. If a realtime insert for the same canonical id already
    /// landed, the pending twin is dropped and the canonical payload wins;
    /// both paths carry the same authoritative record, so arrival order does
    /// not matter. A confirm whose pending entry is gone (restart, missed
    /// window) inserts the canonical record at the head: the server
    /// acknowledged the write, so it must become visible exactly once.
    pub fn confirm(&mut self, temp_id: &str, canonical: Entry) {
        let canonical = canonicalize(canonical);
        let pending_idx = self.view.position_of_temp_id(temp_id);

        let Some(id) = canonical.id.clone() else {
            // No server id on the ack; the best we can do is clear the
            // pending flag in place.
            match pending_idx {
                Some(idx) => self.view.replace_at(idx, canonical),
                None => self.view.insert_head(canonical),
            }
            return;
        };

        if let Some(existing_idx) = self.view.position_of_id(&id) {
            self.view.replace_at(existing_idx, canonical);
            if let Some(idx) = self.view.position_of_temp_id(temp_id) {
                self.view.remove_at(idx);
            }
            return;
        }

        match pending_idx {
            Some(idx) => self.view.replace_at(idx, canonical),
            None => self.view.insert_head(canonical),
        }
    }

    /// Removes the pending entry entirely and records exactly one
    /// user-visible notice. Content must never vanish silently: the notice
    /// carries the original text even when the view entry is already gone.
    pub fn discard(&mut self, temp_id: &str, content: &str, reason: DiscardReason) {
        let removed = self.view.remove_by_temp_id(temp_id);
        let content = removed
            .map(|entry| entry.content)
            .unwrap_or_else(|| content.to_string());
        let notice = match reason {
            DiscardReason::Rejected { message } => SyncNotice::WriteRejected {
                temp_id: temp_id.to_string(),
                content,
                message,
            },
            DiscardReason::RetriesExhausted { attempts } => SyncNotice::WriteDropped {
                temp_id: temp_id.to_string(),
                content,
                attempts,
            },
        };
        self.notices.push(notice);
    }

    pub fn apply(&mut self, event: RealtimeEvent) {
        match event.operation {
            RealtimeOp::Insert => {
                let Some(incoming) = event.new_record else {
                    return;
                };
                self.apply_insert(canonicalize(incoming));
            }
            RealtimeOp::Update => {
                let Some(incoming) = event.new_record else {
                    return;
                };
                self.apply_update(canonicalize(incoming));
            }
            RealtimeOp::Delete => {
                let id = event
                    .old_record
                    .and_then(|record| record.id)
                    .or_else(|| event.new_record.and_then(|record| record.id));
                if let Some(id) = id {
                    self.view.remove_by_id(&id);
                }
            }
        }
    }

    fn apply_insert(&mut self, incoming: Entry) {
        let Some(id) = incoming.id.as_deref() else {
            return;
        };
        if self.view.position_of_id(id).is_some() {
            // Already visible, via an earlier confirm or a duplicate push.
            return;
        }
        self.view.insert_head(incoming);
    }

    fn apply_update(&mut self, incoming: Entry) {
        let Some(id) = incoming.id.clone() else {
            return;
        };
        let Some(idx) = self.view.position_of_id(&id) else {
            // The insert notification was missed while disconnected; a full
            // payload is authoritative enough to materialize late.
            if !incoming.content.is_empty() {
                self.view.insert_head(incoming);
            }
            return;
        };

        let local = &self.view.entries()[idx];
        if incoming.updated_at > local.updated_at {
            self.view.replace_at(idx, incoming);
        } else if incoming.updated_at == local.updated_at
            && incoming.content_hash() != local.content_hash()
        {
            // Same timestamp, different payload: a concurrent edit from
            // another session. State keeps the local value; the conflict is
            // surfaced instead of silently resolved.
            self.notices.push(SyncNotice::ConflictSuspected {
                id,
                local_content: local.content.clone(),
                incoming_content: incoming.content,
                updated_at: local.updated_at,
            });
        }
        // Strictly older pushes are stale and dropped outright.
    }
}

/// Server records never carry client-only flags; strip them so a push
/// payload cannot resurrect a pending marker.
fn canonicalize(mut entry: Entry) -> Entry {
    entry.pending = false;
    entry.temp_id = None;
    entry
}
