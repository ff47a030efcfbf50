use std::sync::mpsc::Sender;

use crate::error::{JotError, Result};
use crate::models::{DiscardReason, FlushReport, FlushTrigger, QueuedWrite, SyncMessage};
use crate::queue::DurableQueueStore;
use crate::remote::{EntryWriter, RemoteWriteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushState {
    Idle,
    Flushing,
}

/// Drains the durable queue sequentially, one write at a time, in FIFO
/// order. Retries ride discrete triggers (connectivity restored, interval
/// timer), so there is no in-process backoff loop. The {Idle, Flushing}
/// state machine coalesces a trigger arriving mid-pass into one follow-up
/// pass instead of starting a concurrent drain.
pub struct RetryFlusher {
    queue: DurableQueueStore,
    state: FlushState,
    pending_trigger: Option<FlushTrigger>,
    max_retries: u32,
}

impl std::fmt::Debug for RetryFlusher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryFlusher")
            .field("state", &self.state)
            .field("queued", &self.queue.list().len())
            .finish_non_exhaustive()
    }
}

impl RetryFlusher {
    #[must_use]
    pub fn new(queue: DurableQueueStore, max_retries: u32) -> Self {
        Self {
            queue,
            state: FlushState::Idle,
            pending_trigger: None,
            max_retries: max_retries.max(1),
        }
    }

    #[must_use]
    pub fn queue(&self) -> &DurableQueueStore {
        &self.queue
    }

    /// Append path for the submitter. The flusher owns the store; nothing
    /// else mutates it after the initial enqueue.
    pub fn append(&mut self, write: QueuedWrite) -> Result<()> {
        self.queue.enqueue(write)
    }

    pub fn flush(
        &mut self,
        trigger: FlushTrigger,
        remote: &dyn EntryWriter,
        tx: &Sender<SyncMessage>,
    ) -> Result<FlushReport> {
        if self.state == FlushState::Flushing {
            self.pending_trigger = Some(trigger);
            return Ok(FlushReport::coalesced(trigger));
        }

        self.state = FlushState::Flushing;
        let result = self.run_until_settled(trigger, remote, tx);
        self.state = FlushState::Idle;
        result
    }

    fn run_until_settled(
        &mut self,
        trigger: FlushTrigger,
        remote: &dyn EntryWriter,
        tx: &Sender<SyncMessage>,
    ) -> Result<FlushReport> {
        let mut report = FlushReport {
            trigger,
            attempted: 0,
            confirmed: 0,
            requeued: 0,
            dropped: 0,
            passes: 0,
            coalesced: false,
        };

        loop {
            self.run_pass(remote, tx, &mut report)?;
            report.passes += 1;
            if self.pending_trigger.take().is_none() {
                break;
            }
        }

        Ok(report)
    }

    fn run_pass(
        &mut self,
        remote: &dyn EntryWriter,
        tx: &Sender<SyncMessage>,
        report: &mut FlushReport,
    ) -> Result<()> {
        let snapshot = self.queue.list().to_vec();

        for write in snapshot {
            report.attempted += 1;
            match remote.create_entry(&write.payload) {
                Ok(canonical) => {
                    send(
                        tx,
                        SyncMessage::Confirm {
                            temp_id: write.temp_id.clone(),
                            canonical,
                        },
                    )?;
                    self.queue.remove(&write.temp_id)?;
                    report.confirmed += 1;
                }
                Err(RemoteWriteError::Rejected(message)) => {
                    self.queue.remove(&write.temp_id)?;
                    send(
                        tx,
                        SyncMessage::Discard {
                            temp_id: write.temp_id.clone(),
                            content: write.payload.content.clone(),
                            reason: DiscardReason::Rejected { message },
                        },
                    )?;
                    report.dropped += 1;
                }
                Err(RemoteWriteError::Transient(_)) => {
                    let attempts = write.retry_count.saturating_add(1);
                    if attempts >= self.max_retries {
                        self.queue.remove(&write.temp_id)?;
                        send(
                            tx,
                            SyncMessage::Discard {
                                temp_id: write.temp_id.clone(),
                                content: write.payload.content.clone(),
                                reason: DiscardReason::RetriesExhausted { attempts },
                            },
                        )?;
                        report.dropped += 1;
                    } else {
                        self.queue
                            .update(&write.temp_id, |queued| queued.retry_count = attempts)?;
                        report.requeued += 1;
                    }
                }
            }
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn force_flushing_for_test(&mut self) {
        self.state = FlushState::Flushing;
    }

    #[cfg(test)]
    pub(crate) fn release_for_test(&mut self) {
        self.state = FlushState::Idle;
    }

    #[cfg(test)]
    pub(crate) fn seed_pending_trigger_for_test(&mut self, trigger: FlushTrigger) {
        self.pending_trigger = Some(trigger);
    }

    #[cfg(test)]
    pub(crate) fn pending_trigger_for_test(&self) -> Option<FlushTrigger> {
        self.pending_trigger
    }
}

fn send(tx: &Sender<SyncMessage>, message: SyncMessage) -> Result<()> {
    tx.send(message)
        .map_err(|_| JotError::Internal("reconciler channel closed".to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::mpsc;

    use chrono::Utc;

    use super::*;
    use crate::models::{Classification, Entry, WriteRequest};
    use crate::queue::InMemorySlots;

    enum Script {
        Confirm(&'static str),
        Transient,
        Rejected(&'static str),
    }

    struct ScriptWriter {
        outcomes: Mutex<VecDeque<Script>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptWriter {
        fn new(outcomes: Vec<Script>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    impl EntryWriter for ScriptWriter {
        fn create_entry(
            &self,
            request: &WriteRequest,
        ) -> std::result::Result<Entry, RemoteWriteError> {
            self.calls
                .lock()
                .expect("calls lock")
                .push(request.content.clone());
            let script = self
                .outcomes
                .lock()
                .expect("outcomes lock")
                .pop_front()
                .expect("script exhausted");
            match script {
                Script::Confirm(id) => {
                    let now = Utc::now();
                    Ok(Entry {
                        id: Some(id.to_string()),
                        temp_id: None,
                        content: request.content.clone(),
                        classification: Classification::default(),
                        created_at: now,
                        updated_at: now,
                        pending: false,
                    })
                }
                Script::Transient => Err(RemoteWriteError::Transient("offline".to_string())),
                Script::Rejected(message) => {
                    Err(RemoteWriteError::Rejected(message.to_string()))
                }
            }
        }
    }

    fn flusher_with(writes: Vec<QueuedWrite>, max_retries: u32) -> RetryFlusher {
        let mut queue =
            DurableQueueStore::open(Box::new(InMemorySlots::default())).expect("open queue");
        for write in writes {
            queue.enqueue(write).expect("enqueue");
        }
        RetryFlusher::new(queue, max_retries)
    }

    fn queued(temp_id: &str, content: &str) -> QueuedWrite {
        QueuedWrite {
            temp_id: temp_id.to_string(),
            payload: WriteRequest {
                content: content.to_string(),
                user_id: "u1".to_string(),
                source: "test".to_string(),
                attachment_ref: None,
            },
            retry_count: 0,
            enqueued_at: Utc::now(),
        }
    }

    #[test]
    fn flush_drains_in_fifo_order() {
        let writer = ScriptWriter::new(vec![
            Script::Confirm("e1"),
            Script::Confirm("e2"),
            Script::Confirm("e3"),
        ]);
        let mut flusher = flusher_with(
            vec![queued("t1", "w1"), queued("t2", "w2"), queued("t3", "w3")],
            5,
        );
        let (tx, rx) = mpsc::channel();

        let report = flusher
            .flush(FlushTrigger::ConnectivityRestored, &writer, &tx)
            .expect("flush");
        assert_eq!(report.attempted, 3);
        assert_eq!(report.confirmed, 3);
        assert_eq!(report.passes, 1);
        assert!(flusher.queue().list().is_empty());
        assert_eq!(writer.calls(), vec!["w1", "w2", "w3"]);

        let confirms = rx.try_iter().count();
        assert_eq!(confirms, 3);
    }

    #[test]
    fn trigger_during_active_pass_is_coalesced_not_concurrent() {
        let writer = ScriptWriter::new(Vec::new());
        let mut flusher = flusher_with(Vec::new(), 5);
        let (tx, _rx) = mpsc::channel();

        flusher.force_flushing_for_test();
        let report = flusher
            .flush(FlushTrigger::Interval, &writer, &tx)
            .expect("flush while active");
        assert!(report.coalesced);
        assert_eq!(report.passes, 0);
        assert_eq!(
            flusher.pending_trigger_for_test(),
            Some(FlushTrigger::Interval)
        );
        flusher.release_for_test();
    }

    #[test]
    fn pending_trigger_runs_exactly_one_follow_up_pass() {
        let writer = ScriptWriter::new(Vec::new());
        let mut flusher = flusher_with(Vec::new(), 5);
        let (tx, _rx) = mpsc::channel();

        flusher.seed_pending_trigger_for_test(FlushTrigger::ConnectivityRestored);
        let report = flusher
            .flush(FlushTrigger::Manual, &writer, &tx)
            .expect("flush");
        assert!(!report.coalesced);
        assert_eq!(report.passes, 2);
        assert_eq!(flusher.pending_trigger_for_test(), None);
    }

    #[test]
    fn retry_ceiling_drops_write_with_exactly_one_discard() {
        let writer = ScriptWriter::new(vec![
            Script::Transient,
            Script::Transient,
            Script::Transient,
            Script::Transient,
            Script::Transient,
        ]);
        let mut flusher = flusher_with(vec![queued("t1", "flaky")], 5);
        let (tx, rx) = mpsc::channel();

        for attempt in 1..=4u32 {
            let report = flusher
                .flush(FlushTrigger::Interval, &writer, &tx)
                .expect("flush");
            assert_eq!(report.requeued, 1, "attempt {attempt} should requeue");
            assert_eq!(flusher.queue().list()[0].retry_count, attempt);
        }

        let fifth = flusher
            .flush(FlushTrigger::Interval, &writer, &tx)
            .expect("fifth flush");
        assert_eq!(fifth.dropped, 1);
        assert!(flusher.queue().list().is_empty());

        // A sixth trigger finds nothing to attempt.
        let sixth = flusher
            .flush(FlushTrigger::Interval, &writer, &tx)
            .expect("sixth flush");
        assert_eq!(sixth.attempted, 0);
        assert_eq!(writer.calls().len(), 5);

        let discards = rx
            .try_iter()
            .filter(|message| {
                matches!(
                    message,
                    SyncMessage::Discard {
                        reason: DiscardReason::RetriesExhausted { attempts: 5 },
                        ..
                    }
                )
            })
            .count();
        assert_eq!(discards, 1);
    }

    #[test]
    fn rejection_during_retry_discards_without_requeue() {
        let writer = ScriptWriter::new(vec![Script::Rejected("payload too large")]);
        let mut flusher = flusher_with(vec![queued("t1", "oversized")], 5);
        let (tx, rx) = mpsc::channel();

        let report = flusher
            .flush(FlushTrigger::Manual, &writer, &tx)
            .expect("flush");
        assert_eq!(report.dropped, 1);
        assert_eq!(report.requeued, 0);
        assert!(flusher.queue().list().is_empty());

        let messages = rx.try_iter().collect::<Vec<_>>();
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            &messages[0],
            SyncMessage::Discard {
                reason: DiscardReason::Rejected { .. },
                ..
            }
        ));
    }
}
