use super::*;
use crate::models::{FlushTrigger, SubmitStatus, SyncNotice};

#[test]
fn connectivity_restored_flush_confirms_queued_write() {
    let writer = ScriptedWriter::new(vec![Outcome::Transient]);
    let (_dir, mut client) = fresh_client(&writer);

    let receipt = client
        .submit("Buy milk", SubmitOptions::default())
        .expect("submit");
    assert_eq!(receipt.status, SubmitStatus::Queued);
    assert!(client.entries()[0].pending);

    writer.push(Outcome::Confirm("e1"));
    let report = client
        .flush(FlushTrigger::ConnectivityRestored)
        .expect("flush");
    assert_eq!(report.confirmed, 1);

    let entries = client.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id.as_deref(), Some("e1"));
    assert_eq!(entries[0].content, "Buy milk");
    assert!(!entries[0].pending);
    assert_eq!(client.queue_counts().queued, 0);
}

#[test]
fn flush_replays_writes_in_submission_order() {
    let writer = ScriptedWriter::new(vec![
        Outcome::Transient,
        Outcome::Transient,
        Outcome::Transient,
    ]);
    let (_dir, mut client) = fresh_client(&writer);

    for content in ["a", "b", "c"] {
        client
            .submit(content, SubmitOptions::default())
            .expect("submit");
    }
    writer.push(Outcome::Confirm("e1"));
    writer.push(Outcome::Confirm("e2"));
    writer.push(Outcome::Confirm("e3"));

    let report = client.flush(FlushTrigger::Manual).expect("flush");
    assert_eq!(report.confirmed, 3);
    assert_eq!(writer.calls(), vec!["a", "b", "c", "a", "b", "c"]);

    let contents = client
        .entries()
        .iter()
        .map(|entry| entry.content.as_str())
        .collect::<Vec<_>>();
    assert_eq!(contents, vec!["c", "b", "a"]);
}

#[test]
fn retries_exhaust_with_a_single_dropped_notice() {
    let writer = ScriptedWriter::new(vec![Outcome::Transient]);
    let (_dir, mut client) = fresh_client(&writer);

    client
        .submit("flaky", SubmitOptions::default())
        .expect("submit");

    for attempt in 1..=4u32 {
        writer.push(Outcome::Transient);
        let report = client.flush(FlushTrigger::Interval).expect("flush");
        assert_eq!(report.requeued, 1, "attempt {attempt} should requeue");
    }
    assert_eq!(client.queue_counts().retrying, 1);

    writer.push(Outcome::Transient);
    let fifth = client.flush(FlushTrigger::Interval).expect("fifth flush");
    assert_eq!(fifth.dropped, 1);
    assert!(client.entries().is_empty());
    assert_eq!(client.queue_counts().queued, 0);

    let notices = client.take_notices();
    assert_eq!(notices.len(), 1);
    match &notices[0] {
        SyncNotice::WriteDropped {
            content, attempts, ..
        } => {
            assert_eq!(content, "flaky");
            assert_eq!(*attempts, 5);
        }
        other => panic!("unexpected notice: {other:?}"),
    }

    // The write is gone; a later trigger has nothing to attempt.
    let sixth = client.flush(FlushTrigger::Interval).expect("sixth flush");
    assert_eq!(sixth.attempted, 0);
    assert_eq!(writer.calls().len(), 6);
}

#[test]
fn queued_writes_survive_restart() {
    let dir = tempdir().expect("tempdir");
    {
        let writer = ScriptedWriter::new(vec![Outcome::Transient]);
        let mut client = client_at(dir.path(), &writer);
        client
            .submit("note from last session", SubmitOptions::default())
            .expect("submit");
    }

    let writer = ScriptedWriter::new(vec![Outcome::Confirm("e9")]);
    let mut client = client_at(dir.path(), &writer);
    assert!(client.entries().is_empty());
    assert_eq!(client.queue_counts().queued, 1);

    let report = client.flush(FlushTrigger::Manual).expect("flush");
    assert_eq!(report.confirmed, 1);

    let entries = client.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id.as_deref(), Some("e9"));
    assert_eq!(entries[0].content, "note from last session");
}
