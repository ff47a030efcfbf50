use chrono::Duration;

use super::*;
use crate::models::{FlushTrigger, SubmitStatus};

#[test]
fn push_arriving_before_confirmation_leaves_one_entry() {
    let writer = ScriptedWriter::new(vec![Outcome::Transient]);
    let (_dir, mut client) = fresh_client(&writer);

    let receipt = client
        .submit("Buy milk", SubmitOptions::default())
        .expect("submit");
    assert_eq!(receipt.status, SubmitStatus::Queued);

    let (channel, feed) = scripted_channel();
    client.attach_realtime(channel).expect("attach");
    push_event(&feed, insert_event(canonical_entry("e1", "Buy milk")));
    assert_eq!(client.poll_realtime().expect("poll"), 1);

    writer.push(Outcome::Confirm("e1"));
    client
        .flush(FlushTrigger::ConnectivityRestored)
        .expect("flush");

    let entries = client.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id.as_deref(), Some("e1"));
    assert!(!entries[0].pending);
}

#[test]
fn push_arriving_after_confirmation_is_idempotent() {
    let writer = ScriptedWriter::new(vec![Outcome::Transient]);
    let (_dir, mut client) = fresh_client(&writer);

    client
        .submit("Buy milk", SubmitOptions::default())
        .expect("submit");
    writer.push(Outcome::Confirm("e1"));
    client
        .flush(FlushTrigger::ConnectivityRestored)
        .expect("flush");

    let (channel, feed) = scripted_channel();
    client.attach_realtime(channel).expect("attach");
    push_event(&feed, insert_event(canonical_entry("e1", "Buy milk")));
    client.poll_realtime().expect("poll");

    assert_eq!(client.entries().len(), 1);
    assert_eq!(client.entries()[0].id.as_deref(), Some("e1"));
}

#[test]
fn newer_update_replaces_and_older_is_ignored() {
    let writer = ScriptedWriter::new(Vec::new());
    let (_dir, mut client) = fresh_client(&writer);

    let (channel, feed) = scripted_channel();
    client.attach_realtime(channel).expect("attach");

    let t0 = chrono::Utc::now();
    push_event(&feed, insert_event(canonical_entry_at("e1", "v1", t0)));
    client.poll_realtime().expect("poll insert");

    push_event(
        &feed,
        update_event(canonical_entry_at("e1", "v2", t0 + Duration::seconds(5))),
    );
    client.poll_realtime().expect("poll update");
    assert_eq!(client.entries()[0].content, "v2");

    push_event(
        &feed,
        update_event(canonical_entry_at("e1", "v0", t0 - Duration::seconds(5))),
    );
    client.poll_realtime().expect("poll stale update");
    assert_eq!(client.entries()[0].content, "v2");
}

#[test]
fn delete_push_removes_the_entry() {
    let writer = ScriptedWriter::new(Vec::new());
    let (_dir, mut client) = fresh_client(&writer);

    let (channel, feed) = scripted_channel();
    client.attach_realtime(channel).expect("attach");

    push_event(&feed, insert_event(canonical_entry("e1", "short lived")));
    client.poll_realtime().expect("poll insert");
    assert_eq!(client.entries().len(), 1);

    push_event(&feed, delete_event("e1"));
    client.poll_realtime().expect("poll delete");
    assert!(client.entries().is_empty());
}

#[test]
fn transport_drop_is_absorbed_by_resubscribing() {
    let writer = ScriptedWriter::new(Vec::new());
    let (_dir, mut client) = fresh_client(&writer);

    let (channel, feed) = scripted_channel();
    client.attach_realtime(channel).expect("attach");

    push_event(&feed, insert_event(canonical_entry("e1", "before drop")));
    push_drop(&feed);
    push_event(&feed, insert_event(canonical_entry("e2", "after drop")));

    assert_eq!(client.poll_realtime().expect("poll"), 2);
    assert_eq!(client.realtime_reconnects(), Some(1));
    assert_eq!(client.entries().len(), 2);
}

#[test]
fn second_subscription_is_refused() {
    let writer = ScriptedWriter::new(Vec::new());
    let (_dir, mut client) = fresh_client(&writer);

    let (first, _feed) = scripted_channel();
    client.attach_realtime(first).expect("first attach");

    let (second, _feed) = scripted_channel();
    let err = client
        .attach_realtime(second)
        .expect_err("second attach must fail");
    assert!(matches!(err, JotError::Conflict(_)));
}

#[test]
fn poll_without_subscription_applies_nothing() {
    let writer = ScriptedWriter::new(Vec::new());
    let (_dir, mut client) = fresh_client(&writer);

    assert_eq!(client.poll_realtime().expect("poll"), 0);
}
