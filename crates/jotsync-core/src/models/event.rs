use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entry::Entry;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RealtimeOp {
    Insert,
    Update,
    Delete,
}

impl RealtimeOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for RealtimeOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RealtimeOp {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "insert" => Ok(Self::Insert),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown realtime operation: {other}")),
        }
    }
}

/// One inbound change notification from the push channel. Not persisted;
/// consumed exactly once by the reconciler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RealtimeEvent {
    pub operation: RealtimeOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_record: Option<Entry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_record: Option<Entry>,
    pub server_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum DiscardReason {
    Rejected { message: String },
    RetriesExhausted { attempts: u32 },
}

/// Typed message from a producer (submitter, flusher, ingestor) to the
/// reconciler. The single channel carrying these is the only way any
/// component reaches the optimistic view.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncMessage {
    Stage {
        entry: Entry,
    },
    Confirm {
        temp_id: String,
        canonical: Entry,
    },
    Discard {
        temp_id: String,
        content: String,
        reason: DiscardReason,
    },
    Apply {
        event: RealtimeEvent,
    },
}

/// User-facing outcome the UI must surface. Notices are collected in memory
/// and drained by the presentation layer; they are never raised as errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "notice")]
pub enum SyncNotice {
    /// The server definitively rejected the write; the content is preserved
    /// here so the user can edit and resubmit.
    WriteRejected {
        temp_id: String,
        content: String,
        message: String,
    },
    /// The retry budget was exhausted and the content was dropped from the
    /// durable queue.
    WriteDropped {
        temp_id: String,
        content: String,
        attempts: u32,
    },
    /// A push update carried the same `updated_at` as the local entry but a
    /// different payload; state was left untouched.
    ConflictSuspected {
        id: String,
        local_content: String,
        incoming_content: String,
        updated_at: DateTime<Utc>,
    },
}
