use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entry::WriteRequest;

/// A durable record of a write attempt not yet confirmed successful.
/// Unknown fields from future versions are ignored on decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuedWrite {
    pub temp_id: String,
    pub payload: WriteRequest,
    #[serde(default)]
    pub retry_count: u32,
    pub enqueued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct QueueCounts {
    pub queued: usize,
    pub retrying: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest_enqueued_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FlushTrigger {
    ConnectivityRestored,
    Interval,
    Manual,
}

impl FlushTrigger {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConnectivityRestored => "connectivity_restored",
            Self::Interval => "interval",
            Self::Manual => "manual",
        }
    }
}

impl std::fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlushTrigger {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "connectivity_restored" => Ok(Self::ConnectivityRestored),
            "interval" => Ok(Self::Interval),
            "manual" => Ok(Self::Manual),
            other => Err(format!("unknown flush trigger: {other}")),
        }
    }
}

/// Outcome of one `flush` call. `coalesced` means a pass was already active
/// and this trigger was folded into it; `passes` counts drain passes actually
/// run (a trigger arriving mid-pass schedules one follow-up pass).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlushReport {
    pub trigger: FlushTrigger,
    pub attempted: usize,
    pub confirmed: usize,
    pub requeued: usize,
    pub dropped: usize,
    pub passes: u32,
    pub coalesced: bool,
}

impl FlushReport {
    #[must_use]
    pub fn coalesced(trigger: FlushTrigger) -> Self {
        Self {
            trigger,
            attempted: 0,
            confirmed: 0,
            requeued: 0,
            dropped: 0,
            passes: 0,
            coalesced: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SubmitStatus {
    /// The remote write succeeded inline; the entry is already canonical.
    Confirmed { id: String },
    /// Transient failure; the write is durably queued and the entry stays
    /// pending so the UI can show a syncing affordance.
    Queued,
    /// Definitive rejection; never queued, the pending entry was discarded.
    Rejected { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitReceipt {
    pub temp_id: String,
    #[serde(flatten)]
    pub status: SubmitStatus,
}
