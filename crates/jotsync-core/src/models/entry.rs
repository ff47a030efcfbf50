use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification metadata attached to an entry by the backend. Absent on
/// pending entries; the server fills it in during enrichment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Classification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted: Option<serde_json::Value>,
}

/// A user-visible record. `pending` and `temp_id` are client-only and never
/// persisted server-side: during the pending window an entry exists under its
/// `temp_id` only; once confirmed it carries the canonical `id` only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub classification: Classification,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pending: bool,
}

impl Entry {
    #[must_use]
    pub fn pending_with_temp_id(temp_id: &str, content: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            temp_id: Some(temp_id.to_string()),
            content: content.to_string(),
            classification: Classification::default(),
            created_at: now,
            updated_at: now,
            pending: true,
        }
    }

    /// Stable fingerprint of the user-authored payload, used to distinguish
    /// a redundant same-timestamp push from a genuine concurrent edit.
    #[must_use]
    pub fn content_hash(&self) -> String {
        blake3::hash(self.content.as_bytes()).to_hex().to_string()
    }
}

/// Request body for the remote write operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WriteRequest {
    pub content: String,
    pub user_id: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_ref: Option<String>,
}
