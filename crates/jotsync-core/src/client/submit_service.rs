use std::time::Instant;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::JotSync;
use crate::error::{JotError, Result};
use crate::models::{
    DiscardReason, Entry, QueuedWrite, SubmitReceipt, SubmitStatus, SyncMessage, WriteRequest,
};
use crate::remote::RemoteWriteError;

#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// Overrides the configured capture source for this write.
    pub source: Option<String>,
    pub attachment_ref: Option<String>,
}

impl JotSync {
    /// Captures a new entry. The entry appears at the head of the view under
    /// a fresh temporary id before the network is touched; the receipt says
    /// whether the write confirmed inline, was queued for retry, or was
    /// rejected outright.
    pub fn submit(&mut self, content: &str, options: SubmitOptions) -> Result<SubmitReceipt> {
        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();

        if content.trim().is_empty() {
            let err = JotError::Validation("entry content must not be empty".to_string());
            self.log_request_error(&request_id, "entry.submit", started, &err);
            return Err(err);
        }

        let temp_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        self.send(SyncMessage::Stage {
            entry: Entry::pending_with_temp_id(&temp_id, content, now),
        })?;
        self.pump_messages();

        let request = WriteRequest {
            content: content.to_string(),
            user_id: self.config.user_id.clone(),
            source: options.source.unwrap_or_else(|| self.config.source.clone()),
            attachment_ref: options.attachment_ref,
        };

        let status = match self.remote.create_entry(&request) {
            Ok(canonical) => {
                let id = canonical.id.clone().unwrap_or_default();
                self.send(SyncMessage::Confirm {
                    temp_id: temp_id.clone(),
                    canonical,
                })?;
                self.log_request_ok(
                    &request_id,
                    "entry.submit",
                    started,
                    Some(json!({ "temp_id": temp_id, "id": id })),
                );
                SubmitStatus::Confirmed { id }
            }
            Err(RemoteWriteError::Transient(message)) => {
                self.flusher.append(QueuedWrite {
                    temp_id: temp_id.clone(),
                    payload: request,
                    retry_count: 0,
                    enqueued_at: now,
                })?;
                self.log_request_warning(
                    &request_id,
                    "entry.submit",
                    started,
                    &format!("queued after transient failure: {message}"),
                    Some(json!({ "temp_id": temp_id })),
                );
                SubmitStatus::Queued
            }
            Err(RemoteWriteError::Rejected(message)) => {
                self.send(SyncMessage::Discard {
                    temp_id: temp_id.clone(),
                    content: content.to_string(),
                    reason: DiscardReason::Rejected {
                        message: message.clone(),
                    },
                })?;
                self.log_request_warning(
                    &request_id,
                    "entry.submit",
                    started,
                    &format!("write rejected: {message}"),
                    Some(json!({ "temp_id": temp_id })),
                );
                SubmitStatus::Rejected { message }
            }
        };
        self.pump_messages();

        Ok(SubmitReceipt { temp_id, status })
    }
}
