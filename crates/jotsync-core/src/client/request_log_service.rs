use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::JotSync;
use crate::error::{JotError, Result};
use crate::jsonl::{append_jsonl_line, parse_jsonl_tolerant};
use crate::models::{RequestLogEntry, SyncNotice};

/// Append-only JSONL request log under `<root>/logs/requests.jsonl`.
/// Logging never fails an operation; write errors are swallowed.
impl JotSync {
    /// Reads the request log back, skipping undecodable lines so a torn
    /// write cannot make the whole log unreadable.
    pub fn read_request_log(&self) -> Result<Vec<RequestLogEntry>> {
        let path = self.request_log_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&path)?;
        let parsed = parse_jsonl_tolerant::<RequestLogEntry>(&raw);
        if parsed.skipped_lines > 0 {
            self.log_warning_simple(
                "request_log.read",
                &format!("skipped {} undecodable log lines", parsed.skipped_lines),
            );
        }
        Ok(parsed.items)
    }

    pub(super) fn log_request_ok(
        &self,
        request_id: &str,
        operation: &str,
        started: Instant,
        details: Option<Value>,
    ) {
        self.write_log_record(RequestLogEntry {
            request_id: request_id.to_string(),
            operation: operation.to_string(),
            status: "ok".to_string(),
            latency_ms: started.elapsed().as_millis(),
            created_at: Utc::now().to_rfc3339(),
            error_code: None,
            error_message: None,
            details,
        });
    }

    pub(super) fn log_request_warning(
        &self,
        request_id: &str,
        operation: &str,
        started: Instant,
        message: &str,
        details: Option<Value>,
    ) {
        self.write_log_record(RequestLogEntry {
            request_id: request_id.to_string(),
            operation: operation.to_string(),
            status: "warning".to_string(),
            latency_ms: started.elapsed().as_millis(),
            created_at: Utc::now().to_rfc3339(),
            error_code: None,
            error_message: Some(message.to_string()),
            details,
        });
    }

    pub(super) fn log_request_error(
        &self,
        request_id: &str,
        operation: &str,
        started: Instant,
        error: &JotError,
    ) {
        self.write_log_record(RequestLogEntry {
            request_id: request_id.to_string(),
            operation: operation.to_string(),
            status: "error".to_string(),
            latency_ms: started.elapsed().as_millis(),
            created_at: Utc::now().to_rfc3339(),
            error_code: Some(error.code().to_string()),
            error_message: Some(error.to_string()),
            details: None,
        });
    }

    pub(super) fn log_notice_warning(&self, notice: &SyncNotice) {
        let (operation, message) = match notice {
            SyncNotice::WriteRejected {
                temp_id, message, ..
            } => (
                "entry.submit",
                format!("write {temp_id} rejected: {message}"),
            ),
            SyncNotice::WriteDropped {
                temp_id, attempts, ..
            } => (
                "queue.flush",
                format!("write {temp_id} dropped after {attempts} attempts"),
            ),
            SyncNotice::ConflictSuspected { id, .. } => (
                "realtime.apply",
                format!("conflicting update for {id} at equal timestamp"),
            ),
        };
        self.log_warning_simple(operation, &message);
    }

    /// Warning record for events outside a timed request, such as discarding
    /// stale queue data on open.
    pub(super) fn log_warning_simple(&self, operation: &str, message: &str) {
        self.write_log_record(RequestLogEntry {
            request_id: Uuid::new_v4().to_string(),
            operation: operation.to_string(),
            status: "warning".to_string(),
            latency_ms: 0,
            created_at: Utc::now().to_rfc3339(),
            error_code: None,
            error_message: Some(message.to_string()),
            details: None,
        });
    }

    fn write_log_record(&self, record: RequestLogEntry) {
        if !self.config.request_log {
            return;
        }
        let _ = append_jsonl_line(&self.request_log_path(), &record);
    }

    pub(crate) fn request_log_path(&self) -> PathBuf {
        self.root.join("logs").join("requests.jsonl")
    }
}
