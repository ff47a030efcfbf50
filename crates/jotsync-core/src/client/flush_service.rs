use std::time::Instant;

use serde_json::json;
use uuid::Uuid;

use super::JotSync;
use crate::error::Result;
use crate::models::{FlushReport, FlushTrigger};

impl JotSync {
    /// Drains the retry queue in response to a trigger and merges the
    /// resulting confirmations and discards into the view.
    pub fn flush(&mut self, trigger: FlushTrigger) -> Result<FlushReport> {
        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();

        let result = self.flusher.flush(trigger, self.remote.as_ref(), &self.tx);
        self.pump_messages();

        match &result {
            Ok(report) => self.log_request_ok(
                &request_id,
                "queue.flush",
                started,
                Some(json!({
                    "trigger": trigger.as_str(),
                    "attempted": report.attempted,
                    "confirmed": report.confirmed,
                    "requeued": report.requeued,
                    "dropped": report.dropped,
                    "coalesced": report.coalesced,
                })),
            ),
            Err(err) => self.log_request_error(&request_id, "queue.flush", started, err),
        }
        result
    }
}
