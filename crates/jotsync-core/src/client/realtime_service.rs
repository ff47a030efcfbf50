use std::time::Instant;

use serde_json::json;
use uuid::Uuid;

use super::JotSync;
use crate::error::{JotError, Result};
use crate::ingestor::{RealtimeChannel, RealtimeIngestor};

impl JotSync {
    /// Attaches the single server-push subscription. A second subscription
    /// is refused; detach-and-reattach is not supported within one client.
    pub fn attach_realtime(&mut self, channel: Box<dyn RealtimeChannel>) -> Result<()> {
        if self.ingestor.is_some() {
            return Err(JotError::Conflict(
                "a realtime subscription is already attached".to_string(),
            ));
        }
        self.ingestor = Some(RealtimeIngestor::new(channel));
        Ok(())
    }

    /// Drains currently available server-pushed notifications into the view
    /// and returns how many were applied. A client without a subscription
    /// applies none.
    pub fn poll_realtime(&mut self) -> Result<usize> {
        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();

        let Some(ingestor) = self.ingestor.as_mut() else {
            return Ok(0);
        };
        let result = ingestor.poll(&self.tx);
        self.pump_messages();

        match &result {
            Ok(applied) => {
                if *applied > 0 {
                    self.log_request_ok(
                        &request_id,
                        "realtime.poll",
                        started,
                        Some(json!({ "applied": applied })),
                    );
                }
            }
            Err(err) => self.log_request_error(&request_id, "realtime.poll", started, err),
        }
        result
    }
}
