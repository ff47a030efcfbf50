use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use thiserror::Error;

use crate::config::SyncConfig;
use crate::error::{JotError, Result};
use crate::models::{Entry, WriteRequest};

/// Failure taxonomy for the remote write operation. Transient failures are
/// queued for retry; rejections are surfaced and never queued, since
/// resubmitting a malformed write cannot succeed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteWriteError {
    #[error("transient write failure: {0}")]
    Transient(String),

    #[error("write rejected: {0}")]
    Rejected(String),
}

/// The remote write operation consumed by the submitter and the flusher.
pub trait EntryWriter: Send + Sync {
    fn create_entry(&self, request: &WriteRequest)
    -> std::result::Result<Entry, RemoteWriteError>;
}

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl RemoteConfig {
    #[must_use]
    pub fn from_sync_config(config: &SyncConfig) -> Option<Self> {
        let base_url = config.endpoint.clone()?;
        Some(Self {
            base_url: normalize_base_url(&base_url),
            api_key: config.api_key.clone(),
            timeout_ms: config.timeout_ms,
        })
    }
}

/// Production `EntryWriter` over the backend's HTTP API.
#[derive(Clone)]
pub struct HttpEntryWriter {
    config: RemoteConfig,
    http: Client,
}

impl std::fmt::Debug for HttpEntryWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEntryWriter")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpEntryWriter {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| JotError::Validation(format!("invalid JOTSYNC_API_KEY: {e}")))?;
            headers.insert("api-key", value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }
}

impl EntryWriter for HttpEntryWriter {
    fn create_entry(
        &self,
        request: &WriteRequest,
    ) -> std::result::Result<Entry, RemoteWriteError> {
        let url = format!("{}/entries", self.config.base_url);
        let resp = self
            .http
            .post(url)
            .json(request)
            .send()
            .map_err(|e| RemoteWriteError::Transient(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<Entry>()
                .map_err(|e| RemoteWriteError::Transient(format!("invalid response body: {e}")));
        }

        let body = resp.text().unwrap_or_default();
        let summary = if body.trim().is_empty() {
            format!("status {status}")
        } else {
            format!("status {status}: {}", body.trim())
        };
        if status.is_client_error() {
            Err(RemoteWriteError::Rejected(summary))
        } else {
            Err(RemoteWriteError::Transient(summary))
        }
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
