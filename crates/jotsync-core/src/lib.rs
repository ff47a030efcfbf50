// Public fallible APIs in this crate share one concrete error contract (`JotError`).
// Repeating per-function `# Errors` boilerplate obscures behavior more than it clarifies.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod client;
pub mod config;
pub mod error;
pub mod flusher;
pub mod ingestor;
pub(crate) mod jsonl;
pub mod models;
pub mod queue;
pub mod reconciler;
pub mod remote;
pub mod store;
pub mod view;

pub use client::{JotSync, SubmitOptions};
pub use config::SyncConfig;
pub use error::{JotError, Result};
pub use reconciler::Reconciler;
