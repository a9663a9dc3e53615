//! Generative backend collaborator.
//!
//! The backend is optional: callers hold an `Option<Arc<dyn GenerativeBackend>>`
//! and fall back to deterministic content when it is `None` or when a call
//! fails. Every call sends one prompt and expects one JSON object back.

pub mod client;
pub mod error;
pub mod schema;

mod retry;

use async_trait::async_trait;

pub use client::OpenAiBackend;
pub use error::{BackendError, FailureKind};
pub use schema::{parse_field, parse_object};

/// A service that answers a prompt with a single JSON object.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Short name used in log records.
    fn name(&self) -> &str;

    /// Sends `prompt` and returns the raw text of the JSON object produced.
    ///
    /// The text is not validated here; use [`parse_field`] or
    /// [`parse_object`] at the call site.
    async fn complete_json(&self, prompt: &str) -> Result<String, BackendError>;
}
