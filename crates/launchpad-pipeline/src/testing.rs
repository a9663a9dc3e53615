//! Canned backends for unit tests.

use async_trait::async_trait;
use launchpad_backend::{BackendError, GenerativeBackend};

pub(crate) enum Canned {
    Text(String),
    Status(u16),
}

/// Answers every prompt with the same canned result.
pub(crate) struct CannedBackend(pub(crate) Canned);

impl CannedBackend {
    pub(crate) fn json(value: &serde_json::Value) -> Self {
        Self(Canned::Text(value.to_string()))
    }

    pub(crate) fn text(raw: &str) -> Self {
        Self(Canned::Text(raw.to_string()))
    }

    pub(crate) fn status(code: u16) -> Self {
        Self(Canned::Status(code))
    }
}

#[async_trait]
impl GenerativeBackend for CannedBackend {
    fn name(&self) -> &str {
        "canned"
    }

    async fn complete_json(&self, _prompt: &str) -> Result<String, BackendError> {
        match &self.0 {
            Canned::Text(text) => Ok(text.clone()),
            Canned::Status(status) => Err(BackendError::UnexpectedStatus {
                status: *status,
                body: "canned failure".to_string(),
            }),
        }
    }
}
