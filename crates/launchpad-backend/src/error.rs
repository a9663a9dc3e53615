use thiserror::Error;

/// Errors returned by a generative backend call.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network, TLS or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The configured base URL could not be turned into an endpoint.
    #[error("invalid backend URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The response was not valid JSON or did not match the expected schema.
    #[error("malformed response for {context}: {reason}")]
    MalformedResponse { context: String, reason: String },
}

/// Coarse failure classes used when a caller degrades to a fallback value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    TransportFailure,
    MalformedResponse,
}

impl FailureKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::TransportFailure => "transport_failure",
            FailureKind::MalformedResponse => "malformed_response",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BackendError {
    /// Builds a [`BackendError::MalformedResponse`] for `context`.
    #[must_use]
    pub fn malformed(context: &str, reason: impl Into<String>) -> Self {
        BackendError::MalformedResponse {
            context: context.to_string(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            BackendError::Http(_)
            | BackendError::UnexpectedStatus { .. }
            | BackendError::InvalidBaseUrl { .. } => FailureKind::TransportFailure,
            BackendError::MalformedResponse { .. } => FailureKind::MalformedResponse,
        }
    }
}
