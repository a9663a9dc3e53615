use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// The request was rejected before any stage ran.
    #[error("validation error: {0}")]
    Validation(String),

    /// A stage task ended without producing a value.
    #[error("{stage} stage failed: {reason}")]
    StageFailed { stage: &'static str, reason: String },
}

impl PipelineError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        PipelineError::Validation(message.into())
    }
}
