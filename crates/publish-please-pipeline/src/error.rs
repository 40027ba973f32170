//! Error type for the validation pipeline and release workflow.

use publish_please_core::PublishError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("duplicate validation key '{0}'")]
    DuplicateValidation(String),

    #[error("prompt failed: {0}")]
    Prompt(String),
}

impl PipelineError {
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Publish(e) => e.exit_code(),
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
