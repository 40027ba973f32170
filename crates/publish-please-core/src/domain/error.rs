//! Error taxonomy for publish-please.
//!
//! Only fatal conditions live here. Validation findings are not errors of
//! this type until the workflow decides to abort on them, at which point they
//! travel as [`PublishError::ValidationFailed`] carrying the full report.

use crate::report::ErrorBlock;

/// Fatal errors produced by configuration loading, collaborators and the
/// release workflow.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("package.json file doesn't exist.")]
    ManifestMissing,

    #[error("package.json is not a valid JSON file: {0}")]
    InvalidManifest(String),

    #[error(".publishrc is not a valid JSON file.")]
    InvalidConfig,

    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("Command `{program}` exited with code {code}.")]
    ScriptFailed { program: String, code: i32 },

    #[error("failed to spawn `{program}`: {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("git error: {0}")]
    Git(String),

    #[error("npm error: {0}")]
    Npm(String),

    #[error("{}", render_validation_failure(.0))]
    ValidationFailed(Vec<ErrorBlock>),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PublishError {
    /// Exit code reported to the host process.
    ///
    /// Every failure maps to `1`; the host package manager only distinguishes
    /// zero from non-zero.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Flatten validation blocks into `  * message` lines, in block order.
fn render_validation_failure(blocks: &[ErrorBlock]) -> String {
    blocks
        .iter()
        .flat_map(|block| block.lines.iter())
        .map(|line| format!("  * {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type for publish-please operations.
pub type Result<T> = std::result::Result<T, PublishError>;
