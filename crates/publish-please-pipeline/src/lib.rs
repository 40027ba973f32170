//! publish-please pipeline
//!
//! Pre-release validations, their orchestration and the guarded release
//! workflow built on top of `publish-please-core`.

pub mod configurator;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod registry;
pub mod validation;
pub mod validations;
pub mod workflow;

pub use configurator::configure;
pub use error::{PipelineError, Result};
pub use pipeline::{
    reduce, PipelineResult, PipelineRun, ValidationOutcome, ValidationPipeline, ValidationReport,
};
pub use prompt::{Prompt, ScriptedPrompt, TerminalPrompt};
pub use registry::ValidationRegistry;
pub use validation::{Validation, ValidationContext, ValidationFailure};
pub use workflow::{release_command, ReleasePlan, ReleaseWorkflow, WorkflowOutcome};
