//! The validation seam.
//!
//! Each pre-release check implements [`Validation`]. The orchestrator only
//! sees this trait, so checks can be swapped for fakes in tests.

use std::path::Path;

use async_trait::async_trait;
use publish_please_core::{Manifest, PublishError, ValidationSetting};

use crate::error::Result;
use crate::prompt::Prompt;

/// Why a validation failed: one message or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    Single(String),
    List(Vec<String>),
}

impl ValidationFailure {
    pub fn into_lines(self) -> Vec<String> {
        match self {
            ValidationFailure::Single(line) => vec![line],
            ValidationFailure::List(lines) => lines,
        }
    }
}

impl From<String> for ValidationFailure {
    fn from(line: String) -> Self {
        ValidationFailure::Single(line)
    }
}

impl From<&str> for ValidationFailure {
    fn from(line: &str) -> Self {
        ValidationFailure::Single(line.to_string())
    }
}

impl From<PublishError> for ValidationFailure {
    fn from(err: PublishError) -> Self {
        ValidationFailure::Single(err.to_string())
    }
}

/// What a validation gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub project_dir: &'a Path,
    /// Resolved setting; never `false` here.
    pub setting: &'a ValidationSetting,
    pub manifest: &'a Manifest,
}

#[async_trait]
pub trait Validation: Send + Sync {
    /// Stable option key used in `.publishrc`.
    fn key(&self) -> &'static str;

    /// Status line shown while the validation runs.
    fn status_text(&self) -> &'static str;

    fn default_setting(&self) -> ValidationSetting;

    fn can_run(&self) -> bool {
        true
    }

    fn why_cannot_run(&self) -> String {
        String::new()
    }

    /// Ask the operator for a new setting.
    async fn configure(
        &self,
        current: &ValidationSetting,
        prompt: &dyn Prompt,
    ) -> Result<ValidationSetting>;

    async fn run(&self, ctx: &ValidationContext<'_>) -> std::result::Result<(), ValidationFailure>;
}

/// Yes/no configurator shared by the boolean validations.
pub(crate) async fn confirm_setting(
    question: &str,
    current: &ValidationSetting,
    prompt: &dyn Prompt,
) -> Result<ValidationSetting> {
    let enabled = prompt.confirm(question, !current.is_disabled()).await?;
    Ok(ValidationSetting::Flag(enabled))
}
