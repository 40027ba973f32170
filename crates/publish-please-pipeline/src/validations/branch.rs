use async_trait::async_trait;
use publish_please_core::{git, ValidationSetting};
use regex::Regex;

use crate::error::Result;
use crate::prompt::Prompt;
use crate::validation::{Validation, ValidationContext, ValidationFailure};

pub const KEY: &str = "branch";
pub const DEFAULT_BRANCH: &str = "master";

/// Release branch check. A setting wrapped in slashes is a regex.
#[derive(Debug, Default, Clone, Copy)]
pub struct BranchValidation;

/// Compare `current` against the expected name or `/pattern/`.
pub fn check_branch(expected: &str, current: &str) -> std::result::Result<(), String> {
    if let Some(pattern) = as_pattern(expected) {
        let re = Regex::new(pattern)
            .map_err(|e| format!("Invalid branch pattern {expected}: {e}"))?;
        if re.is_match(current) {
            return Ok(());
        }
        return Err(format!(
            "Expected branch to match {expected}, but it was '{current}'."
        ));
    }
    if expected == current {
        Ok(())
    } else {
        Err(format!(
            "Expected branch to be '{expected}', but it was '{current}'."
        ))
    }
}

fn as_pattern(expected: &str) -> Option<&str> {
    expected
        .strip_prefix('/')
        .and_then(|rest| rest.strip_suffix('/'))
        .filter(|inner| !inner.is_empty())
}

fn expected_branch(setting: &ValidationSetting) -> &str {
    setting.as_text().unwrap_or(DEFAULT_BRANCH)
}

#[async_trait]
impl Validation for BranchValidation {
    fn key(&self) -> &'static str {
        KEY
    }

    fn status_text(&self) -> &'static str {
        "Validating branch"
    }

    fn default_setting(&self) -> ValidationSetting {
        ValidationSetting::from(DEFAULT_BRANCH)
    }

    async fn configure(
        &self,
        current: &ValidationSetting,
        prompt: &dyn Prompt,
    ) -> Result<ValidationSetting> {
        let enabled = prompt
            .confirm(
                "Would you like to verify that you are publishing from the correct git branch?",
                !current.is_disabled(),
            )
            .await?;
        if !enabled {
            return Ok(ValidationSetting::disabled());
        }
        let branch = prompt
            .input(
                "Which branch should be used for publishing? (use /regex/ for a pattern)",
                expected_branch(current),
            )
            .await?;
        Ok(ValidationSetting::Text(branch))
    }

    async fn run(&self, ctx: &ValidationContext<'_>) -> std::result::Result<(), ValidationFailure> {
        let current = git::current_branch(ctx.project_dir).await?;
        check_branch(expected_branch(ctx.setting), &current).map_err(ValidationFailure::Single)
    }
}
