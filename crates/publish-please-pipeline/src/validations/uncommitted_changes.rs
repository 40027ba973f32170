use async_trait::async_trait;
use publish_please_core::{git, ValidationSetting};

use crate::error::Result;
use crate::prompt::Prompt;
use crate::validation::{confirm_setting, Validation, ValidationContext, ValidationFailure};

pub const KEY: &str = "uncommittedChanges";

#[derive(Debug, Default, Clone, Copy)]
pub struct UncommittedChangesValidation;

#[async_trait]
impl Validation for UncommittedChangesValidation {
    fn key(&self) -> &'static str {
        KEY
    }

    fn status_text(&self) -> &'static str {
        "Checking for the uncommitted changes"
    }

    fn default_setting(&self) -> ValidationSetting {
        ValidationSetting::enabled()
    }

    async fn configure(
        &self,
        current: &ValidationSetting,
        prompt: &dyn Prompt,
    ) -> Result<ValidationSetting> {
        confirm_setting(
            "Would you like to verify that there are no uncommitted changes in your working tree before publishing?",
            current,
            prompt,
        )
        .await
    }

    async fn run(&self, ctx: &ValidationContext<'_>) -> std::result::Result<(), ValidationFailure> {
        let status = git::working_tree_status(ctx.project_dir).await?;
        if status.has_uncommitted_changes() {
            return Err("There are uncommitted changes in the working tree.".into());
        }
        Ok(())
    }
}
