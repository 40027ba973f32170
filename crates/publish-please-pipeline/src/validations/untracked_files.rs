use async_trait::async_trait;
use publish_please_core::{git, ValidationSetting};

use crate::error::Result;
use crate::prompt::Prompt;
use crate::validation::{confirm_setting, Validation, ValidationContext, ValidationFailure};

pub const KEY: &str = "untrackedFiles";

#[derive(Debug, Default, Clone, Copy)]
pub struct UntrackedFilesValidation;

#[async_trait]
impl Validation for UntrackedFilesValidation {
    fn key(&self) -> &'static str {
        KEY
    }

    fn status_text(&self) -> &'static str {
        "Checking for the untracked files"
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
            "Would you like to verify that there are no files that are not tracked by git in your working tree before publishing?",
            current,
            prompt,
        )
        .await
    }

    async fn run(&self, ctx: &ValidationContext<'_>) -> std::result::Result<(), ValidationFailure> {
        let status = git::working_tree_status(ctx.project_dir).await?;
        if status.has_untracked_files() {
            return Err("There are untracked files in the working tree.".into());
        }
        Ok(())
    }
}
