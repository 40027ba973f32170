use async_trait::async_trait;
use publish_please_core::{git, ValidationSetting};

use crate::error::Result;
use crate::prompt::Prompt;
use crate::validation::{Validation, ValidationContext, ValidationFailure};

pub const KEY: &str = "gitTag";
pub const DEFAULT_PREFIX: &str = "v";

/// HEAD must carry a tag for the manifest version.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitTagValidation;

fn prefix(setting: &ValidationSetting) -> &str {
    setting.as_text().unwrap_or(DEFAULT_PREFIX)
}

pub fn check_tags(tags: &[String], version: &str, prefix: &str) -> std::result::Result<(), String> {
    if tags.is_empty() {
        return Err("Latest commit doesn't have git tag.".to_string());
    }
    let prefixed = format!("{prefix}{version}");
    if tags.iter().any(|t| t == version || *t == prefixed) {
        return Ok(());
    }
    Err(format!(
        "Expected git tag to be '{version}' or '{prefixed}', but it was '{}'.",
        tags.join(", ")
    ))
}

#[async_trait]
impl Validation for GitTagValidation {
    fn key(&self) -> &'static str {
        KEY
    }

    fn status_text(&self) -> &'static str {
        "Validating git tag"
    }

    fn default_setting(&self) -> ValidationSetting {
        ValidationSetting::enabled()
    }

    async fn configure(
        &self,
        current: &ValidationSetting,
        prompt: &dyn Prompt,
    ) -> Result<ValidationSetting> {
        let enabled = prompt
            .confirm(
                "Would you like to verify that published commit has git tag that is equal to package version?",
                !current.is_disabled(),
            )
            .await?;
        if !enabled {
            return Ok(ValidationSetting::disabled());
        }
        let prefix = prompt
            .input("Which prefix should the git tag have?", prefix(current))
            .await?;
        Ok(if prefix == DEFAULT_PREFIX {
            ValidationSetting::enabled()
        } else {
            ValidationSetting::Text(prefix)
        })
    }

    async fn run(&self, ctx: &ValidationContext<'_>) -> std::result::Result<(), ValidationFailure> {
        let tags = git::head_tags(ctx.project_dir).await?;
        check_tags(&tags, ctx.manifest.version(), prefix(ctx.setting))
            .map_err(ValidationFailure::Single)
    }
}
