//! `publish-please config`: interactive `.publishrc` editor.

use std::path::Path;

use publish_please_core::ResolvedConfig;
use tracing::info;

use crate::error::Result;
use crate::prompt::Prompt;
use crate::registry::ValidationRegistry;

/// Ask every question, starting from the current configuration, and write
/// the answers to `.publishrc`.
pub async fn configure(
    project_dir: &Path,
    registry: &ValidationRegistry,
    prompt: &dyn Prompt,
) -> Result<ResolvedConfig> {
    let mut config = registry.resolve_config(project_dir, None)?;

    let pre = prompt
        .input(
            "Specify command that you would like to run before publishing (leave empty for none)",
            config.pre_publish_script.as_deref().unwrap_or_default(),
        )
        .await?;
    config.pre_publish_script = non_empty(pre);

    let post = prompt
        .input(
            "Specify command that you would like to run after publishing (leave empty for none)",
            config.post_publish_script.as_deref().unwrap_or_default(),
        )
        .await?;
    config.post_publish_script = non_empty(post);

    config.publish_command = prompt
        .input(
            "Specify publishing command which will be used to publish your package",
            &config.publish_command,
        )
        .await?;

    config.publish_tag = prompt
        .input(
            "Specify release tag with which your package will be published",
            &config.publish_tag,
        )
        .await?;

    config.confirm = prompt
        .confirm(
            "Would you like to be asked for confirmation before publishing?",
            config.confirm,
        )
        .await?;

    for validation in registry.iter() {
        let default_setting = validation.default_setting();
        let current = config
            .validation(validation.key())
            .cloned()
            .unwrap_or(default_setting);
        let updated = validation.configure(&current, prompt).await?;
        config.set_validation(validation.key(), updated);
    }

    config.save(project_dir)?;
    info!(dir = %project_dir.display(), "saved publish configuration");
    Ok(config)
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
