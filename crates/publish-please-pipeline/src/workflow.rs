//! The guarded release workflow.
//!
//! resolve config -> check manifest -> pre-publish script -> validations ->
//! (dry run: release info, stop) -> confirmation -> release command ->
//! post-publish script

use std::path::{Path, PathBuf};

use publish_please_core::npm::pack;
use publish_please_core::process::{run_script, run_shell, OutputMode};
use publish_please_core::{
    Manifest, NpmInfo, PublishError, ReleaseInfo, ReportEvent, Reporter, ResolvedConfig,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::Result;
use crate::pipeline::{PipelineResult, ValidationPipeline};
use crate::prompt::Prompt;
use crate::registry::ValidationRegistry;

/// Marker the guard looks for on the real release command.
pub const TRUSTED_FLAG: &str = "--with-publish-please";

/// Everything needed to perform one release, built once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePlan {
    /// Full release command line, trusted flag included.
    pub command: String,
    /// Run before validations; `None` when not configured.
    pub pre_publish_script: Option<String>,
    /// Run after a successful release.
    pub post_publish_script: Option<String>,
    /// Dist-tag passed to `--tag`.
    pub tag: String,
    pub dry_run: bool,
    /// Ask the operator before releasing.
    pub confirm: bool,
    pub package_name: String,
    pub version: String,
    /// Tarball name, `<name>-<version>.tgz`.
    pub artifact: String,
}

impl ReleasePlan {
    pub fn new(config: &ResolvedConfig, manifest: &Manifest, dry_run: bool) -> Self {
        Self {
            command: release_command(&config.publish_command, &config.publish_tag),
            pre_publish_script: config.pre_publish_script.clone(),
            post_publish_script: config.post_publish_script.clone(),
            tag: config.publish_tag.clone(),
            dry_run,
            confirm: config.confirm,
            package_name: manifest.name().to_string(),
            version: manifest.version().to_string(),
            artifact: manifest.artifact_name(),
        }
    }
}

/// `<publishCommand> --tag <tag> --with-publish-please`
pub fn release_command(publish_command: &str, tag: &str) -> String {
    format!("{publish_command} --tag {tag} {TRUSTED_FLAG}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Released { command: String },
    DryRun { plan: ReleasePlan },
    Declined,
}

impl WorkflowOutcome {
    /// The executed command, or an empty string when nothing was released.
    pub fn command_line(&self) -> &str {
        match self {
            WorkflowOutcome::Released { command } => command,
            WorkflowOutcome::DryRun { .. } | WorkflowOutcome::Declined => "",
        }
    }
}

pub struct ReleaseWorkflow<'a> {
    project_dir: PathBuf,
    registry: &'a ValidationRegistry,
    prompt: &'a dyn Prompt,
    reporter: &'a dyn Reporter,
    npm: NpmInfo,
}

impl<'a> ReleaseWorkflow<'a> {
    pub fn new(
        project_dir: impl Into<PathBuf>,
        registry: &'a ValidationRegistry,
        prompt: &'a dyn Prompt,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            project_dir: project_dir.into(),
            registry,
            prompt,
            reporter,
            npm: NpmInfo::default(),
        }
    }

    /// npm capabilities used for the dry-run file listing.
    pub fn with_npm(mut self, npm: NpmInfo) -> Self {
        self.npm = npm;
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub async fn run(&self, overrides: Option<&Value>, dry_run: bool) -> Result<WorkflowOutcome> {
        let dir = self.project_dir.as_path();

        let config = self.registry.resolve_config(dir, overrides)?;
        let manifest = Manifest::load(dir)?;
        let plan = ReleasePlan::new(&config, &manifest, dry_run);
        info!(
            package = %plan.package_name,
            version = %plan.version,
            dry_run,
            "starting release workflow"
        );

        if dry_run {
            self.reporter.report(&ReportEvent::DryRunStarted);
        }

        if let Some(script) = &plan.pre_publish_script {
            self.reporter
                .report(&ReportEvent::Step("Running pre-publish script".to_string()));
            run_script(script, dir).await?;
        }

        self.reporter
            .report(&ReportEvent::Step("Running validations".to_string()));
        let run = ValidationPipeline::new(self.registry)
            .run(&config, dir, &manifest, self.reporter)
            .await;
        if let PipelineResult::Errors(blocks) = run.result {
            self.reporter.report(&ReportEvent::Errors(blocks.clone()));
            return Err(PublishError::ValidationFailed(blocks).into());
        }

        if dry_run {
            self.reporter
                .report(&ReportEvent::ReleaseInfo(self.release_info(&plan).await));
            self.reporter
                .report(&ReportEvent::SafeToPublish(plan.package_name.clone()));
            return Ok(WorkflowOutcome::DryRun { plan });
        }

        if plan.confirm {
            let question = format!(
                "Are you sure you want to publish {}@{} with `{}`?",
                plan.package_name, plan.version, plan.command
            );
            if !self.prompt.confirm(&question, false).await? {
                info!("release declined by operator");
                self.reporter.report(&ReportEvent::Declined);
                return Ok(WorkflowOutcome::Declined);
            }
        }

        self.reporter.report(&ReportEvent::Step("Publishing".to_string()));
        run_shell(&plan.command, dir, OutputMode::Inherit)
            .await?
            .into_result()?;
        self.reporter
            .report(&ReportEvent::Released(plan.command.clone()));

        if let Some(script) = &plan.post_publish_script {
            self.reporter
                .report(&ReportEvent::Step("Running post-publish script".to_string()));
            if let Err(e) = run_script(script, dir).await {
                warn!(error = %e, "post-publish script failed after release");
                return Err(e.into());
            }
        }

        Ok(WorkflowOutcome::Released {
            command: plan.command,
        })
    }

    async fn release_info(&self, plan: &ReleasePlan) -> ReleaseInfo {
        let files = if self.npm.pack_has_json_reporter() {
            pack::packed_files(&self.project_dir)
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "could not list package files");
                    Vec::new()
                })
        } else {
            Vec::new()
        };
        ReleaseInfo {
            package_name: plan.package_name.clone(),
            version: plan.version.clone(),
            command: plan.command.clone(),
            tag: plan.tag.clone(),
            artifact: plan.artifact.clone(),
            files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_command() {
        assert_eq!(
            release_command("echo npm publish", "alpha"),
            "echo npm publish --tag alpha --with-publish-please"
        );
    }

    #[test]
    fn test_command_line_empty_unless_released() {
        assert_eq!(WorkflowOutcome::Declined.command_line(), "");
        let released = WorkflowOutcome::Released {
            command: "npm publish --tag latest --with-publish-please".to_string(),
        };
        assert_eq!(
            released.command_line(),
            "npm publish --tag latest --with-publish-please"
        );
    }
}
