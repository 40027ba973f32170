use async_trait::async_trait;
use publish_please_core::npm::audit;
use publish_please_core::{NpmInfo, ValidationSetting};

use crate::error::Result;
use crate::prompt::Prompt;
use crate::validation::{confirm_setting, Validation, ValidationContext, ValidationFailure};

pub const KEY: &str = "vulnerableDependencies";

/// Fails on any vulnerability `npm audit` reports after `.auditignore`
/// and `audit.opts` are applied.
#[derive(Debug, Clone, Default)]
pub struct VulnerableDependenciesValidation {
    npm: NpmInfo,
}

impl VulnerableDependenciesValidation {
    pub fn new(npm: NpmInfo) -> Self {
        Self { npm }
    }
}

#[async_trait]
impl Validation for VulnerableDependenciesValidation {
    fn key(&self) -> &'static str {
        KEY
    }

    fn status_text(&self) -> &'static str {
        "Checking for the vulnerable dependencies"
    }

    fn default_setting(&self) -> ValidationSetting {
        ValidationSetting::enabled()
    }

    fn can_run(&self) -> bool {
        self.npm.audit_has_json_reporter()
    }

    fn why_cannot_run(&self) -> String {
        format!(
            "Cannot check vulnerable dependencies because npm version is {}. Either upgrade npm to version 6.1.0 or above, or disable this validation in the configuration file",
            self.npm
        )
    }

    async fn configure(
        &self,
        current: &ValidationSetting,
        prompt: &dyn Prompt,
    ) -> Result<ValidationSetting> {
        confirm_setting(
            "Would you like to verify that your package doesn't have vulnerable dependencies before publishing?",
            current,
            prompt,
        )
        .await
    }

    async fn run(&self, ctx: &ValidationContext<'_>) -> std::result::Result<(), ValidationFailure> {
        let report = audit::run_audit(ctx.project_dir).await?;
        match report.error_lines() {
            None => Ok(()),
            Some(lines) => Err(ValidationFailure::List(lines)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_follows_npm_version() {
        let old = VulnerableDependenciesValidation::new(NpmInfo::parse("6.0.0"));
        assert!(!old.can_run());
        assert_eq!(
            old.why_cannot_run(),
            "Cannot check vulnerable dependencies because npm version is 6.0.0. Either upgrade npm to version 6.1.0 or above, or disable this validation in the configuration file"
        );
        assert!(VulnerableDependenciesValidation::new(NpmInfo::parse("6.1.0")).can_run());
    }

    #[test]
    fn test_missing_npm_reports_unknown() {
        let v = VulnerableDependenciesValidation::default();
        assert!(!v.can_run());
        assert!(v.why_cannot_run().contains("npm version is unknown."));
    }
}
