//! Validation pipeline orchestration.
//!
//! Every enabled validation runs, in registration order, even after an
//! earlier one failed. Outcomes are then reduced to a single
//! [`PipelineResult`].

use std::path::Path;
use std::time::Instant;

use publish_please_core::{
    ErrorBlock, Manifest, ReportEvent, Reporter, ResolvedConfig, StatusMark,
};
use tracing::{debug, info};

use crate::registry::ValidationRegistry;
use crate::validation::ValidationContext;

/// What happened to one validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Disabled in configuration; carries the reason.
    Skipped(String),
    /// Enabled but not runnable here; carries the explanation shown to the user.
    Unsupported(String),
    Passed,
    /// Ran and failed; carries the error lines.
    Failed(Vec<String>),
}

impl ValidationOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ValidationOutcome::Passed | ValidationOutcome::Skipped(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Configuration key, e.g. `branch`.
    pub key: String,
    /// Status line shown while running, also the error block title.
    pub status_text: String,
    pub outcome: ValidationOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineResult {
    /// Every enabled validation passed.
    Ok,
    /// One block per failing or unsupported validation.
    Errors(Vec<ErrorBlock>),
}

impl PipelineResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, PipelineResult::Ok)
    }
}

/// Full record of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// One report per registered validation, in registration order.
    pub reports: Vec<ValidationReport>,
    /// Reduced result over `reports`.
    pub result: PipelineResult,
    /// Wall-clock time of the whole run.
    pub duration_ms: u64,
}

impl PipelineRun {
    pub fn passed_count(&self) -> usize {
        self.count(|o| matches!(o, ValidationOutcome::Passed))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| !o.is_ok())
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, ValidationOutcome::Skipped(_)))
    }

    fn count(&self, pred: impl Fn(&ValidationOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Reduce outcomes, in order, to a pipeline result.
///
/// `Failed` contributes its lines, `Unsupported` its single reason; each
/// failing validation becomes one block titled with its status text.
pub fn reduce(reports: &[ValidationReport]) -> PipelineResult {
    let blocks: Vec<ErrorBlock> = reports
        .iter()
        .filter_map(|r| match &r.outcome {
            ValidationOutcome::Failed(lines) => {
                Some(ErrorBlock::new(r.status_text.clone(), lines.clone()))
            }
            ValidationOutcome::Unsupported(reason) => {
                Some(ErrorBlock::new(r.status_text.clone(), vec![reason.clone()]))
            }
            _ => None,
        })
        .collect();

    if blocks.is_empty() {
        PipelineResult::Ok
    } else {
        PipelineResult::Errors(blocks)
    }
}

pub struct ValidationPipeline<'a> {
    registry: &'a ValidationRegistry,
}

impl<'a> ValidationPipeline<'a> {
    pub fn new(registry: &'a ValidationRegistry) -> Self {
        Self { registry }
    }

    /// Run every enabled and capable validation once, serially.
    pub async fn run(
        &self,
        config: &ResolvedConfig,
        project_dir: &Path,
        manifest: &Manifest,
        reporter: &dyn Reporter,
    ) -> PipelineRun {
        let start = Instant::now();
        let mut reports = Vec::with_capacity(self.registry.len());

        for validation in self.registry.iter() {
            let key = validation.key();
            let status_text = validation.status_text();
            let default_setting = validation.default_setting();
            let setting = config.validation(key).unwrap_or(&default_setting);

            let outcome = if setting.is_disabled() {
                debug!(validation = key, "skipping disabled validation");
                ValidationOutcome::Skipped("disabled in configuration".to_string())
            } else {
                reporter.report(&ReportEvent::ValidationStarted(status_text.to_string()));
                let outcome = if !validation.can_run() {
                    ValidationOutcome::Unsupported(validation.why_cannot_run())
                } else {
                    info!(validation = key, "running validation");
                    let ctx = ValidationContext {
                        project_dir,
                        setting,
                        manifest,
                    };
                    match validation.run(&ctx).await {
                        Ok(()) => ValidationOutcome::Passed,
                        Err(failure) => ValidationOutcome::Failed(failure.into_lines()),
                    }
                };
                reporter.report(&ReportEvent::ValidationFinished {
                    status_text: status_text.to_string(),
                    mark: mark_for(&outcome),
                });
                outcome
            };

            reports.push(ValidationReport {
                key: key.to_string(),
                status_text: status_text.to_string(),
                outcome,
            });
        }

        let result = reduce(&reports);
        let run = PipelineRun {
            reports,
            result,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            passed = run.passed_count(),
            failed = run.failed_count(),
            skipped = run.skipped_count(),
            "validations finished"
        );
        run
    }
}

fn mark_for(outcome: &ValidationOutcome) -> StatusMark {
    match outcome {
        ValidationOutcome::Unsupported(_) => StatusMark::Unsupported,
        ValidationOutcome::Failed(_) => StatusMark::Failed,
        _ => StatusMark::Passed,
    }
}
