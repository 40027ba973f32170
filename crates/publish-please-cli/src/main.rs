//! publish-please - guarded `npm publish`
//!
//! ## Commands
//!
//! - (none): run the release workflow
//! - `guard`: `prepublishOnly` hook that blocks unguarded `npm publish`
//! - `config`: interactively edit `.publishrc`
//! - `init`: add the run script and guard hook to `package.json`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use publish_please_core::hooks::{self, HookChange};
use publish_please_core::{
    detect, init_tracing, run_guard, select_reporter, EnvSnapshot, InvocationContext, NpmInfo,
    PublishError, ReportEvent, Reporter,
};
use publish_please_pipeline::{
    configure, PipelineError, ReleaseWorkflow, TerminalPrompt, ValidationRegistry,
    WorkflowOutcome,
};
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "publish-please")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Safe and highly functional replacement for `npm publish`", long_about = None)]
struct Cli {
    /// Validate and show release info without publishing
    #[arg(long, global = true)]
    dry_run: bool,

    /// Plain output without colours
    #[arg(long, global = true)]
    ci: bool,

    /// Project directory (default: current directory)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Block `npm publish` unless it was started by publish-please
    Guard,

    /// Configure publish-please interactively
    Config,

    /// Register publish-please in package.json
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    init_tracing(cli.log_json, level);

    let env = EnvSnapshot::from_process();
    let ctx = detect(Some(&env));
    debug!(?ctx, "invocation context");
    let reporter = select_reporter(cli.ci, &ctx, &env);

    let project_dir = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };

    let code = match cli.command {
        Some(Commands::Guard) => run_guard(&ctx, reporter.as_ref()),
        Some(Commands::Init) => {
            report_errors(cmd_init(&project_dir, reporter.as_ref()), reporter.as_ref())
        }
        Some(Commands::Config) => {
            report_errors(cmd_config(&project_dir, reporter.as_ref()).await, reporter.as_ref())
        }
        None if ctx.config => {
            report_errors(cmd_config(&project_dir, reporter.as_ref()).await, reporter.as_ref())
        }
        None => {
            let dry_run = cli.dry_run || ctx.dry_run;
            report_errors(
                cmd_publish(&project_dir, &ctx, dry_run, reporter.as_ref()).await,
                reporter.as_ref(),
            )
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Print a failed command's error and turn it into an exit code.
fn report_errors(result: std::result::Result<(), PipelineError>, reporter: &dyn Reporter) -> i32 {
    match result {
        Ok(()) => 0,
        // already rendered as the ERRORS section
        Err(PipelineError::Publish(e @ PublishError::ValidationFailed(_))) => e.exit_code(),
        Err(e) => {
            reporter.report(&ReportEvent::FatalError(e.to_string()));
            e.exit_code()
        }
    }
}

async fn cmd_publish(
    project_dir: &Path,
    ctx: &InvocationContext,
    dry_run: bool,
    reporter: &dyn Reporter,
) -> std::result::Result<(), PipelineError> {
    debug!(npx = ctx.is_npx(), run_script = ctx.is_run_script(), "publish requested");
    let npm = NpmInfo::detect(project_dir).await;
    let registry = ValidationRegistry::standard(npm.clone());
    let prompt = TerminalPrompt;

    let outcome = ReleaseWorkflow::new(project_dir, &registry, &prompt, reporter)
        .with_npm(npm)
        .run(None, dry_run)
        .await?;

    if let WorkflowOutcome::Released { command } = &outcome {
        debug!(command = %command, "release finished");
    }
    Ok(())
}

async fn cmd_config(
    project_dir: &Path,
    reporter: &dyn Reporter,
) -> std::result::Result<(), PipelineError> {
    let npm = NpmInfo::detect(project_dir).await;
    let registry = ValidationRegistry::standard(npm);
    configure(project_dir, &registry, &TerminalPrompt).await?;
    reporter.report(&ReportEvent::Info(
        "Configuration file updated: .publishrc".to_string(),
    ));
    Ok(())
}

fn cmd_init(project_dir: &Path, reporter: &dyn Reporter) -> std::result::Result<(), PipelineError> {
    let registry = ValidationRegistry::standard(NpmInfo::default());
    let defaults = registry.resolve_config(project_dir, None)?;
    let summary = hooks::install(project_dir, &defaults)?;

    if summary.run_script_added {
        reporter.report(&ReportEvent::Info(format!(
            "Added \"{}\" script to package.json",
            hooks::RUN_SCRIPT_NAME
        )));
    }
    let hook_line = match &summary.prepublish {
        HookChange::Added => format!("Added \"{}\" hook to package.json", hooks::PREPUBLISH_HOOK),
        HookChange::Chained { previous } => format!(
            "Chained existing \"{}\" hook after the guard: {previous}",
            hooks::PREPUBLISH_HOOK
        ),
        HookChange::AlreadyGuarded => {
            format!("\"{}\" hook is already guarded", hooks::PREPUBLISH_HOOK)
        }
    };
    reporter.report(&ReportEvent::Info(hook_line));
    if summary.config_written {
        reporter.report(&ReportEvent::Info(
            "Created default .publishrc".to_string(),
        ));
    }
    Ok(())
}
