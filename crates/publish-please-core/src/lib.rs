//! publish-please core library
//!
//! Invocation context detection, configuration, the `prepublishOnly` guard
//! gate and the git/npm collaborators used by the validation pipeline.

pub mod domain;
pub mod git;
pub mod guard;
pub mod hooks;
pub mod npm;
pub mod process;
pub mod report;
pub mod telemetry;

pub use domain::{
    detect, EnvSnapshot, Flag, InvocationContext, Manifest, PublishError, ResolvedConfig, Result,
    Subcommand, ValidationOptions, ValidationSetting, CONFIG_FILE, MANIFEST_FILE,
};

pub use guard::{evaluate as evaluate_guard, run_guard, GuardDecision};

pub use npm::NpmInfo;

pub use report::{
    select_reporter, CiReporter, ElegantReporter, ErrorBlock, MemoryReporter, ReleaseInfo,
    ReportEvent, Reporter, StatusMark,
};

pub use telemetry::init_tracing;
