//! `prepublishOnly` gate.
//!
//! A plain `npm publish` is blocked; only the release command issued by the
//! guarded workflow carries the trusted marker and is allowed through.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::context::{Flag, InvocationContext};
use crate::report::{ReportEvent, Reporter};

/// Exit code when the gate allows the release.
pub const EXIT_ALLOWED: i32 = 0;
/// Exit code when the gate blocks the release.
pub const EXIT_BLOCKED: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardDecision {
    Blocked,
    Allowed,
}

impl GuardDecision {
    pub fn exit_code(self) -> i32 {
        match self {
            GuardDecision::Allowed => EXIT_ALLOWED,
            GuardDecision::Blocked => EXIT_BLOCKED,
        }
    }

    pub fn is_allowed(self) -> bool {
        self == GuardDecision::Allowed
    }
}

/// Decide from the context alone: allowed iff the trusted marker is set.
pub fn evaluate(ctx: &InvocationContext) -> GuardDecision {
    if ctx.flag(Flag::WithPublishPlease) {
        GuardDecision::Allowed
    } else {
        GuardDecision::Blocked
    }
}

/// Evaluate, report the outcome and return the process exit code.
pub fn run_guard(ctx: &InvocationContext, reporter: &dyn Reporter) -> i32 {
    let decision = evaluate(ctx);
    match decision {
        GuardDecision::Allowed => {
            info!(subcommand = ?ctx.subcommand, "guard allowed release");
            reporter.report(&ReportEvent::GuardAllowed);
        }
        GuardDecision::Blocked => {
            warn!(subcommand = ?ctx.subcommand, "guard blocked release");
            reporter.report(&ReportEvent::GuardRejected);
        }
    }
    decision.exit_code()
}
