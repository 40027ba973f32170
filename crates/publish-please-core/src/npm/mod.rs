//! npm collaborators: version capabilities, package file listing and audit.

pub mod audit;
pub mod pack;

use std::fmt;
use std::path::Path;

use semver::Version;
use tracing::{debug, warn};

use crate::process::{run_shell, OutputMode};

/// First npm release whose `npm audit` supports `--json`.
pub const AUDIT_JSON_MIN: Version = Version::new(6, 1, 0);

/// First npm release whose `npm pack` supports `--dry-run --json`.
pub const PACK_JSON_MIN: Version = Version::new(5, 9, 0);

/// Installed npm version and the features it unlocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NpmInfo {
    version: Option<Version>,
}

impl NpmInfo {
    /// Ask `npm --version`. A missing or unparsable npm yields an unknown
    /// version with every capability off.
    pub async fn detect(project_dir: &Path) -> Self {
        match run_shell("npm --version", project_dir, OutputMode::Capture).await {
            Ok(out) if out.success() => {
                let info = Self::parse(&out.stdout);
                debug!(version = %info, "detected npm");
                info
            }
            Ok(out) => {
                warn!(exit_code = out.exit_code, "npm --version failed");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, "npm is not available");
                Self::default()
            }
        }
    }

    pub fn parse(raw: &str) -> Self {
        Self {
            version: Version::parse(raw.trim()).ok(),
        }
    }

    pub fn with_version(version: Version) -> Self {
        Self {
            version: Some(version),
        }
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    pub fn audit_has_json_reporter(&self) -> bool {
        self.supports(&AUDIT_JSON_MIN)
    }

    pub fn pack_has_json_reporter(&self) -> bool {
        self.supports(&PACK_JSON_MIN)
    }

    fn supports(&self, min: &Version) -> bool {
        self.version.as_ref().is_some_and(|v| v >= min)
    }
}

impl fmt::Display for NpmInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("unknown"),
        }
    }
}
