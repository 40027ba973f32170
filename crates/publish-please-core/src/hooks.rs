//! `publish-please init`: wire the guard into a project's `package.json`.

use std::path::Path;

use tracing::info;

use crate::domain::config::{ResolvedConfig, CONFIG_FILE};
use crate::domain::error::Result;
use crate::domain::manifest::Manifest;

pub const RUN_SCRIPT_NAME: &str = "publish-please";
pub const RUN_SCRIPT: &str = "publish-please";
pub const PREPUBLISH_HOOK: &str = "prepublishOnly";
pub const GUARD_COMMAND: &str = "publish-please guard";

/// What happened to the `prepublishOnly` hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookChange {
    Added,
    /// An existing hook was kept and chained after the guard.
    Chained { previous: String },
    AlreadyGuarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitSummary {
    /// `scripts.publish-please` was missing and has been added.
    pub run_script_added: bool,
    /// What happened to `scripts.prepublishOnly`.
    pub prepublish: HookChange,
    /// A default `.publishrc` was written; an existing one is never touched.
    pub config_written: bool,
}

/// Compute the new `prepublishOnly` value for an existing one.
pub fn guarded_hook(existing: Option<&str>) -> (String, HookChange) {
    match existing.map(str::trim).filter(|s| !s.is_empty()) {
        None => (GUARD_COMMAND.to_string(), HookChange::Added),
        Some(hook) if hook.contains(GUARD_COMMAND) => {
            (hook.to_string(), HookChange::AlreadyGuarded)
        }
        Some(hook) => (
            format!("{GUARD_COMMAND} && {hook}"),
            HookChange::Chained {
                previous: hook.to_string(),
            },
        ),
    }
}

/// Add the run script and the guard hook, and write `default_config` as
/// `.publishrc` unless one already exists.
pub fn install(project_dir: &Path, default_config: &ResolvedConfig) -> Result<InitSummary> {
    let mut manifest = Manifest::load(project_dir)?;

    let run_script_added = manifest.script(RUN_SCRIPT_NAME).is_none();
    if run_script_added {
        manifest.set_script(RUN_SCRIPT_NAME, RUN_SCRIPT);
    }

    let (hook, prepublish) = guarded_hook(manifest.script(PREPUBLISH_HOOK));
    if prepublish != HookChange::AlreadyGuarded {
        manifest.set_script(PREPUBLISH_HOOK, hook);
    }

    if run_script_added || prepublish != HookChange::AlreadyGuarded {
        manifest.save()?;
        info!(path = %manifest.path().display(), "updated package.json scripts");
    }

    let config_written = !project_dir.join(CONFIG_FILE).exists();
    if config_written {
        default_config.save(project_dir)?;
        info!("wrote default {CONFIG_FILE}");
    }

    Ok(InitSummary {
        run_script_added,
        prepublish,
        config_written,
    })
}
