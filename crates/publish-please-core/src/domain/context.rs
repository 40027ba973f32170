//! Invocation context detection.
//!
//! npm exports the active subcommand as `npm_command` and every boolean CLI
//! flag as `npm_config_<flag>=true` to lifecycle scripts. [`detect`] turns a
//! snapshot of those variables into an [`InvocationContext`].
//!
//! Detection never fails: a missing snapshot or unexpected values degrade to
//! `false` / [`Subcommand::Unknown`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Variable holding the npm subcommand.
pub const NPM_COMMAND_KEY: &str = "npm_command";

/// Prefix of the variables npm exports for config flags.
pub const NPM_CONFIG_PREFIX: &str = "npm_config_";

/// The only value that turns a flag on.
const TRUTHY: &str = "true";

/// Immutable copy of the environment variables relevant to detection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the live process environment. Non UTF-8 entries are dropped.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for EnvSnapshot
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// npm subcommand that launched the current process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Subcommand {
    Install,
    Publish,
    RunScript,
    Exec,
    #[default]
    Unknown,
}

impl Subcommand {
    fn parse(value: &str) -> Self {
        match value {
            "install" => Subcommand::Install,
            "publish" => Subcommand::Publish,
            "run-script" => Subcommand::RunScript,
            "exec" => Subcommand::Exec,
            _ => Subcommand::Unknown,
        }
    }
}

/// Boolean flags npm forwarded to the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flag {
    SaveDev,
    Save,
    Global,
    DryRun,
    Ci,
    Config,
    /// Marker passed by the guarded workflow to the real release command.
    WithPublishPlease,
}

impl Flag {
    pub const ALL: [Flag; 7] = [
        Flag::SaveDev,
        Flag::Save,
        Flag::Global,
        Flag::DryRun,
        Flag::Ci,
        Flag::Config,
        Flag::WithPublishPlease,
    ];

    /// Suffix after `npm_config_`.
    pub fn config_name(self) -> &'static str {
        match self {
            Flag::SaveDev => "save_dev",
            Flag::Save => "save",
            Flag::Global => "global",
            Flag::DryRun => "dry_run",
            Flag::Ci => "ci",
            Flag::Config => "config",
            Flag::WithPublishPlease => "with_publish_please",
        }
    }

    /// The flag as typed on the npm command line.
    pub fn cli_name(self) -> &'static str {
        match self {
            Flag::SaveDev => "--save-dev",
            Flag::Save => "--save",
            Flag::Global => "--global",
            Flag::DryRun => "--dry-run",
            Flag::Ci => "--ci",
            Flag::Config => "config",
            Flag::WithPublishPlease => "--with-publish-please",
        }
    }

    pub fn env_key(self) -> String {
        format!("{NPM_CONFIG_PREFIX}{}", self.config_name())
    }
}

/// Structured facts about how the host package manager was invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationContext {
    pub subcommand: Subcommand,
    pub save_dev: bool,
    pub save: bool,
    pub global: bool,
    pub dry_run: bool,
    pub ci: bool,
    pub config: bool,
    pub with_publish_please: bool,
}

impl InvocationContext {
    /// The neutral context: every flag off, subcommand unknown.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::SaveDev => self.save_dev,
            Flag::Save => self.save,
            Flag::Global => self.global,
            Flag::DryRun => self.dry_run,
            Flag::Ci => self.ci,
            Flag::Config => self.config,
            Flag::WithPublishPlease => self.with_publish_please,
        }
    }

    pub fn is_install(&self) -> bool {
        self.subcommand == Subcommand::Install
    }

    pub fn is_publish(&self) -> bool {
        self.subcommand == Subcommand::Publish
    }

    pub fn is_run_script(&self) -> bool {
        self.subcommand == Subcommand::RunScript
    }

    pub fn is_npx(&self) -> bool {
        self.subcommand == Subcommand::Exec
    }

    /// Whether the trusted-release marker is present.
    pub fn is_trusted_release(&self) -> bool {
        self.with_publish_please
    }
}

/// Derive an [`InvocationContext`] from an environment snapshot.
///
/// `None` yields [`InvocationContext::empty`].
pub fn detect(env: Option<&EnvSnapshot>) -> InvocationContext {
    let Some(env) = env else {
        return InvocationContext::empty();
    };

    let has = |flag: Flag| env.get(&flag.env_key()) == Some(TRUTHY);

    InvocationContext {
        subcommand: env
            .get(NPM_COMMAND_KEY)
            .map(Subcommand::parse)
            .unwrap_or_default(),
        save_dev: has(Flag::SaveDev),
        save: has(Flag::Save),
        global: has(Flag::Global),
        dry_run: has(Flag::DryRun),
        ci: has(Flag::Ci),
        config: has(Flag::Config),
        with_publish_please: has(Flag::WithPublishPlease),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> EnvSnapshot {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_absent_env_is_empty_context() {
        let ctx = detect(None);
        assert_eq!(ctx, InvocationContext::empty());
        assert_eq!(ctx.subcommand, Subcommand::Unknown);
        for flag in Flag::ALL {
            assert!(!ctx.flag(flag), "{} should be off", flag.cli_name());
        }
    }

    #[test]
    fn test_publish_command() {
        let ctx = detect(Some(&env(&[("npm_command", "publish")])));
        assert!(ctx.is_publish());
        assert!(!ctx.is_install());
        assert!(!ctx.is_run_script());
        assert!(!ctx.is_npx());
        assert!(!ctx.is_trusted_release());
        assert!(!ctx.dry_run);
        assert!(!ctx.ci);
        assert!(!ctx.config);
    }

    #[test]
    fn test_publish_with_trusted_flag() {
        let ctx = detect(Some(&env(&[
            ("npm_command", "publish"),
            ("npm_config_with_publish_please", "true"),
        ])));
        assert!(ctx.is_publish());
        assert!(ctx.is_trusted_release());
    }

    #[test]
    fn test_install_save_dev() {
        let ctx = detect(Some(&env(&[
            ("npm_command", "install"),
            ("npm_config_save_dev", "true"),
        ])));
        assert!(ctx.is_install());
        assert!(ctx.save_dev);
        assert!(!ctx.save);
        assert!(!ctx.global);
    }

    #[test]
    fn test_install_global() {
        let ctx = detect(Some(&env(&[
            ("npm_command", "install"),
            ("npm_config_global", "true"),
        ])));
        assert!(ctx.global);
        assert!(!ctx.save_dev);
    }

    #[test]
    fn test_run_script_dry_run_ci() {
        let ctx = detect(Some(&env(&[
            ("npm_command", "run-script"),
            ("npm_config_dry_run", "true"),
            ("npm_config_ci", "true"),
        ])));
        assert!(ctx.is_run_script());
        assert!(ctx.dry_run);
        assert!(ctx.ci);
        assert!(!ctx.config);
    }

    #[test]
    fn test_run_script_config() {
        let ctx = detect(Some(&env(&[
            ("npm_command", "run-script"),
            ("npm_config_config", "true"),
        ])));
        assert!(ctx.config);
        assert!(!ctx.dry_run);
    }

    #[test]
    fn test_exec_is_npx() {
        let ctx = detect(Some(&env(&[("npm_command", "exec")])));
        assert!(ctx.is_npx());
    }

    #[test]
    fn test_non_sentinel_values_are_false() {
        let ctx = detect(Some(&env(&[
            ("npm_command", "PUBLISH"),
            ("npm_config_ci", "TRUE"),
            ("npm_config_dry_run", "1"),
            ("npm_config_with_publish_please", ""),
        ])));
        assert_eq!(ctx, InvocationContext::empty());
    }

    #[test]
    fn test_unrelated_env_is_empty_context() {
        let ctx = detect(Some(&env(&[("HOME", "/root"), ("CI", "true")])));
        assert_eq!(ctx, InvocationContext::empty());
    }

    #[test]
    fn test_flag_env_keys() {
        assert_eq!(Flag::SaveDev.env_key(), "npm_config_save_dev");
        assert_eq!(
            Flag::WithPublishPlease.env_key(),
            "npm_config_with_publish_please"
        );
    }
}
