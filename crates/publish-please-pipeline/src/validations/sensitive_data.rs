use async_trait::async_trait;
use glob::Pattern;
use publish_please_core::npm::pack;
use publish_please_core::{NpmInfo, ValidationOptions, ValidationSetting};
use tracing::warn;

use crate::error::Result;
use crate::prompt::Prompt;
use crate::validation::{Validation, ValidationContext, ValidationFailure};

pub const KEY: &str = "sensitiveData";

/// Files that should never end up in a published tarball. Each pattern is
/// tried against the full package path and against the file name.
pub const SENSITIVE_PATTERNS: &[&str] = &[
    // keys and credentials
    "*.pem",
    "*.key",
    "*.p12",
    "*.pfx",
    "*.keychain",
    "*.kdbx",
    "*.ovpn",
    "id_rsa",
    "id_dsa",
    "id_ecdsa",
    "id_ed25519",
    ".env",
    ".env.*",
    ".npmrc",
    ".netrc",
    "credentials.json",
    "secrets.yml",
    "database.yml",
    "schema.rb",
    "*.tfstate",
    "*_history",
    // data
    "*.sqlite",
    "*.sqlite3",
    "*.db",
    // archives and logs
    "*.log",
    "*.tgz",
    "*.tar",
    "*.tar.gz",
    "*.zip",
    "*.rar",
    "*.7z",
    // editor and os leftovers
    "*.orig",
    "*.swp",
    ".DS_Store",
    // tooling config
    ".travis.yml",
    ".gitlab-ci.yml",
    "appveyor.yml",
    ".editorconfig",
    ".eslintrc*",
    ".prettierrc*",
    ".publishrc",
    ".auditignore",
    "audit.opts",
    // tests and reports
    "test/*",
    "tests/*",
    "__tests__/*",
    "coverage/*",
    ".nyc_output/*",
    "*.spec.js",
    "*.test.js",
];

/// Matches package paths against a list of globs.
#[derive(Debug, Clone)]
pub struct GlobSet {
    patterns: Vec<Pattern>,
}

impl GlobSet {
    /// Compile `globs`, skipping invalid ones with a warning.
    pub fn new<S: AsRef<str>>(globs: &[S]) -> Self {
        let patterns = globs
            .iter()
            .filter_map(|g| match Pattern::new(g.as_ref()) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!(glob = g.as_ref(), error = %e, "ignoring invalid glob");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn is_match(&self, path: &str) -> bool {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        self.patterns
            .iter()
            .any(|p| p.matches(path) || p.matches(file_name))
    }
}

/// Packaged files matching a sensitive pattern and no ignore glob.
pub fn find_sensitive(files: &[String], ignore: &[String]) -> Vec<String> {
    let sensitive = GlobSet::new(SENSITIVE_PATTERNS);
    let ignored = GlobSet::new(ignore);
    files
        .iter()
        .filter(|f| sensitive.is_match(f) && !ignored.is_match(f))
        .cloned()
        .collect()
}

#[derive(Debug, Clone)]
pub struct SensitiveDataValidation {
    npm: NpmInfo,
}

impl SensitiveDataValidation {
    pub fn new(npm: NpmInfo) -> Self {
        Self { npm }
    }
}

#[async_trait]
impl Validation for SensitiveDataValidation {
    fn key(&self) -> &'static str {
        KEY
    }

    fn status_text(&self) -> &'static str {
        "Checking for the sensitive and non-essential data in the npm package"
    }

    fn default_setting(&self) -> ValidationSetting {
        ValidationSetting::enabled()
    }

    fn can_run(&self) -> bool {
        self.npm.pack_has_json_reporter()
    }

    fn why_cannot_run(&self) -> String {
        format!(
            "Cannot check sensitive and non-essential data because npm version is {}. Either upgrade npm to version 5.9.0 or above, or disable this validation in the configuration file",
            self.npm
        )
    }

    async fn configure(
        &self,
        current: &ValidationSetting,
        prompt: &dyn Prompt,
    ) -> Result<ValidationSetting> {
        let enabled = prompt
            .confirm(
                "Would you like to verify that there is no sensitive and non-essential data in the npm package?",
                !current.is_disabled(),
            )
            .await?;
        Ok(match (enabled, current) {
            (false, _) => ValidationSetting::disabled(),
            (true, ValidationSetting::Options(opts)) => ValidationSetting::Options(opts.clone()),
            (true, _) => ValidationSetting::enabled(),
        })
    }

    async fn run(&self, ctx: &ValidationContext<'_>) -> std::result::Result<(), ValidationFailure> {
        let files = pack::packed_files(ctx.project_dir).await?;
        let found = find_sensitive(&files, ctx.setting.ignore_globs());
        if found.is_empty() {
            return Ok(());
        }
        Err(ValidationFailure::List(
            found
                .into_iter()
                .map(|f| format!("Sensitive or non essential data found in npm package: {f}"))
                .collect(),
        ))
    }
}

impl Default for SensitiveDataValidation {
    fn default() -> Self {
        Self::new(NpmInfo::default())
    }
}

/// Options object with the given ignore globs.
pub fn ignoring<S: Into<String>>(globs: impl IntoIterator<Item = S>) -> ValidationSetting {
    ValidationSetting::Options(ValidationOptions {
        ignore: globs.into_iter().map(Into::into).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(list: &[&str]) -> Vec<String> {
        list.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_finds_sensitive_files() {
        let found = find_sensitive(
            &files(&[
                "package.json",
                "lib/index.js",
                "lib/schema.rb",
                "test/index.spec.js",
                "debug.log",
                ".env",
                "lib/secret.keychain",
                "README.md",
            ]),
            &[],
        );
        assert_eq!(
            found,
            vec![
                "lib/schema.rb",
                "test/index.spec.js",
                "debug.log",
                ".env",
                "lib/secret.keychain",
            ]
        );
    }

    #[test]
    fn test_ignore_globs_exclude_files() {
        let found = find_sensitive(
            &files(&["lib/schema.rb", "lib/secret.keychain", "debug.log"]),
            &["lib/schema.rb".to_string(), "lib/*.keychain".to_string()],
        );
        assert_eq!(found, vec!["debug.log"]);
    }

    #[test]
    fn test_clean_package() {
        assert!(find_sensitive(&files(&["package.json", "lib/index.js"]), &[]).is_empty());
    }

    #[test]
    fn test_unsupported_npm() {
        let v = SensitiveDataValidation::new(NpmInfo::parse("5.8.0"));
        assert!(!v.can_run());
        assert_eq!(
            v.why_cannot_run(),
            "Cannot check sensitive and non-essential data because npm version is 5.8.0. Either upgrade npm to version 5.9.0 or above, or disable this validation in the configuration file"
        );
        assert!(SensitiveDataValidation::new(NpmInfo::parse("5.9.0")).can_run());
    }

    #[test]
    fn test_ignoring_builds_options() {
        let setting = ignoring(["lib/*.keychain"]);
        assert_eq!(setting.ignore_globs(), ["lib/*.keychain"]);
    }
}
