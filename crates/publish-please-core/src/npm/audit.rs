//! `npm audit` integration.
//!
//! The raw report is post-processed in two steps:
//! - advisories whose URL is listed in `.auditignore` are removed, and a
//!   vulnerability disappears once nothing it is caused by remains;
//! - `--audit-level=<lvl>` from `audit.opts` drops vulnerabilities below
//!   that severity.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::error::{PublishError, Result};
use crate::process::{run_shell, OutputMode};

pub const AUDIT_IGNORE_FILE: &str = ".auditignore";
pub const AUDIT_OPTS_FILE: &str = "audit.opts";

const LOCKFILES: [&str; 2] = ["package-lock.json", "npm-shrinkwrap.json"];

// ---------------------------------------------------------------------------
// Report model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "info" => Some(Severity::Info),
            "low" => Some(Severity::Low),
            "moderate" => Some(Severity::Moderate),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

/// One entry of a vulnerability's `via` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Via {
    /// Name of another vulnerable package this one depends on.
    Package(String),
    Advisory(Advisory),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    #[serde(default)]
    pub source: Option<serde_json::Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub via: Vec<Via>,
    #[serde(default)]
    pub nodes: Vec<String>,
}

impl Vulnerability {
    pub fn severity(&self) -> Option<Severity> {
        Severity::parse(&self.severity)
    }
}

/// Tooling failure reported by npm instead of (or next to) vulnerabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditToolError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    #[serde(default)]
    pub audit_report_version: Option<u32>,
    #[serde(default)]
    pub vulnerabilities: BTreeMap<String, Vulnerability>,
    #[serde(default)]
    pub error: Option<AuditToolError>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl AuditReport {
    pub fn parse(stdout: &str) -> Result<Self> {
        let json = stdout
            .find('{')
            .map(|start| &stdout[start..])
            .ok_or_else(|| PublishError::Npm("npm audit produced no JSON output".to_string()))?;
        Ok(serde_json::from_str(json)?)
    }

    /// Remove advisories whose URL is in `ignored`, then drop every
    /// vulnerability left without a cause. Package references to dropped
    /// vulnerabilities are removed until nothing changes.
    pub fn without_ignored(mut self, ignored: &BTreeSet<String>) -> Self {
        if ignored.is_empty() {
            return self;
        }
        for vuln in self.vulnerabilities.values_mut() {
            vuln.via.retain(|via| match via {
                Via::Advisory(adv) => adv.url.as_ref().map_or(true, |u| !ignored.contains(u)),
                Via::Package(_) => true,
            });
        }
        loop {
            let before = self.vulnerabilities.len();
            self.vulnerabilities.retain(|_, vuln| !vuln.via.is_empty());
            let remaining: BTreeSet<String> = self.vulnerabilities.keys().cloned().collect();
            for vuln in self.vulnerabilities.values_mut() {
                vuln.via.retain(|via| match via {
                    Via::Package(name) => remaining.contains(name),
                    Via::Advisory(_) => true,
                });
            }
            let emptied = self.vulnerabilities.values().any(|v| v.via.is_empty());
            if self.vulnerabilities.len() == before && !emptied {
                break;
            }
        }
        self
    }

    /// Drop vulnerabilities strictly below `level`. Unknown severities are
    /// kept.
    pub fn at_or_above(mut self, level: Severity) -> Self {
        self.vulnerabilities
            .retain(|_, vuln| vuln.severity().map_or(true, |s| s >= level));
        self
    }

    /// Error lines for the validation, or `None` when the audit is clean.
    ///
    /// Vulnerabilities win over a tooling error. Vulnerability lines are
    /// distinct and sorted.
    pub fn error_lines(&self) -> Option<Vec<String>> {
        if !self.vulnerabilities.is_empty() {
            let lines: BTreeSet<String> = self
                .vulnerabilities
                .values()
                .flat_map(|v| v.nodes.iter())
                .map(|node| vulnerability_line(node))
                .collect();
            return Some(lines.into_iter().collect());
        }
        match &self.error {
            Some(err) if !err.summary.is_empty() => Some(vec![indent_continuation(&err.summary)]),
            _ => None,
        }
    }
}

/// `node_modules/a/node_modules/b` becomes
/// `Vulnerability found in a -> node_modules -> b`. Only the leading
/// `node_modules/` is dropped; every other path segment is kept.
pub fn vulnerability_line(node: &str) -> String {
    let path = node.strip_prefix("node_modules/").unwrap_or(node);
    let chain = path.split('/').collect::<Vec<_>>().join(" -> ");
    format!("Vulnerability found in {chain}")
}

fn indent_continuation(summary: &str) -> String {
    summary
        .lines()
        .enumerate()
        .map(|(i, line)| if i == 0 { line.to_string() } else { format!("\t{line}") })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Project files
// ---------------------------------------------------------------------------

/// Advisory URLs from `.auditignore`. Blank lines are skipped.
pub fn load_ignore_list(project_dir: &Path) -> BTreeSet<String> {
    std::fs::read_to_string(project_dir.join(AUDIT_IGNORE_FILE))
        .map(|content| parse_ignore_list(&content))
        .unwrap_or_default()
}

pub fn parse_ignore_list(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Flags from `audit.opts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditOptions {
    pub level: Option<Severity>,
    /// Remaining flags, forwarded to `npm audit`.
    pub extra_args: Vec<String>,
}

impl AuditOptions {
    pub fn load(project_dir: &Path) -> Self {
        std::fs::read_to_string(project_dir.join(AUDIT_OPTS_FILE))
            .map(|content| Self::parse(&content))
            .unwrap_or_default()
    }

    pub fn parse(content: &str) -> Self {
        let mut opts = Self::default();
        let mut tokens = content.split_whitespace();
        while let Some(token) = tokens.next() {
            if let Some(level) = token.strip_prefix("--audit-level=") {
                opts.level = Severity::parse(level);
            } else if token == "--audit-level" {
                opts.level = tokens.next().and_then(Severity::parse);
            } else {
                opts.extra_args.push(token.to_string());
            }
        }
        opts
    }
}

// ---------------------------------------------------------------------------
// Running
// ---------------------------------------------------------------------------

/// Run `npm audit --json` in `project_dir` and apply `.auditignore` and
/// `audit.opts`.
///
/// Without a lockfile one is generated first with
/// `npm install --package-lock-only` and deleted afterwards.
pub async fn run_audit(project_dir: &Path) -> Result<AuditReport> {
    let generated_lockfile = !LOCKFILES.iter().any(|f| project_dir.join(f).exists());
    if generated_lockfile {
        info!("no lockfile found, generating a temporary one");
        let out = run_shell(
            "npm install --package-lock-only --ignore-scripts",
            project_dir,
            OutputMode::Capture,
        )
        .await?;
        if !out.success() {
            warn!(exit_code = out.exit_code, "lockfile generation failed");
        }
    }

    let result = audit_with_options(project_dir).await;

    if generated_lockfile {
        let lockfile = project_dir.join(LOCKFILES[0]);
        if let Err(e) = std::fs::remove_file(&lockfile) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    error = %e,
                    path = %lockfile.display(),
                    "could not remove temporary lockfile"
                );
            }
        }
    }

    result
}

async fn audit_with_options(project_dir: &Path) -> Result<AuditReport> {
    let opts = AuditOptions::load(project_dir);
    let mut command = String::from("npm audit --json");
    for arg in &opts.extra_args {
        command.push(' ');
        command.push_str(arg);
    }

    // npm audit exits non-zero when it finds something; the JSON decides
    let out = run_shell(&command, project_dir, OutputMode::Capture).await?;
    debug!(exit_code = out.exit_code, "npm audit finished");

    let report = AuditReport::parse(&out.stdout)?.without_ignored(&load_ignore_list(project_dir));
    Ok(match opts.level {
        Some(level) => report.at_or_above(level),
        None => report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_REPORT: &str = r#"{
      "auditReportVersion": 2,
      "vulnerabilities": {
        "ms": {
          "name": "ms",
          "severity": "high",
          "isDirect": true,
          "via": [
            {"source": 1094419, "name": "ms", "url": "https://github.com/advisories/GHSA-w9mr-4mfr-499f", "severity": "moderate"},
            {"source": 1098340, "name": "ms", "url": "https://github.com/advisories/GHSA-3fx5-fwvr-xrjg", "severity": "high"}
          ],
          "effects": [],
          "nodes": ["node_modules/ms"]
        }
      },
      "metadata": {"vulnerabilities": {"high": 1, "total": 1}}
    }"#;

    const TRANSITIVE_REPORT: &str = r#"{
      "vulnerabilities": {
        "lodash": {
          "name": "lodash",
          "severity": "critical",
          "via": [{"url": "https://github.com/advisories/GHSA-lodash", "severity": "critical"}],
          "nodes": ["node_modules/cli-table2/node_modules/lodash", "node_modules/lodash"]
        },
        "cli-table2": {
          "name": "cli-table2",
          "severity": "low",
          "via": ["lodash"],
          "nodes": ["node_modules/cli-table2"]
        }
      }
    }"#;

    fn ignore(urls: &[&str]) -> BTreeSet<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[test]
    fn test_vulnerability_lines_sorted_and_distinct() {
        let report = AuditReport::parse(TRANSITIVE_REPORT).unwrap();
        assert_eq!(
            report.error_lines().unwrap(),
            vec![
                "Vulnerability found in cli-table2",
                "Vulnerability found in cli-table2 -> node_modules -> lodash",
                "Vulnerability found in lodash",
            ]
        );
    }

    #[test]
    fn test_ignoring_every_advisory_clears_vulnerability() {
        let report = AuditReport::parse(MS_REPORT).unwrap().without_ignored(&ignore(&[
            "https://github.com/advisories/GHSA-3fx5-fwvr-xrjg",
            "https://github.com/advisories/GHSA-w9mr-4mfr-499f",
        ]));
        assert!(report.vulnerabilities.is_empty());
        assert_eq!(report.error_lines(), None);
    }

    #[test]
    fn test_partial_ignore_keeps_vulnerability() {
        let report = AuditReport::parse(MS_REPORT)
            .unwrap()
            .without_ignored(&ignore(&["https://github.com/advisories/GHSA-3fx5-fwvr-xrjg"]));
        let ms = &report.vulnerabilities["ms"];
        assert_eq!(ms.via.len(), 1);
        assert_eq!(
            report.error_lines().unwrap(),
            vec!["Vulnerability found in ms"]
        );
    }

    #[test]
    fn test_ignore_cascades_through_package_references() {
        let report = AuditReport::parse(TRANSITIVE_REPORT)
            .unwrap()
            .without_ignored(&ignore(&["https://github.com/advisories/GHSA-lodash"]));
        assert!(report.vulnerabilities.is_empty());
    }

    #[test]
    fn test_audit_level_filters_lower_severities() {
        let report = AuditReport::parse(TRANSITIVE_REPORT)
            .unwrap()
            .at_or_above(Severity::High);
        assert_eq!(report.vulnerabilities.len(), 1);
        assert!(report.vulnerabilities.contains_key("lodash"));
    }

    #[test]
    fn test_tool_error_summary_is_indented() {
        let report = AuditReport::parse(
            r#"{"error": {"code": "ENOLOCK", "summary": "This command requires an existing lockfile.\nTry creating one first with: npm i --package-lock-only"}}"#,
        )
        .unwrap();
        assert_eq!(
            report.error_lines().unwrap(),
            vec!["This command requires an existing lockfile.\n\tTry creating one first with: npm i --package-lock-only"]
        );
    }

    #[test]
    fn test_audit_options_parse() {
        let opts = AuditOptions::parse("--audit-level=high\n--production\n");
        assert_eq!(opts.level, Some(Severity::High));
        assert_eq!(opts.extra_args, vec!["--production"]);

        let opts = AuditOptions::parse("--audit-level moderate");
        assert_eq!(opts.level, Some(Severity::Moderate));
        assert!(opts.extra_args.is_empty());
    }

    #[test]
    fn test_ignore_list_trims_and_skips_blank_lines() {
        let list = parse_ignore_list("  https://a \n\n\thttps://b\r\n");
        assert_eq!(list, ignore(&["https://a", "https://b"]));
    }

    #[test]
    fn test_vulnerability_line_without_prefix() {
        assert_eq!(vulnerability_line("ms"), "Vulnerability found in ms");
    }

    #[test]
    fn test_vulnerability_line_keeps_nested_segments() {
        assert_eq!(
            vulnerability_line("node_modules/ggit/node_modules/lodash"),
            "Vulnerability found in ggit -> node_modules -> lodash"
        );
        assert_eq!(
            vulnerability_line("node_modules/@babel/core"),
            "Vulnerability found in @babel -> core"
        );
    }
}
