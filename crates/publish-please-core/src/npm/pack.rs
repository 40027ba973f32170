//! Files npm would publish, from `npm pack --dry-run --json`.

use std::path::Path;

use serde::Deserialize;

use crate::domain::error::{PublishError, Result};
use crate::process::{run_shell, OutputMode};

#[derive(Debug, Deserialize)]
struct PackEntry {
    #[serde(default)]
    files: Vec<PackFile>,
}

#[derive(Debug, Deserialize)]
struct PackFile {
    path: String,
}

/// List the package-relative paths of every file in the tarball.
pub async fn packed_files(project_dir: &Path) -> Result<Vec<String>> {
    let out = run_shell("npm pack --dry-run --json", project_dir, OutputMode::Capture).await?;
    if !out.success() {
        return Err(PublishError::Npm(format!(
            "npm pack exited with code {}: {}",
            out.exit_code,
            out.stderr.trim()
        )));
    }
    parse_pack_output(&out.stdout)
}

/// Parse the JSON array printed by `npm pack --json`.
pub fn parse_pack_output(stdout: &str) -> Result<Vec<String>> {
    // lifecycle scripts may print before the JSON document
    let json = stdout
        .find('[')
        .map(|start| &stdout[start..])
        .ok_or_else(|| PublishError::Npm("npm pack produced no JSON output".to_string()))?;
    let entries: Vec<PackEntry> = serde_json::from_str(json)?;
    Ok(entries
        .into_iter()
        .flat_map(|entry| entry.files)
        .map(|file| file.path)
        .collect())
}
