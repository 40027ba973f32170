//! Git queries used by the working-tree and release validations.
//!
//! Every call shells out to the `git` binary in the project directory and
//! maps failures to [`PublishError::Git`].

use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::domain::error::{PublishError, Result};

/// Parsed `git status --porcelain` output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingTreeStatus {
    /// Paths with staged or unstaged modifications.
    pub uncommitted: Vec<String>,
    /// Paths git does not track (`??` entries).
    pub untracked: Vec<String>,
}

impl WorkingTreeStatus {
    pub fn parse(porcelain: &str) -> Self {
        let mut status = Self::default();
        for line in porcelain.lines().filter(|l| l.len() > 3) {
            let (code, path) = line.split_at(3);
            let path = path.trim().to_string();
            if code.starts_with("??") {
                status.untracked.push(path);
            } else {
                status.uncommitted.push(path);
            }
        }
        status
    }

    pub fn has_uncommitted_changes(&self) -> bool {
        !self.uncommitted.is_empty()
    }

    pub fn has_untracked_files(&self) -> bool {
        !self.untracked.is_empty()
    }
}

async fn git(repo_dir: &Path, args: &[&str]) -> Result<String> {
    debug!(?args, dir = %repo_dir.display(), "running git");
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .output()
        .await
        .map_err(|e| PublishError::Git(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PublishError::Git(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Name of the checked-out branch as `git branch` prints it, e.g. `master`
/// or `(HEAD detached at 15a1ef7)`.
pub async fn current_branch(repo_dir: &Path) -> Result<String> {
    let out = git(repo_dir, &["branch"]).await?;
    Ok(parse_current_branch(&out).unwrap_or_default())
}

fn parse_current_branch(out: &str) -> Option<String> {
    out.lines()
        .find_map(|line| line.strip_prefix("* "))
        .map(|name| name.trim().to_string())
}

/// Tags pointing at HEAD.
pub async fn head_tags(repo_dir: &Path) -> Result<Vec<String>> {
    let out = git(repo_dir, &["tag", "--points-at", "HEAD"]).await?;
    Ok(out
        .lines()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect())
}

pub async fn working_tree_status(repo_dir: &Path) -> Result<WorkingTreeStatus> {
    let out = git(repo_dir, &["status", "--porcelain"]).await?;
    Ok(WorkingTreeStatus::parse(&out))
}
