//! Branch resolution.

use std::path::Path;

use tracing::{debug, warn};

use super::runner::GitRunner;
use crate::error::Result;

/// Used when nothing is checked out yet and the caller named no branch.
pub const DEFAULT_BRANCH: &str = "main";

/// Name of the checked-out branch, or `None` before the first commit or on a
/// detached HEAD.
pub async fn current_branch(runner: &GitRunner, repo: &Path) -> Result<Option<String>> {
    let out = runner
        .output(Some(repo), &["rev-parse", "--abbrev-ref", "HEAD"])
        .await?;
    if !out.success() {
        debug!(output = %out.combined(), "no current branch");
        return Ok(None);
    }
    match out.stdout_trimmed() {
        "" | "HEAD" => Ok(None),
        name => Ok(Some(name.to_string())),
    }
}

/// Pick the branch to push: explicit name, else current branch, else `fallback`.
pub async fn resolve_branch(
    runner: &GitRunner,
    repo: &Path,
    explicit: Option<&str>,
    fallback: &str,
) -> Result<String> {
    if let Some(name) = explicit.map(str::trim).filter(|n| !n.is_empty()) {
        return Ok(name.to_string());
    }
    Ok(current_branch(runner, repo)
        .await?
        .unwrap_or_else(|| fallback.to_string()))
}

/// Force-rename the checked-out branch. A failure is logged and ignored; the
/// subsequent push reports any real problem.
pub async fn rename_current(runner: &GitRunner, repo: &Path, name: &str) -> bool {
    match runner.run(Some(repo), &["branch", "-M", name]).await {
        Ok(_) => {
            debug!(branch = name, "branch renamed");
            true
        }
        Err(err) => {
            warn!(branch = name, error = %err, "could not rename branch");
            false
        }
    }
}
