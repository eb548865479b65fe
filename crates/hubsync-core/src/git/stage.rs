//! Staging and commit with no-op detection.

use std::path::Path;

use tracing::{debug, info, instrument};

use super::runner::GitRunner;
use crate::classify::classify_failure;
use crate::error::Result;

/// Used when the caller leaves the commit message blank.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update project";

/// Whether the staging step produced a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    NoChanges,
}

/// Stage the whole tree, then unstage every denylisted path.
///
/// Denylist entries are relative to `repo`. Entries that are not staged are
/// ignored.
pub async fn stage_all(runner: &GitRunner, repo: &Path, denylist: &[String]) -> Result<()> {
    runner.run(Some(repo), &["add", "-A"]).await?;
    for path in denylist {
        runner
            .run(
                Some(repo),
                &["rm", "--cached", "--ignore-unmatch", "--quiet", "--", path],
            )
            .await?;
        debug!(%path, "denylisted path unstaged");
    }
    Ok(())
}

/// True when HEAD resolves to a commit.
pub async fn has_head(runner: &GitRunner, repo: &Path) -> Result<bool> {
    let out = runner
        .output(Some(repo), &["rev-parse", "--verify", "-q", "HEAD"])
        .await?;
    Ok(out.success())
}

/// Does the index differ from the last commit?
///
/// Before the first commit any staged file counts as a change.
pub async fn has_staged_changes(runner: &GitRunner, repo: &Path) -> Result<bool> {
    if !has_head(runner, repo).await? {
        let out = runner.run(Some(repo), &["ls-files", "--cached"]).await?;
        return Ok(!out.stdout_trimmed().is_empty());
    }

    let out = runner
        .output(Some(repo), &["diff", "--cached", "--quiet"])
        .await?;
    match out.code() {
        Some(0) => Ok(false),
        Some(1) => Ok(true),
        _ => Err(classify_failure(out.combined())),
    }
}

/// Commit the index, substituting the default message for a blank one.
pub async fn commit(runner: &GitRunner, repo: &Path, message: &str) -> Result<()> {
    let message = match message.trim() {
        "" => DEFAULT_COMMIT_MESSAGE,
        trimmed => trimmed,
    };
    runner.run(Some(repo), &["commit", "-m", message]).await?;
    info!(%message, "committed");
    Ok(())
}

/// Stage everything and commit only if the staged tree changed.
#[instrument(level = "debug", skip(runner, denylist))]
pub async fn stage_and_commit(
    runner: &GitRunner,
    repo: &Path,
    message: &str,
    denylist: &[String],
) -> Result<CommitOutcome> {
    stage_all(runner, repo, denylist).await?;
    if !has_staged_changes(runner, repo).await? {
        info!("no changes to commit");
        return Ok(CommitOutcome::NoChanges);
    }
    commit(runner, repo, message).await?;
    Ok(CommitOutcome::Committed)
}
