//! Push executor with a remote-branch probe and a wall-clock bound.
//!
//! The probe distinguishes three situations that all look like "nothing
//! staged" locally:
//! - the remote branch already matches the local branch and is tracked (no-op),
//! - the remote branch is missing or behind (local commits to publish),
//! - the branch exists remotely but has never been synchronized from this
//!   working copy (first synchronization, reported as success).
//!
//! A probe that fails is an error, never an implicit first push.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use super::runner::GitRunner;
use crate::classify::classify_failure;
use crate::error::{Result, SyncError};
use crate::types::PushOutcome;

/// Bound for a push. Sized for large binary uploads.
pub const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_secs(3600);

/// Bound for the `ls-remote` existence probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(120);

/// State of the target branch on the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteBranch {
    /// Branch exists and points at this commit
    Present(String),
    Absent,
}

/// Result of [`execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushResult {
    pub outcome: PushOutcome,
    /// Whether `git push` ran to completion
    pub pushed: bool,
}

/// Ask the remote whether `branch` exists, without fetching anything.
#[instrument(level = "debug", skip(runner))]
pub async fn probe_remote_branch(
    runner: &GitRunner,
    repo: &Path,
    remote: &str,
    branch: &str,
) -> Result<RemoteBranch> {
    let refname = format!("refs/heads/{branch}");
    let out = runner
        .output_with_timeout(
            Some(repo),
            &["ls-remote", "--heads", remote, &refname],
            PROBE_TIMEOUT,
        )
        .await?;
    if !out.success() {
        return Err(classify_failure(out.combined()));
    }
    Ok(parse_ls_remote(&out.stdout, &refname))
}

fn parse_ls_remote(stdout: &str, refname: &str) -> RemoteBranch {
    stdout
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .find(|(_, name)| name.trim() == refname)
        .map(|(oid, _)| RemoteBranch::Present(oid.trim().to_string()))
        .unwrap_or(RemoteBranch::Absent)
}

/// Commit id of local `branch`, or `None` when it has no commits yet.
pub async fn branch_oid(runner: &GitRunner, repo: &Path, branch: &str) -> Result<Option<String>> {
    let refname = format!("refs/heads/{branch}");
    let out = runner
        .output(Some(repo), &["rev-parse", "--verify", "-q", &refname])
        .await?;
    Ok(out.success().then(|| out.stdout_trimmed().to_string()))
}

/// Whether `branch` already tracks a remote branch.
pub async fn has_upstream(runner: &GitRunner, repo: &Path, branch: &str) -> Result<bool> {
    let spec = format!("{branch}@{{upstream}}");
    let out = runner
        .output(
            Some(repo),
            &["rev-parse", "--abbrev-ref", "--symbolic-full-name", &spec],
        )
        .await?;
    Ok(out.success())
}

/// Decide whether a push is needed.
///
/// After a commit there is always something to publish. Otherwise push only
/// when the remote lacks the branch, points elsewhere, or the local branch has
/// never been linked to it.
pub fn needs_push(
    committed: bool,
    remote: &RemoteBranch,
    local: Option<&str>,
    upstream: bool,
) -> bool {
    if committed {
        return true;
    }
    match remote {
        RemoteBranch::Absent => local.is_some(),
        RemoteBranch::Present(oid) => local != Some(oid.as_str()) || !upstream,
    }
}

/// `git push -u <remote> <branch>` bounded by `limit`.
///
/// On timeout the child is killed; local commits are untouched.
#[instrument(level = "debug", skip(runner))]
pub async fn push_branch(
    runner: &GitRunner,
    repo: &Path,
    remote: &str,
    branch: &str,
    limit: Duration,
) -> Result<()> {
    let out = runner
        .output_with_timeout(Some(repo), &["push", "-u", remote, branch], limit)
        .await?;
    if out.success() {
        info!(%remote, %branch, "pushed");
        Ok(())
    } else {
        Err(classify_failure(out.combined()))
    }
}

/// Probe, decide and push.
pub async fn execute(
    runner: &GitRunner,
    repo: &Path,
    remote: &str,
    branch: &str,
    committed: bool,
    limit: Duration,
) -> Result<PushResult> {
    let remote_branch = probe_remote_branch(runner, repo, remote, branch).await?;
    let local = branch_oid(runner, repo, branch).await?;
    let upstream = has_upstream(runner, repo, branch).await?;
    debug!(?remote_branch, ?local, upstream, committed, "push decision inputs");

    if !needs_push(committed, &remote_branch, local.as_deref(), upstream) {
        info!(%branch, "remote already up to date");
        return Ok(PushResult {
            outcome: PushOutcome::NoOpNoChanges,
            pushed: false,
        });
    }

    match push_branch(runner, repo, remote, branch, limit).await {
        Ok(()) => Ok(PushResult {
            outcome: PushOutcome::Success,
            pushed: true,
        }),
        Err(err @ SyncError::Timeout { .. }) => {
            warn!(%branch, "push timed out; local commit kept");
            Err(err)
        }
        Err(err) => Err(err),
    }
}
