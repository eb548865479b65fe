//! Git operations behind the sync flow.
//!
//! Each stage is a small set of async functions over a [`GitRunner`]:
//! - classifying a directory as fresh or already initialized
//! - bootstrapping large-blob tracking
//! - binding the remote, staging and committing
//! - resolving the branch and pushing it

pub mod branch;
pub mod clone;
pub mod lfs;
pub mod push;
pub mod remote;
pub mod runner;
pub mod stage;
pub mod state;

use std::path::Path;

use tracing::{debug, warn};

pub use branch::{DEFAULT_BRANCH, current_branch, rename_current, resolve_branch};
pub use clone::clone_repo;
pub use lfs::{LFS_PATTERNS, LfsStatus};
pub use push::{DEFAULT_PUSH_TIMEOUT, PushResult, RemoteBranch};
pub use remote::{DEFAULT_REMOTE, RemoteChange, reconcile_remote, urls_match};
pub use runner::{GitOutput, GitRunner, ToolInfo, parse_git_version};
pub use stage::{CommitOutcome, DEFAULT_COMMIT_MESSAGE, stage_and_commit};
pub use state::classify_directory;

use crate::error::Result;

/// Buffer size applied to fresh repositories for large HTTP pushes (500 MB).
pub const HTTP_BUFFER_BYTES: &str = "524288000";

/// `git init` in an existing directory.
pub async fn init_repo(runner: &GitRunner, path: &Path) -> Result<()> {
    runner.run(Some(path), &["init"]).await?;
    debug!(path = %path.display(), "initialized repository");
    Ok(())
}

/// Raise HTTP buffer limits for large pushes. Failures are logged only.
pub async fn configure_large_push(runner: &GitRunner, path: &Path) {
    for key in ["http.postBuffer", "http.maxRequestBuffer"] {
        if let Err(err) = runner
            .run(Some(path), &["config", key, HTTP_BUFFER_BYTES])
            .await
        {
            warn!(%key, error = %err, "could not configure git for large pushes");
        }
    }
}

#[cfg(test)]
mod tests;
