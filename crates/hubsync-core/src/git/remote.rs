//! Binds one named remote to the desired URL.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::runner::GitRunner;
use crate::classify::classify_failure;
use crate::error::{ErrorKind, Result};

/// Default remote name.
pub const DEFAULT_REMOTE: &str = "origin";

/// What reconciliation had to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteChange {
    /// The remote did not exist and was added
    Added,
    /// The remote pointed elsewhere and was retargeted
    Retargeted { previous: String },
    /// Already bound to the desired URL
    Unchanged,
}

/// Compare remote URLs ignoring trailing slashes.
pub fn urls_match(a: &str, b: &str) -> bool {
    a.trim().trim_end_matches('/') == b.trim().trim_end_matches('/')
}

/// URL currently bound to `name`, or `None` when the remote does not exist.
pub async fn remote_url(runner: &GitRunner, repo: &Path, name: &str) -> Result<Option<String>> {
    let out = runner.output(Some(repo), &["remote", "get-url", name]).await?;
    if out.success() {
        return Ok(Some(out.stdout_trimmed().to_string()));
    }

    let err = classify_failure(out.combined());
    // `get-url` exits 2 for a missing remote; older git only says so in text.
    if out.code() == Some(2) || err.kind() == ErrorKind::NotFound {
        Ok(None)
    } else {
        Err(err)
    }
}

/// Make `name` point at `url`. Repeated calls converge on the same state.
#[instrument(level = "debug", skip(runner))]
pub async fn reconcile_remote(
    runner: &GitRunner,
    repo: &Path,
    name: &str,
    url: &str,
) -> Result<RemoteChange> {
    match remote_url(runner, repo, name).await? {
        None => {
            runner.run(Some(repo), &["remote", "add", name, url]).await?;
            info!(remote = name, %url, "remote added");
            Ok(RemoteChange::Added)
        }
        Some(current) if urls_match(&current, url) => {
            debug!(remote = name, "remote already bound");
            Ok(RemoteChange::Unchanged)
        }
        Some(previous) => {
            runner
                .run(Some(repo), &["remote", "set-url", name, url])
                .await?;
            info!(remote = name, %previous, %url, "remote retargeted");
            Ok(RemoteChange::Retargeted { previous })
        }
    }
}
