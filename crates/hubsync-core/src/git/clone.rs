//! Clone a hosted repository into a local directory.

use std::path::{Path, PathBuf};

use tracing::info;

use super::runner::GitRunner;
use crate::error::{Result, SyncError};

/// `git clone <url> <dest>`.
///
/// `dest` must not exist yet, or be an empty directory; its parent must exist.
pub async fn clone_repo(runner: &GitRunner, url: &str, dest: &Path) -> Result<PathBuf> {
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !parent.is_dir() {
        return Err(SyncError::InvalidPath { path: parent });
    }
    if dest.exists() && !is_empty_dir(dest)? {
        return Err(SyncError::AlreadyExists {
            raw: format!("destination path '{}' already exists and is not empty", dest.display()),
        });
    }

    let dest_arg = dest.to_string_lossy();
    runner
        .run(None, &["clone", url, dest_arg.as_ref()])
        .await?;
    info!(%url, dest = %dest.display(), "cloned");
    Ok(dest.to_path_buf())
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    if !path.is_dir() {
        return Ok(false);
    }
    let mut entries = std::fs::read_dir(path).map_err(|err| SyncError::io(path, err))?;
    Ok(entries.next().is_none())
}
