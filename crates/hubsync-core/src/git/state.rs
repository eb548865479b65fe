//! Directory classification: fresh directory or existing working copy.

use std::path::Path;

use crate::error::{Result, SyncError};
use crate::types::RepositoryState;

/// Name of the VCS metadata entry at the root of a working copy.
pub const GIT_METADATA: &str = ".git";

/// Decide whether `path` is already a git working copy.
///
/// Only the presence of `.git` directly under `path` counts; a parent
/// repository does not make a subdirectory initialized. `.git` may be a
/// directory or a gitfile (worktrees, submodules). No side effects.
pub fn classify_directory(path: &Path) -> Result<RepositoryState> {
    if !path.is_dir() {
        return Err(SyncError::InvalidPath {
            path: path.to_path_buf(),
        });
    }

    if path.join(GIT_METADATA).exists() {
        Ok(RepositoryState::Initialized)
    } else {
        Ok(RepositoryState::Uninitialized)
    }
}
