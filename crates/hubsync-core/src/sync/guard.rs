//! At most one operation in flight per local path.
//!
//! A second request for a busy path is rejected, never queued.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::{Result, SyncError};

/// Registry of paths with an operation in flight. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    paths: Arc<Mutex<HashSet<PathBuf>>>,
}

/// Releases its path when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    paths: Arc<Mutex<HashSet<PathBuf>>>,
    key: PathBuf,
}

fn lock(paths: &Mutex<HashSet<PathBuf>>) -> MutexGuard<'_, HashSet<PathBuf>> {
    paths.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Canonical form when the path exists, so `./a` and `/abs/a` collide.
fn key_for(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

impl InFlight {
    /// Claim `path` or fail immediately with [`SyncError::InProgress`].
    pub fn try_acquire(&self, path: &Path) -> Result<InFlightGuard> {
        let key = key_for(path);
        if !lock(&self.paths).insert(key.clone()) {
            debug!(path = %key.display(), "operation already in flight");
            return Err(SyncError::InProgress {
                path: path.to_path_buf(),
            });
        }
        Ok(InFlightGuard {
            paths: Arc::clone(&self.paths),
            key,
        })
    }

    pub fn is_busy(&self, path: &Path) -> bool {
        lock(&self.paths).contains(&key_for(path))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.paths).remove(&self.key);
    }
}
