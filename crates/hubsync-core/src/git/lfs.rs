//! Large-blob (git-lfs) bootstrap for freshly initialized repositories.

use std::path::Path;

use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::runner::{GitRunner, parse_git_version};

/// Patterns tracked by default: archives, installers, media, disk images,
/// shared libraries and database files.
pub const LFS_PATTERNS: [&str; 22] = [
    "*.zip", "*.rar", "*.7z", "*.tar", "*.gz", "*.exe", "*.msi", "*.dmg", "*.pkg", "*.mp4",
    "*.avi", "*.mov", "*.mkv", "*.iso", "*.img", "*.bin", "*.dll", "*.so", "*.dylib", "*.db",
    "*.sqlite", "*.sqlite3",
];

/// Result of the large-blob bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LfsStatus {
    /// Tooling initialized; `skipped` lists patterns whose registration failed
    Installed {
        tracked: Vec<String>,
        skipped: Vec<String>,
    },
    /// Tooling is not installed; the sync proceeds without it
    NotAvailable,
    /// Bootstrap was not attempted (existing working copy)
    Skipped,
}

impl LfsStatus {
    pub fn is_installed(&self) -> bool {
        matches!(self, LfsStatus::Installed { .. })
    }
}

/// Version of the installed git-lfs, or `None` when it is absent.
pub async fn lfs_version(runner: &GitRunner, cwd: &Path) -> Option<Version> {
    match runner.output(Some(cwd), &["lfs", "version"]).await {
        Ok(out) if out.success() => parse_git_version(out.stdout_trimmed()),
        Ok(out) => {
            debug!(output = %out.combined(), "git-lfs probe failed");
            None
        }
        Err(err) => {
            debug!(error = %err, "git-lfs probe failed");
            None
        }
    }
}

/// Set up large-blob tracking in `repo`.
///
/// Never fails: missing tooling yields [`LfsStatus::NotAvailable`] and each
/// pattern that cannot be registered is recorded as skipped.
pub async fn bootstrap(runner: &GitRunner, repo: &Path, patterns: &[String]) -> LfsStatus {
    let Some(version) = lfs_version(runner, repo).await else {
        info!("git-lfs not available, large files will be committed as regular blobs");
        return LfsStatus::NotAvailable;
    };
    debug!(%version, "git-lfs detected");

    if let Err(err) = runner.run(Some(repo), &["lfs", "install", "--local"]).await {
        warn!(error = %err, "git lfs install failed");
        return LfsStatus::NotAvailable;
    }

    let mut tracked = Vec::new();
    let mut skipped = Vec::new();
    for pattern in patterns {
        match runner.run(Some(repo), &["lfs", "track", pattern]).await {
            Ok(_) => tracked.push(pattern.clone()),
            Err(err) => {
                debug!(%pattern, error = %err, "lfs track failed");
                skipped.push(pattern.clone());
            }
        }
    }

    info!(tracked = tracked.len(), skipped = skipped.len(), "git-lfs configured");
    LfsStatus::Installed { tracked, skipped }
}

/// The default pattern list as owned strings.
pub fn default_patterns() -> Vec<String> {
    LFS_PATTERNS.iter().map(|p| p.to_string()).collect()
}
