//! Per-operation settings for the sync engine.

use std::time::Duration;

use crate::config::HubsyncConfig;
use crate::fs::LARGE_FILE_THRESHOLD;
use crate::git::lfs::default_patterns;
use crate::git::{DEFAULT_BRANCH, DEFAULT_COMMIT_MESSAGE, DEFAULT_PUSH_TIMEOUT, DEFAULT_REMOTE};

/// Which entry point is driving the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Publish a folder: initializes it when needed
    Upload,
    /// Push new work from an existing working copy
    Update,
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub mode: SyncMode,
    pub remote_name: String,
    /// Branch used when none is given and nothing is checked out
    pub default_branch: String,
    /// Message used when the target's message is blank
    pub default_commit_message: String,
    pub push_timeout: Duration,
    /// Paths relative to the project root that are never committed
    pub denylist: Vec<String>,
    /// Run the advisory large file survey
    pub scan: bool,
    pub large_file_threshold: u64,
    pub lfs_patterns: Vec<String>,
    /// Write a starter `.gitignore` on first-time initialization
    pub write_gitignore: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            mode: SyncMode::Upload,
            remote_name: DEFAULT_REMOTE.to_string(),
            default_branch: DEFAULT_BRANCH.to_string(),
            default_commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            push_timeout: DEFAULT_PUSH_TIMEOUT,
            denylist: Vec::new(),
            scan: true,
            large_file_threshold: LARGE_FILE_THRESHOLD,
            lfs_patterns: default_patterns(),
            write_gitignore: true,
        }
    }
}

impl SyncOptions {
    pub fn from_config(config: &HubsyncConfig) -> Self {
        Self {
            remote_name: config.remote_name.clone(),
            default_branch: config.default_branch.clone(),
            default_commit_message: config.default_commit_message.clone(),
            push_timeout: config.push_timeout,
            large_file_threshold: config.large_file_threshold_bytes,
            lfs_patterns: config.lfs_patterns.clone(),
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: SyncMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_denylist(mut self, denylist: Vec<String>) -> Self {
        self.denylist = denylist;
        self
    }

    pub fn with_push_timeout(mut self, timeout: Duration) -> Self {
        self.push_timeout = timeout;
        self
    }

    pub fn with_scan(mut self, scan: bool) -> Self {
        self.scan = scan;
        self
    }

    pub fn with_gitignore(mut self, write: bool) -> Self {
        self.write_gitignore = write;
        self
    }

    /// The target's message, or the configured default when blank.
    pub fn commit_message<'a>(&'a self, requested: &'a str) -> &'a str {
        match requested.trim() {
            "" => &self.default_commit_message,
            trimmed => trimmed,
        }
    }
}
