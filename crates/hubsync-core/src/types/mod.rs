//! Shared data model for a single synchronization run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::git::{LfsStatus, RemoteChange};

/// What the caller wants synchronized, built fresh for every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    /// Local working directory to publish
    pub local_path: PathBuf,
    /// Clone URL of the hosted repository
    pub remote_url: String,
    /// Explicit branch name; authoritative when present
    pub branch_name: Option<String>,
    /// Commit message; blank falls back to the default message
    pub commit_message: String,
}

impl SyncTarget {
    pub fn new(local_path: impl Into<PathBuf>, remote_url: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            remote_url: remote_url.into(),
            branch_name: None,
            commit_message: String::new(),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        let trimmed = branch.trim();
        self.branch_name = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }
}

/// Whether a directory already carries VCS metadata.
///
/// Derived on every call and never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepositoryState {
    Uninitialized,
    Initialized,
}

/// A regular file larger than the scan threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Best-effort size survey of a working tree.
///
/// Advisory only: files that could not be inspected are silently missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSurvey {
    /// Files above the threshold, in walk order
    pub large_files: Vec<LargeFile>,
    /// Sum of the sizes of every inspected regular file
    pub total_size_bytes: u64,
}

impl FileSurvey {
    pub fn has_large_files(&self) -> bool {
        !self.large_files.is_empty()
    }
}

/// Final classification of a push attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PushOutcome {
    Success,
    NoOpNoChanges,
    Timeout,
    AuthFailure,
    NotFound,
    AlreadyExists,
    RemoteConflict,
    /// Unclassified failure with the original diagnostic text, verbatim.
    Unknown(String),
}

impl PushOutcome {
    /// True for outcomes that leave the remote in the desired state.
    pub fn is_success(&self) -> bool {
        matches!(self, PushOutcome::Success | PushOutcome::NoOpNoChanges)
    }
}

impl std::fmt::Display for PushOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PushOutcome::Success => write!(f, "success"),
            PushOutcome::NoOpNoChanges => write!(f, "no changes"),
            PushOutcome::Timeout => write!(f, "timed out"),
            PushOutcome::AuthFailure => write!(f, "authentication failed"),
            PushOutcome::NotFound => write!(f, "not found"),
            PushOutcome::AlreadyExists => write!(f, "already exists"),
            PushOutcome::RemoteConflict => write!(f, "rejected by remote"),
            PushOutcome::Unknown(raw) => write!(f, "failed: {raw}"),
        }
    }
}

/// Everything a caller needs to present the result of one sync run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// State of the directory before the run touched it
    pub state: RepositoryState,
    pub outcome: PushOutcome,
    /// Full diagnostic when the push stage failed
    pub diagnostic: Option<String>,
    /// Branch that was (or would have been) pushed
    pub branch: String,
    pub remote: RemoteChange,
    pub lfs: LfsStatus,
    /// Whether a new commit was created
    pub committed: bool,
    /// Whether a `git push` ran to completion
    pub pushed: bool,
    /// Advisory survey, when one was requested and completed
    pub survey: Option<FileSurvey>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    /// Large files that will go into history as regular blobs.
    ///
    /// Non-empty only when the survey flagged files and large-blob tooling
    /// was not set up by this run.
    pub fn untracked_large_files(&self) -> &[LargeFile] {
        match (&self.survey, &self.lfs) {
            (Some(survey), LfsStatus::NotAvailable) => &survey.large_files,
            _ => &[],
        }
    }
}
