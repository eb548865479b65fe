//! Error taxonomy for synchronization runs.
//!
//! Every failure that leaves the core is one of these variants. Failures
//! reported by the external tool or the hosted API carry their original
//! diagnostic text so callers can always show what actually happened.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::hosted::HostedError;
use crate::types::PushOutcome;

/// Stable category of a failure, independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidPath,
    ToolMissing,
    AuthFailure,
    NotFound,
    /// Warning: the desired thing is already there.
    AlreadyExists,
    Timeout,
    RemoteConflict,
    InProgress,
    Unknown,
}

impl ErrorKind {
    /// Warnings do not abort the operation that produced them.
    pub fn is_warning(self) -> bool {
        matches!(self, ErrorKind::AlreadyExists)
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("path does not exist or is not a directory: {}", path.display())]
    InvalidPath { path: PathBuf },

    #[error("required tool is not available: {tool}")]
    ToolMissing { tool: String },

    #[error("authentication failed: {raw}")]
    AuthFailure { raw: String },

    #[error("not found: {raw}")]
    NotFound { raw: String },

    #[error("already exists: {raw}")]
    AlreadyExists { raw: String },

    #[error("timed out ({raw}); local commits are intact and the operation can be retried")]
    Timeout {
        /// Our own deadline, when it was the one that fired
        after: Option<Duration>,
        raw: String,
    },

    #[error("rejected by remote: {raw}")]
    RemoteConflict { raw: String },

    #[error("{raw}")]
    Unknown { raw: String },

    #[error("an operation is already in progress for {}", path.display())]
    InProgress { path: PathBuf },

    #[error("not a git repository: {}", path.display())]
    NotARepository { path: PathBuf },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Hosted(#[from] HostedError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Build an error of the given kind around raw diagnostic text.
    ///
    /// Kinds that do not carry text (`InvalidPath`, `InProgress`) fall back
    /// to `Unknown` so the text is never dropped.
    pub fn from_kind(kind: ErrorKind, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match kind {
            ErrorKind::ToolMissing => SyncError::ToolMissing { tool: raw },
            ErrorKind::AuthFailure => SyncError::AuthFailure { raw },
            ErrorKind::NotFound => SyncError::NotFound { raw },
            ErrorKind::AlreadyExists => SyncError::AlreadyExists { raw },
            ErrorKind::RemoteConflict => SyncError::RemoteConflict { raw },
            ErrorKind::Timeout => SyncError::Timeout { after: None, raw },
            _ => SyncError::Unknown { raw },
        }
    }

    /// Our own wall-clock deadline expired.
    pub fn deadline(after: Duration) -> Self {
        SyncError::Timeout {
            after: Some(after),
            raw: format!("no response within {}s", after.as_secs()),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::InvalidPath { .. } | SyncError::NotARepository { .. } => {
                ErrorKind::InvalidPath
            }
            SyncError::ToolMissing { .. } => ErrorKind::ToolMissing,
            SyncError::AuthFailure { .. } => ErrorKind::AuthFailure,
            SyncError::NotFound { .. } => ErrorKind::NotFound,
            SyncError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            SyncError::Timeout { .. } => ErrorKind::Timeout,
            SyncError::RemoteConflict { .. } => ErrorKind::RemoteConflict,
            SyncError::InProgress { .. } => ErrorKind::InProgress,
            SyncError::Unknown { .. } | SyncError::Io { .. } => ErrorKind::Unknown,
            SyncError::Hosted(err) => err.kind(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.kind().is_warning()
    }

    /// A timed-out push leaves local history untouched and can be rerun.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Timeout | ErrorKind::InProgress)
    }

    /// Collapse this error into the push outcome vocabulary.
    pub fn outcome(&self) -> PushOutcome {
        match self.kind() {
            ErrorKind::Timeout => PushOutcome::Timeout,
            ErrorKind::AuthFailure => PushOutcome::AuthFailure,
            ErrorKind::NotFound => PushOutcome::NotFound,
            ErrorKind::AlreadyExists => PushOutcome::AlreadyExists,
            ErrorKind::RemoteConflict => PushOutcome::RemoteConflict,
            _ => match self {
                SyncError::Unknown { raw } => PushOutcome::Unknown(raw.clone()),
                other => PushOutcome::Unknown(other.to_string()),
            },
        }
    }

    /// A short hint for the most common failures.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self.kind() {
            ErrorKind::ToolMissing => Some("Install Git from https://git-scm.com/"),
            ErrorKind::AuthFailure => Some("Check your Git credentials and access token"),
            ErrorKind::NotFound => Some("Check the repository name and your permissions"),
            ErrorKind::Timeout => {
                Some("Retry the upload, or push very large files with the git command line")
            }
            ErrorKind::RemoteConflict => {
                Some("The remote has history you do not have locally; pull or merge it first")
            }
            ErrorKind::InProgress => Some("Wait for the running operation to finish"),
            _ => None,
        }
    }
}
