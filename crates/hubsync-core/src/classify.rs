//! Maps raw diagnostics from git and the hosted API onto [`ErrorKind`].
//!
//! Matching is case-insensitive substring search over a fixed vocabulary of
//! phrases. Groups are checked in order, so a diagnostic that mentions both a
//! rejected push and a missing repository is reported by the first group that
//! matches. Anything unmatched is `Unknown`; callers keep the raw text.

use crate::error::{ErrorKind, SyncError};

const TOOL_MISSING: &[&str] = &[
    "is not a git command",
    "command not found",
    "git: not found",
    "no such file or directory (os error 2)",
];

const AUTH_FAILURE: &[&str] = &[
    "authentication failed",
    "could not read username",
    "could not read password",
    "invalid username or password",
    "permission denied (publickey)",
    "bad credentials",
    "requires authentication",
    "the requested url returned error: 403",
    "the requested url returned error: 401",
];

const TIMEOUT: &[&str] = &[
    "timed out",
    "timeout was reached",
    "operation too slow",
];

const REMOTE_CONFLICT: &[&str] = &[
    "[rejected]",
    "non-fast-forward",
    "fetch first",
    "updates were rejected",
    "failed to push some refs",
    "remote rejected",
];

const NOT_FOUND: &[&str] = &[
    "repository not found",
    "does not appear to be a git repository",
    "not a git repository",
    "no such remote",
    "could not find remote branch",
    "the requested url returned error: 404",
];

const ALREADY_EXISTS: &[&str] = &["already exists"];

const VOCABULARY: &[(ErrorKind, &[&str])] = &[
    (ErrorKind::ToolMissing, TOOL_MISSING),
    (ErrorKind::AuthFailure, AUTH_FAILURE),
    (ErrorKind::Timeout, TIMEOUT),
    (ErrorKind::RemoteConflict, REMOTE_CONFLICT),
    (ErrorKind::NotFound, NOT_FOUND),
    (ErrorKind::AlreadyExists, ALREADY_EXISTS),
];

/// Classify a diagnostic message.
pub fn classify(raw: &str) -> ErrorKind {
    let haystack = raw.to_lowercase();
    VOCABULARY
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| haystack.contains(p)))
        .map(|(kind, _)| *kind)
        .unwrap_or(ErrorKind::Unknown)
}

/// Classify an HTTP status from the hosted API, using the body to refine 422.
pub fn classify_status(status: u16, body: &str) -> ErrorKind {
    match status {
        401 | 403 => ErrorKind::AuthFailure,
        404 => ErrorKind::NotFound,
        408 | 504 => ErrorKind::Timeout,
        409 => ErrorKind::RemoteConflict,
        422 if body.to_lowercase().contains("already exists") => ErrorKind::AlreadyExists,
        _ => classify(body),
    }
}

/// Turn a failed tool invocation into a [`SyncError`], keeping the text.
pub fn classify_failure(raw: impl Into<String>) -> SyncError {
    let raw = raw.into();
    let kind = classify(&raw);
    SyncError::from_kind(kind, raw)
}
