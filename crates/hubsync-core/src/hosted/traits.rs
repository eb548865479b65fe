//! Contract for the hosted repository service.
//!
//! The sync engine only needs a clone URL; everything here is the thin
//! management surface around it (create, look up, list, delete, metadata).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::classify_status;
use crate::error::ErrorKind;

/// Longest repository name the service accepts.
pub const MAX_REPO_NAME_LEN: usize = 100;

/// Errors from hosted API calls.
#[derive(Debug, Clone, Error)]
pub enum HostedError {
    /// No token configured.
    #[error("authentication required: run `hubsync connect` first")]
    AuthRequired,

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid repository name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),
}

impl HostedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HostedError::AuthRequired | HostedError::AuthFailed(_) => ErrorKind::AuthFailure,
            HostedError::NotFound(_) => ErrorKind::NotFound,
            HostedError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            HostedError::InvalidName { .. } => ErrorKind::InvalidPath,
            HostedError::Timeout(_) => ErrorKind::Timeout,
            HostedError::Api { status, message } => classify_status(*status, message),
            HostedError::Network(_) => ErrorKind::Unknown,
        }
    }
}

/// Repository metadata as returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    /// `owner/name`
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
    pub clone_url: String,
    pub html_url: String,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Parameters for creating a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRepoRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub private: bool,
    /// Seed the repository with a README commit
    pub auto_init: bool,
}

impl CreateRepoRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            private: false,
            auto_init: false,
        }
    }
}

/// Typed answer to "does this repository exist?".
#[derive(Debug, Clone)]
pub enum RepoLookup {
    Found(Repository),
    NotFound,
    Error(HostedError),
}

impl RepoLookup {
    /// Turn the lookup into a result, treating absence as an error.
    pub fn into_result(self, name: &str) -> Result<Repository, HostedError> {
        match self {
            RepoLookup::Found(repo) => Ok(repo),
            RepoLookup::NotFound => Err(HostedError::NotFound(name.to_string())),
            RepoLookup::Error(err) => Err(err),
        }
    }
}

/// Hosted repository service.
///
/// Repository names are either bare (`project`, owned by the authenticated
/// user) or qualified (`owner/project`).
#[async_trait]
pub trait HostedRepos: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Login of the account behind the token.
    async fn authenticated_user(&self) -> Result<String, HostedError>;

    async fn create(&self, request: CreateRepoRequest) -> Result<Repository, HostedError>;

    async fn get(&self, name: &str) -> RepoLookup;

    /// Repositories of the authenticated user, most recently updated first.
    async fn list(&self) -> Result<Vec<Repository>, HostedError>;

    async fn delete(&self, name: &str) -> Result<(), HostedError>;

    async fn default_branch(&self, name: &str) -> Result<String, HostedError>;

    async fn topics(&self, name: &str) -> Result<Vec<String>, HostedError>;

    /// Raw README bytes, or `None` when the repository has no README.
    async fn readme(&self, name: &str) -> Result<Option<Vec<u8>>, HostedError>;
}

/// Check a repository name before asking the service to create it.
pub fn validate_repo_name(name: &str) -> Result<(), HostedError> {
    let invalid = |reason: &str| HostedError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.len() > MAX_REPO_NAME_LEN {
        return Err(invalid("name is longer than 100 characters"));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(invalid(&format!("character '{c}' is not allowed")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_names() {
        for name in ["project", "my-project", "my_project.rs", "A1"] {
            assert!(validate_repo_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_bad_names() {
        assert!(validate_repo_name("").is_err());
        assert!(validate_repo_name("has space").is_err());
        assert!(validate_repo_name("slash/name").is_err());
        assert!(validate_repo_name("caf\u{e9}").is_err());
        assert!(validate_repo_name(&"a".repeat(101)).is_err());
        assert!(validate_repo_name(&"a".repeat(100)).is_ok());
    }

    #[test]
    fn api_errors_classify_by_status() {
        let exists = HostedError::Api {
            status: 422,
            message: "name already exists on this account".into(),
        };
        assert_eq!(exists.kind(), ErrorKind::AlreadyExists);
        assert!(exists.kind().is_warning());

        let server = HostedError::Api {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(server.kind(), ErrorKind::Unknown);
        assert_eq!(HostedError::AuthRequired.kind(), ErrorKind::AuthFailure);
    }

    #[test]
    fn lookup_into_result() {
        assert!(matches!(
            RepoLookup::NotFound.into_result("x"),
            Err(HostedError::NotFound(name)) if name == "x"
        ));
    }
}
