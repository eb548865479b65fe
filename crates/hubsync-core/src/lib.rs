//! Hubsync Core Library
//!
//! Publishes a local project folder to a hosted git repository: first-time
//! initialization, remote reconciliation, large-blob setup, idempotent
//! commits and a bounded push with classified failures.

pub mod classify;
pub mod config;
pub mod context;
pub mod error;
pub mod fs;
pub mod git;
pub mod hosted;
pub mod sync;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigError, ConfigScope, ConfigStore, HubsyncConfig};
    pub use crate::context::AppContext;

    // Errors
    pub use crate::error::{ErrorKind, Result, SyncError};

    // Git
    pub use crate::git::{GitRunner, LfsStatus, RemoteChange, ToolInfo};

    // Hosted API
    pub use crate::hosted::{
        CreateRepoRequest, GitHubClient, HostedError, HostedRepos, RepoLookup, Repository,
    };

    // Sync
    pub use crate::sync::{SyncEngine, SyncMode, SyncOptions};
    pub use crate::types::{FileSurvey, LargeFile, PushOutcome, RepositoryState, SyncReport, SyncTarget};
}
