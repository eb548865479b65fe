//! Hosted repository service: contract, GitHub client and test double.

pub mod github;
pub mod mock;
mod traits;

pub use github::{DEFAULT_API_BASE, GitHubClient};
pub use mock::MockHosted;
pub use traits::{
    CreateRepoRequest, HostedError, HostedRepos, MAX_REPO_NAME_LEN, RepoLookup, Repository,
    validate_repo_name,
};
