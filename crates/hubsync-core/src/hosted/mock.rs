//! In-memory [`HostedRepos`] backed by local bare repositories.
//!
//! Every created repository is a real bare repository under a root
//! directory, so the sync engine can push to the returned clone URL exactly
//! as it would to a hosted one. `auto_init` seeds a README commit on `main`,
//! matching what the hosted service does.
//!
//! ```ignore
//! let hosted = MockHosted::new(tmp.path().join("remotes"), runner);
//! let mut request = CreateRepoRequest::new("demo");
//! request.auto_init = true;
//! let repo = hosted.create(request).await?;
//! // repo.clone_url is a local path that git can push to
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::traits::{
    CreateRepoRequest, HostedError, HostedRepos, RepoLookup, Repository, validate_repo_name,
};
use crate::git::{DEFAULT_BRANCH, GitRunner};

/// Login reported by [`MockHosted::authenticated_user`] unless overridden.
pub const MOCK_USER: &str = "mock-user";

#[derive(Debug, Clone)]
pub struct MockHosted {
    inner: Arc<Mutex<MockHostedInner>>,
    root: PathBuf,
    runner: GitRunner,
    user: String,
}

#[derive(Debug, Default)]
struct MockHostedInner {
    repos: BTreeMap<String, MockRepo>,
    fail_on: Option<FailOn>,
    operations: Vec<MockOperation>,
}

#[derive(Debug, Clone)]
struct MockRepo {
    repo: Repository,
    topics: Vec<String>,
}

/// Which operation should fail, and with what.
#[derive(Debug, Clone)]
pub enum FailOn {
    Create(HostedError),
    Get(HostedError),
    List(HostedError),
    Delete(HostedError),
}

/// Recorded call, for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Create { name: String, auto_init: bool },
    Get { name: String },
    List,
    Delete { name: String },
}

impl MockHosted {
    /// Bare repositories are created under `root`, which is created on demand.
    pub fn new(root: impl Into<PathBuf>, runner: GitRunner) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockHostedInner::default())),
            root: root.into(),
            runner,
            user: MOCK_USER.to_string(),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.state().fail_on = Some(fail_on);
        self
    }

    pub fn clear_fail_on(&self) {
        self.state().fail_on = None;
    }

    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    pub fn set_topics(&self, name: &str, topics: &[&str]) {
        if let Some(entry) = self.state().repos.get_mut(name) {
            entry.topics = topics.iter().map(|t| t.to_string()).collect();
        }
    }

    /// Location of the bare repository for `name`.
    pub fn bare_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.git"))
    }

    fn state(&self) -> MutexGuard<'_, MockHostedInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, op: MockOperation) {
        self.state().operations.push(op);
    }

    fn check_fail(&self, pick: impl Fn(&FailOn) -> Option<&HostedError>) -> Result<(), HostedError> {
        match self.state().fail_on.as_ref().and_then(pick) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn short_name<'a>(&self, name: &'a str) -> &'a str {
        match name.split_once('/') {
            Some((_, short)) => short,
            None => name,
        }
    }

    async fn git(&self, cwd: Option<&Path>, args: &[&str]) -> Result<String, HostedError> {
        self.runner
            .run(cwd, args)
            .await
            .map(|out| out.stdout_trimmed().to_string())
            .map_err(|err| HostedError::Api {
                status: 500,
                message: err.to_string(),
            })
    }

    /// Commit a README to `bare` through a throwaway working copy.
    async fn seed_readme(&self, bare: &Path, request: &CreateRepoRequest) -> Result<(), HostedError> {
        let seed = self.root.join(format!(".seed-{}", request.name));
        let io = |e: std::io::Error| HostedError::Network(e.to_string());
        std::fs::create_dir_all(&seed).map_err(io)?;

        let mut readme = format!("# {}\n", request.name);
        if let Some(description) = &request.description {
            readme.push('\n');
            readme.push_str(description);
            readme.push('\n');
        }
        std::fs::write(seed.join("README.md"), readme).map_err(io)?;

        let bare_arg = bare.display().to_string();
        self.git(Some(&seed), &["init", "-b", DEFAULT_BRANCH]).await?;
        self.git(Some(&seed), &["add", "README.md"]).await?;
        self.git(
            Some(&seed),
            &[
                "-c",
                "user.name=hubsync",
                "-c",
                "user.email=hubsync@localhost",
                "commit",
                "-m",
                "Initial commit",
            ],
        )
        .await?;
        self.git(Some(&seed), &["push", &bare_arg, DEFAULT_BRANCH]).await?;

        std::fs::remove_dir_all(&seed).map_err(io)?;
        Ok(())
    }
}

#[async_trait]
impl HostedRepos for MockHosted {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn authenticated_user(&self) -> Result<String, HostedError> {
        Ok(self.user.clone())
    }

    async fn create(&self, request: CreateRepoRequest) -> Result<Repository, HostedError> {
        self.record(MockOperation::Create {
            name: request.name.clone(),
            auto_init: request.auto_init,
        });
        self.check_fail(|f| match f {
            FailOn::Create(e) => Some(e),
            _ => None,
        })?;
        validate_repo_name(&request.name)?;
        if self.state().repos.contains_key(&request.name) {
            return Err(HostedError::AlreadyExists(
                "name already exists on this account".to_string(),
            ));
        }

        std::fs::create_dir_all(&self.root).map_err(|e| HostedError::Network(e.to_string()))?;
        let bare = self.bare_path(&request.name);
        let bare_arg = bare.display().to_string();
        self.git(None, &["init", "--bare", "-b", DEFAULT_BRANCH, &bare_arg])
            .await?;
        if request.auto_init {
            self.seed_readme(&bare, &request).await?;
        }

        let repo = Repository {
            name: request.name.clone(),
            full_name: format!("{}/{}", self.user, request.name),
            description: request.description.clone(),
            private: request.private,
            clone_url: bare_arg,
            html_url: format!("file://{}", bare.display()),
            default_branch: Some(DEFAULT_BRANCH.to_string()),
            language: None,
            updated_at: Some(Utc::now()),
        };
        self.state().repos.insert(
            request.name,
            MockRepo {
                repo: repo.clone(),
                topics: Vec::new(),
            },
        );
        Ok(repo)
    }

    async fn get(&self, name: &str) -> RepoLookup {
        self.record(MockOperation::Get {
            name: name.to_string(),
        });
        if let Err(err) = self.check_fail(|f| match f {
            FailOn::Get(e) => Some(e),
            _ => None,
        }) {
            return RepoLookup::Error(err);
        }
        match self.state().repos.get(self.short_name(name)) {
            Some(entry) => RepoLookup::Found(entry.repo.clone()),
            None => RepoLookup::NotFound,
        }
    }

    async fn list(&self) -> Result<Vec<Repository>, HostedError> {
        self.record(MockOperation::List);
        self.check_fail(|f| match f {
            FailOn::List(e) => Some(e),
            _ => None,
        })?;
        let mut repos: Vec<Repository> =
            self.state().repos.values().map(|e| e.repo.clone()).collect();
        repos.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(repos)
    }

    async fn delete(&self, name: &str) -> Result<(), HostedError> {
        self.record(MockOperation::Delete {
            name: name.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::Delete(e) => Some(e),
            _ => None,
        })?;
        let short = self.short_name(name).to_string();
        if self.state().repos.remove(&short).is_none() {
            return Err(HostedError::NotFound(name.to_string()));
        }
        let bare = self.bare_path(&short);
        if bare.exists() {
            std::fs::remove_dir_all(&bare).map_err(|e| HostedError::Network(e.to_string()))?;
        }
        Ok(())
    }

    async fn default_branch(&self, name: &str) -> Result<String, HostedError> {
        let repo = self.get(name).await.into_result(name)?;
        Ok(repo
            .default_branch
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string()))
    }

    async fn topics(&self, name: &str) -> Result<Vec<String>, HostedError> {
        match self.state().repos.get(self.short_name(name)) {
            Some(entry) => Ok(entry.topics.clone()),
            None => Err(HostedError::NotFound(name.to_string())),
        }
    }

    async fn readme(&self, name: &str) -> Result<Option<Vec<u8>>, HostedError> {
        let short = self.short_name(name).to_string();
        if !self.state().repos.contains_key(&short) {
            return Err(HostedError::NotFound(name.to_string()));
        }
        let bare = self.bare_path(&short);
        let out = self
            .runner
            .output(Some(&bare), &["show", "HEAD:README.md"])
            .await
            .map_err(|err| HostedError::Network(err.to_string()))?;
        Ok(out.success().then(|| out.stdout.into_bytes()))
    }
}
