//! The sync flow, shared by upload and update.

use std::path::Path;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::guard::InFlight;
use super::options::{SyncMode, SyncOptions};
use crate::error::{Result, SyncError};
use crate::fs::{ensure_starter_gitignore, format_size, join_scan, spawn_scan};
use crate::git::{
    self, CommitOutcome, GitRunner, LfsStatus, classify_directory, lfs, push, reconcile_remote,
    rename_current, resolve_branch, stage_and_commit,
};
use crate::types::{RepositoryState, SyncReport, SyncTarget};

/// Runs sync operations, at most one per local path at a time.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    runner: GitRunner,
    in_flight: InFlight,
}

impl SyncEngine {
    pub fn new(runner: GitRunner, in_flight: InFlight) -> Self {
        Self { runner, in_flight }
    }

    pub fn runner(&self) -> &GitRunner {
        &self.runner
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Run the sync on the current task.
    pub async fn run(&self, target: SyncTarget, options: SyncOptions) -> Result<SyncReport> {
        let _guard = self.in_flight.try_acquire(target.local_path())?;
        self.run_unguarded(&target, &options).await
    }

    /// Start the sync on a background task.
    ///
    /// The in-flight check happens before anything is spawned, so a second
    /// call for a busy path fails here with [`SyncError::InProgress`].
    pub fn spawn(
        &self,
        target: SyncTarget,
        options: SyncOptions,
    ) -> Result<JoinHandle<Result<SyncReport>>> {
        let guard = self.in_flight.try_acquire(target.local_path())?;
        let engine = self.clone();
        Ok(tokio::spawn(async move {
            let result = engine.run_unguarded(&target, &options).await;
            drop(guard);
            result
        }))
    }

    #[instrument(level = "info", skip_all, fields(path = %target.local_path.display(), mode = ?options.mode))]
    async fn run_unguarded(&self, target: &SyncTarget, options: &SyncOptions) -> Result<SyncReport> {
        let started_at = Utc::now();
        let repo = target.local_path();
        let runner = &self.runner;

        let state = classify_directory(repo)?;
        if options.mode == SyncMode::Update && state == RepositoryState::Uninitialized {
            return Err(SyncError::NotARepository {
                path: repo.to_path_buf(),
            });
        }
        let tool = runner.version().await?;
        debug!(git = %tool.git, ?state, "starting sync");

        let scan = options
            .scan
            .then(|| spawn_scan(repo.to_path_buf(), options.large_file_threshold));

        let lfs_status = match state {
            RepositoryState::Uninitialized => self.initialize(repo, options).await?,
            RepositoryState::Initialized => LfsStatus::Skipped,
        };
        let remote = reconcile_remote(runner, repo, &options.remote_name, &target.remote_url).await?;

        let survey = match scan {
            Some(handle) => join_scan(handle).await,
            None => None,
        };
        if let Some(survey) = &survey {
            warn_about_large_files(survey, &lfs_status);
        }

        let message = options.commit_message(&target.commit_message);
        let commit = stage_and_commit(runner, repo, message, &options.denylist).await?;
        let committed = commit == CommitOutcome::Committed;

        let branch = resolve_branch(
            runner,
            repo,
            target.branch_name.as_deref(),
            &options.default_branch,
        )
        .await?;
        if state == RepositoryState::Uninitialized && target.branch_name.is_some() {
            rename_current(runner, repo, &branch).await;
        }

        let (outcome, pushed, diagnostic) = match push::execute(
            runner,
            repo,
            &options.remote_name,
            &branch,
            committed,
            options.push_timeout,
        )
        .await
        {
            Ok(result) => (result.outcome, result.pushed, None),
            Err(err) => {
                warn!(error = %err, committed, "push stage failed");
                (err.outcome(), false, Some(err.to_string()))
            }
        };

        info!(%outcome, %branch, committed, pushed, "sync finished");
        Ok(SyncReport {
            state,
            outcome,
            diagnostic,
            branch,
            remote,
            lfs: lfs_status,
            committed,
            pushed,
            survey,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// First-time setup of a plain directory.
    async fn initialize(&self, repo: &Path, options: &SyncOptions) -> Result<LfsStatus> {
        let runner = &self.runner;
        git::init_repo(runner, repo).await?;
        info!(path = %repo.display(), "initialized repository");

        let lfs_status = lfs::bootstrap(runner, repo, &options.lfs_patterns).await;
        git::configure_large_push(runner, repo).await;

        if options.write_gitignore {
            let local: Vec<&str> = options.denylist.iter().map(String::as_str).collect();
            if ensure_starter_gitignore(repo, &local)? {
                debug!("wrote starter .gitignore");
            }
        }
        Ok(lfs_status)
    }
}

fn warn_about_large_files(survey: &crate::types::FileSurvey, lfs: &LfsStatus) {
    if !survey.has_large_files() {
        return;
    }
    for file in &survey.large_files {
        debug!(path = %file.path.display(), size = %format_size(file.size_bytes), "large file");
    }
    if matches!(lfs, LfsStatus::NotAvailable) {
        warn!(
            count = survey.large_files.len(),
            "large files found and git-lfs is not available; pushes may be rejected"
        );
    } else {
        info!(
            count = survey.large_files.len(),
            total = %format_size(survey.total_size_bytes),
            "large files found"
        );
    }
}
