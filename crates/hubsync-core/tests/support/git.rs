use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, bail};
use git2::{ObjectType, Repository, TreeWalkMode, TreeWalkResult};
use tempfile::TempDir;

use hubsync_core::git::GitRunner;
use hubsync_core::hosted::MockHosted;
use hubsync_core::sync::{InFlight, SyncEngine};

const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

const IDENTITY: [(&str, &str); 4] = [
    ("GIT_AUTHOR_NAME", "Test User"),
    ("GIT_AUTHOR_EMAIL", "test@example.com"),
    ("GIT_COMMITTER_NAME", "Test User"),
    ("GIT_COMMITTER_EMAIL", "test@example.com"),
];

/// Isolated HOME, remotes directory and projects for one test.
pub struct TestEnv {
    temp: TempDir,
    home: PathBuf,
    runner: GitRunner,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("tempdir should succeed");
        let home = temp.path().join("home");
        fs::create_dir_all(&home).expect("create_dir_all should succeed");

        let mut runner = GitRunner::new()
            .with_env("HOME", home.display().to_string())
            .with_env("GIT_CONFIG_NOSYSTEM", "1")
            .with_env("GIT_LFS_SKIP_PUSH", "1");
        for (key, value) in IDENTITY {
            runner = runner.with_env(key, value);
        }

        Self { temp, home, runner }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn runner(&self) -> GitRunner {
        self.runner.clone()
    }

    pub fn engine(&self) -> SyncEngine {
        SyncEngine::new(self.runner(), InFlight::default())
    }

    pub fn hosted(&self) -> MockHosted {
        MockHosted::new(self.root().join("remotes"), self.runner())
    }

    /// Empty project directory.
    pub fn project(&self, name: &str) -> PathBuf {
        let dir = self.root().join("projects").join(name);
        fs::create_dir_all(&dir).expect("create_dir_all should succeed");
        dir
    }

    /// Run git synchronously with the same isolation as the runner.
    pub fn git(&self, cwd: &Path, args: &[&str]) -> anyhow::Result<String> {
        let output = git_command()
            .env("HOME", &self.home)
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .envs(IDENTITY)
            .args(args)
            .current_dir(cwd)
            .output()
            .with_context(|| format!("failed to run git {args:?}"))?;
        if !output.status.success() {
            bail!(
                "git {args:?} failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

pub fn git_command() -> Command {
    let mut cmd = Command::new("git");
    for key in GIT_ENV_OVERRIDES {
        cmd.env_remove(key);
    }
    cmd
}

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create_dir_all should succeed");
    }
    fs::write(path, content).expect("write should succeed");
}

/// Files in the tree of `refname` (e.g. `refs/heads/main`), sorted.
pub fn files_at(repo_path: &Path, refname: &str) -> Vec<String> {
    let repo = Repository::open(repo_path).expect("open should succeed");
    let commit = repo
        .find_reference(refname)
        .and_then(|r| r.peel_to_commit())
        .expect("ref should resolve to a commit");
    let tree = commit.tree().expect("commit should have a tree");

    let mut files = Vec::new();
    tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
        if entry.kind() == Some(ObjectType::Blob) {
            files.push(format!("{dir}{}", entry.name().unwrap_or_default()));
        }
        TreeWalkResult::Ok
    })
    .expect("walk should succeed");
    files.sort();
    files
}

/// Commit id `refname` points at, if it exists.
pub fn ref_oid(repo_path: &Path, refname: &str) -> Option<String> {
    let repo = Repository::open(repo_path).ok()?;
    let oid = repo.refname_to_id(refname).ok()?;
    Some(oid.to_string())
}

/// Number of commits reachable from HEAD.
pub fn commit_count(repo_path: &Path) -> usize {
    let repo = Repository::open(repo_path).expect("open should succeed");
    let mut walk = repo.revwalk().expect("revwalk should succeed");
    walk.push_head().expect("push_head should succeed");
    walk.count()
}

/// Install a `pre-push` hook that stalls every push.
#[cfg(unix)]
pub fn stall_pushes(repo_path: &Path, seconds: u32) {
    use std::os::unix::fs::PermissionsExt;

    let hook = repo_path.join(".git").join("hooks").join("pre-push");
    fs::create_dir_all(hook.parent().expect("hook has a parent")).expect("create_dir_all should succeed");
    fs::write(&hook, format!("#!/bin/sh\nsleep {seconds}\n")).expect("write should succeed");
    fs::set_permissions(&hook, fs::Permissions::from_mode(0o755)).expect("chmod should succeed");
}

pub fn unstall_pushes(repo_path: &Path) {
    let hook = repo_path.join(".git").join("hooks").join("pre-push");
    let _ = fs::remove_file(hook);
}
