//! Tests for the git module, run against the real git binary.

use super::*;
use crate::error::SyncError;
use crate::types::RepositoryState;
use std::path::PathBuf;
use tempfile::TempDir;

fn runner_for(home: &Path) -> GitRunner {
    GitRunner::new()
        .with_env("HOME", home.display().to_string())
        .with_env("GIT_CONFIG_NOSYSTEM", "1")
        .with_env("GIT_AUTHOR_NAME", "Test User")
        .with_env("GIT_AUTHOR_EMAIL", "test@example.com")
        .with_env("GIT_COMMITTER_NAME", "Test User")
        .with_env("GIT_COMMITTER_EMAIL", "test@example.com")
}

struct Sandbox {
    _tmp: TempDir,
    runner: GitRunner,
    work: PathBuf,
    root: PathBuf,
}

impl Sandbox {
    async fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_path_buf();
        let home = root.join("home");
        let work = root.join("work");
        std::fs::create_dir_all(&home).unwrap();
        std::fs::create_dir_all(&work).unwrap();
        let runner = runner_for(&home);
        runner
            .run(Some(&work), &["init", "-b", "main"])
            .await
            .unwrap();
        Self {
            _tmp: tmp,
            runner,
            work,
            root,
        }
    }

    async fn bare(&self, name: &str) -> String {
        let path = self.root.join(name);
        let path_arg = path.display().to_string();
        self.runner
            .run(None, &["init", "--bare", "-b", "main", &path_arg])
            .await
            .unwrap();
        path_arg
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.work.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    async fn git(&self, args: &[&str]) -> String {
        self.runner
            .run(Some(&self.work), args)
            .await
            .unwrap()
            .stdout_trimmed()
            .to_string()
    }
}

mod remote_tests {
    use super::*;

    #[tokio::test]
    async fn reconcile_is_idempotent() {
        let sb = Sandbox::new().await;
        let url = "https://github.com/octo/project.git";

        let first = reconcile_remote(&sb.runner, &sb.work, "origin", url).await.unwrap();
        let second = reconcile_remote(&sb.runner, &sb.work, "origin", url).await.unwrap();

        assert_eq!(first, RemoteChange::Added);
        assert_eq!(second, RemoteChange::Unchanged);
        assert_eq!(sb.git(&["remote", "get-url", "origin"]).await, url);
    }

    #[tokio::test]
    async fn reconcile_retargets_different_url() {
        let sb = Sandbox::new().await;
        sb.git(&["remote", "add", "origin", "https://example.com/old.git"])
            .await;

        let change = reconcile_remote(&sb.runner, &sb.work, "origin", "https://example.com/new.git")
            .await
            .unwrap();

        assert_eq!(
            change,
            RemoteChange::Retargeted {
                previous: "https://example.com/old.git".to_string()
            }
        );
        assert_eq!(
            sb.git(&["remote", "get-url", "origin"]).await,
            "https://example.com/new.git"
        );
    }

    #[tokio::test]
    async fn trailing_slash_is_not_a_difference() {
        let sb = Sandbox::new().await;
        sb.git(&["remote", "add", "origin", "https://example.com/repo/"])
            .await;

        let change = reconcile_remote(&sb.runner, &sb.work, "origin", "https://example.com/repo")
            .await
            .unwrap();
        assert_eq!(change, RemoteChange::Unchanged);
    }

    #[test]
    fn urls_match_ignores_trailing_slashes() {
        assert!(urls_match("https://a/b/", "https://a/b"));
        assert!(!urls_match("https://a/b", "https://a/c"));
    }
}

mod stage_tests {
    use super::*;

    #[tokio::test]
    async fn first_commit_then_noop() {
        let sb = Sandbox::new().await;
        sb.write("README.md", "# hello\n");

        let first = stage_and_commit(&sb.runner, &sb.work, "Initial commit", &[])
            .await
            .unwrap();
        let second = stage_and_commit(&sb.runner, &sb.work, "again", &[])
            .await
            .unwrap();

        assert_eq!(first, CommitOutcome::Committed);
        assert_eq!(second, CommitOutcome::NoChanges);
        assert_eq!(sb.git(&["rev-list", "--count", "HEAD"]).await, "1");
    }

    #[tokio::test]
    async fn empty_tree_has_nothing_to_commit() {
        let sb = Sandbox::new().await;
        let outcome = stage_and_commit(&sb.runner, &sb.work, "", &[]).await.unwrap();
        assert_eq!(outcome, CommitOutcome::NoChanges);
    }

    #[tokio::test]
    async fn blank_message_uses_default() {
        let sb = Sandbox::new().await;
        sb.write("a.txt", "a");

        stage_and_commit(&sb.runner, &sb.work, "   ", &[]).await.unwrap();
        assert_eq!(
            sb.git(&["log", "-1", "--format=%s"]).await,
            DEFAULT_COMMIT_MESSAGE
        );
    }

    #[tokio::test]
    async fn denylisted_file_is_never_committed() {
        let sb = Sandbox::new().await;
        sb.write("src/lib.rs", "pub fn f() {}\n");
        sb.write("hubsync.toml", "token = \"secret\"\n");

        let deny = vec!["hubsync.toml".to_string()];
        stage_and_commit(&sb.runner, &sb.work, "Initial commit", &deny)
            .await
            .unwrap();

        let files = sb.git(&["ls-tree", "-r", "--name-only", "HEAD"]).await;
        assert!(files.lines().any(|f| f == "src/lib.rs"));
        assert!(!files.lines().any(|f| f == "hubsync.toml"));
    }

    #[tokio::test]
    async fn only_denylisted_changes_are_a_noop() {
        let sb = Sandbox::new().await;
        sb.write("README.md", "x");
        let deny = vec!["hubsync.toml".to_string()];
        stage_and_commit(&sb.runner, &sb.work, "one", &deny).await.unwrap();

        sb.write("hubsync.toml", "token = \"changed\"\n");
        let outcome = stage_and_commit(&sb.runner, &sb.work, "two", &deny)
            .await
            .unwrap();
        assert_eq!(outcome, CommitOutcome::NoChanges);
    }
}

mod branch_tests {
    use super::*;

    #[tokio::test]
    async fn explicit_branch_wins() {
        let sb = Sandbox::new().await;
        let branch = resolve_branch(&sb.runner, &sb.work, Some(" release "), "main")
            .await
            .unwrap();
        assert_eq!(branch, "release");
    }

    #[tokio::test]
    async fn unborn_branch_falls_back() {
        let sb = Sandbox::new().await;
        assert_eq!(current_branch(&sb.runner, &sb.work).await.unwrap(), None);
        let branch = resolve_branch(&sb.runner, &sb.work, None, "trunk")
            .await
            .unwrap();
        assert_eq!(branch, "trunk");
    }

    #[tokio::test]
    async fn current_branch_after_commit_and_rename() {
        let sb = Sandbox::new().await;
        sb.write("a.txt", "a");
        stage_and_commit(&sb.runner, &sb.work, "c", &[]).await.unwrap();
        assert_eq!(
            current_branch(&sb.runner, &sb.work).await.unwrap().as_deref(),
            Some("main")
        );

        assert!(rename_current(&sb.runner, &sb.work, "develop").await);
        let branch = resolve_branch(&sb.runner, &sb.work, None, "main")
            .await
            .unwrap();
        assert_eq!(branch, "develop");
    }
}

mod push_tests {
    use super::*;
    use crate::types::PushOutcome;
    use std::time::Duration;

    #[tokio::test]
    async fn probe_sees_branch_after_push() {
        let sb = Sandbox::new().await;
        let url = sb.bare("remote.git").await;
        reconcile_remote(&sb.runner, &sb.work, "origin", &url).await.unwrap();
        sb.write("a.txt", "a");
        stage_and_commit(&sb.runner, &sb.work, "c", &[]).await.unwrap();

        let before = push::probe_remote_branch(&sb.runner, &sb.work, "origin", "main")
            .await
            .unwrap();
        assert_eq!(before, RemoteBranch::Absent);

        let result = push::execute(&sb.runner, &sb.work, "origin", "main", true, DEFAULT_PUSH_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(result.outcome, PushOutcome::Success);
        assert!(result.pushed);

        let head = sb.git(&["rev-parse", "HEAD"]).await;
        let after = push::probe_remote_branch(&sb.runner, &sb.work, "origin", "main")
            .await
            .unwrap();
        assert_eq!(after, RemoteBranch::Present(head));
    }

    #[tokio::test]
    async fn up_to_date_branch_is_not_pushed() {
        let sb = Sandbox::new().await;
        let url = sb.bare("remote.git").await;
        reconcile_remote(&sb.runner, &sb.work, "origin", &url).await.unwrap();
        sb.write("a.txt", "a");
        stage_and_commit(&sb.runner, &sb.work, "c", &[]).await.unwrap();
        push::execute(&sb.runner, &sb.work, "origin", "main", true, DEFAULT_PUSH_TIMEOUT)
            .await
            .unwrap();

        let again = push::execute(&sb.runner, &sb.work, "origin", "main", false, DEFAULT_PUSH_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(again.outcome, PushOutcome::NoOpNoChanges);
        assert!(!again.pushed);
    }

    #[tokio::test]
    async fn failed_probe_is_an_error_not_a_first_push() {
        let sb = Sandbox::new().await;
        let missing = sb.root.join("missing.git").display().to_string();
        reconcile_remote(&sb.runner, &sb.work, "origin", &missing)
            .await
            .unwrap();

        let err = push::probe_remote_branch(&sb.runner, &sb.work, "origin", "main")
            .await
            .unwrap_err();
        assert!(
            matches!(err, SyncError::NotFound { .. } | SyncError::Unknown { .. }),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn rejected_push_is_remote_conflict() {
        let sb = Sandbox::new().await;
        let url = sb.bare("remote.git").await;

        // Another clone publishes unrelated history first.
        let other = sb.root.join("other");
        let other_arg = other.display().to_string();
        sb.runner.run(None, &["clone", &url, &other_arg]).await.unwrap();
        std::fs::write(other.join("theirs.txt"), "theirs").unwrap();
        sb.runner.run(Some(&other), &["add", "-A"]).await.unwrap();
        sb.runner
            .run(Some(&other), &["commit", "-m", "theirs"])
            .await
            .unwrap();
        sb.runner
            .run(Some(&other), &["push", "origin", "HEAD:main"])
            .await
            .unwrap();

        reconcile_remote(&sb.runner, &sb.work, "origin", &url).await.unwrap();
        sb.write("ours.txt", "ours");
        stage_and_commit(&sb.runner, &sb.work, "ours", &[]).await.unwrap();

        let err = push::push_branch(&sb.runner, &sb.work, "origin", "main", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::RemoteConflict { .. }), "{err:?}");
        assert_eq!(err.outcome(), PushOutcome::RemoteConflict);
    }
}

mod state_tests {
    use super::*;

    #[tokio::test]
    async fn init_makes_directory_initialized() {
        let tmp = TempDir::new().unwrap();
        let runner = runner_for(tmp.path());
        let dir = tmp.path().join("project");
        std::fs::create_dir(&dir).unwrap();

        assert_eq!(classify_directory(&dir).unwrap(), RepositoryState::Uninitialized);
        init_repo(&runner, &dir).await.unwrap();
        assert_eq!(classify_directory(&dir).unwrap(), RepositoryState::Initialized);

        configure_large_push(&runner, &dir).await;
        let buffer = runner
            .run(Some(&dir), &["config", "--get", "http.postBuffer"])
            .await
            .unwrap();
        assert_eq!(buffer.stdout_trimmed(), HTTP_BUFFER_BYTES);
    }

    #[tokio::test]
    async fn lfs_bootstrap_never_fails() {
        let sb = Sandbox::new().await;
        let patterns = lfs::default_patterns();
        match lfs::bootstrap(&sb.runner, &sb.work, &patterns).await {
            LfsStatus::Installed { tracked, skipped } => {
                assert_eq!(tracked.len() + skipped.len(), LFS_PATTERNS.len());
                let attrs = std::fs::read_to_string(sb.work.join(".gitattributes")).unwrap();
                assert!(attrs.contains("*.zip"));
            }
            LfsStatus::NotAvailable => {}
            LfsStatus::Skipped => panic!("bootstrap never reports Skipped"),
        }
    }

    /// Executable stand-in for git. `lfs` subcommands are answered by the
    /// `handler` case arms, everything else goes to the real binary.
    #[cfg(unix)]
    fn git_shim(dir: &Path, handler: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("git-shim");
        let body = format!(
            "#!/bin/sh\nif [ \"$1\" = \"lfs\" ]; then\n  case \"$2\" in\n{handler}\n  esac\nfi\nexec git \"$@\"\n"
        );
        std::fs::write(&script, body).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn lfs_pattern_that_fails_to_track_is_skipped() {
        let sb = Sandbox::new().await;
        let handler = r#"    version) echo "git-lfs/3.4.1 (GitHub; linux amd64; go 1.21.5)"; exit 0 ;;
    install) exit 0 ;;
    track)
      if [ "$3" = "*.iso" ]; then echo "fatal: could not track $3" >&2; exit 1; fi
      printf '%s filter=lfs diff=lfs merge=lfs -text\n' "$3" >> .gitattributes
      exit 0 ;;"#;
        let runner = runner_for(&sb.root.join("home")).with_program(git_shim(&sb.root, handler));

        let status = lfs::bootstrap(&runner, &sb.work, &lfs::default_patterns()).await;

        let LfsStatus::Installed { tracked, skipped } = status else {
            panic!("expected Installed, got {status:?}");
        };
        assert_eq!(skipped, vec!["*.iso".to_string()]);
        assert_eq!(tracked.len(), LFS_PATTERNS.len() - 1);
        assert!(!tracked.contains(&"*.iso".to_string()));
        assert!(tracked.contains(&"*.zip".to_string()));
        assert!(tracked.contains(&"*.sqlite3".to_string()));

        let attrs = std::fs::read_to_string(sb.work.join(".gitattributes")).unwrap();
        assert!(attrs.contains("*.zip filter=lfs"));
        assert!(!attrs.contains("*.iso"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn lfs_install_failure_reports_not_available() {
        let sb = Sandbox::new().await;
        let handler = r#"    version) echo "git-lfs/3.4.1"; exit 0 ;;
    *) echo "fatal: hooks directory is not writable" >&2; exit 2 ;;"#;
        let runner = runner_for(&sb.root.join("home")).with_program(git_shim(&sb.root, handler));

        let status = lfs::bootstrap(&runner, &sb.work, &lfs::default_patterns()).await;
        assert_eq!(status, LfsStatus::NotAvailable);
    }
}

mod clone_tests {
    use super::*;

    #[tokio::test]
    async fn clone_refuses_non_empty_destination() {
        let sb = Sandbox::new().await;
        let url = sb.bare("remote.git").await;
        let err = clone_repo(&sb.runner, &url, &sb.work).await.unwrap_err();
        assert!(matches!(err, SyncError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn clone_creates_working_copy() {
        let sb = Sandbox::new().await;
        let url = sb.bare("remote.git").await;
        let dest = sb.root.join("copy");

        let path = clone_repo(&sb.runner, &url, &dest).await.unwrap();
        assert_eq!(classify_directory(&path).unwrap(), RepositoryState::Initialized);
        let bound = remote::remote_url(&sb.runner, &path, "origin")
            .await
            .unwrap()
            .unwrap();
        assert!(urls_match(&bound, &url));
    }
}
