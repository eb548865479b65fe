//! Invokes the system `git` binary.
//!
//! Every call captures stdout and stderr, never inherits stdin, and never
//! lets git prompt on the terminal. A call that cannot spawn the binary at
//! all is reported as [`SyncError::ToolMissing`].

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use semver::Version;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::classify::classify_failure;
use crate::error::{Result, SyncError};

/// Repository-location variables that would redirect git away from `cwd`.
const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

/// Captured result of a single git invocation.
#[derive(Debug, Clone)]
pub struct GitOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Trimmed stdout, the usual payload of query commands.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// stderr followed by stdout, both trimmed, for classification.
    pub fn combined(&self) -> String {
        let stderr = self.stderr.trim();
        let stdout = self.stdout.trim();
        match (stderr.is_empty(), stdout.is_empty()) {
            (false, false) => format!("{stderr}\n{stdout}"),
            (false, true) => stderr.to_string(),
            (true, false) => stdout.to_string(),
            (true, true) => format!("git exited with {}", self.status),
        }
    }
}

/// Versions reported by the installed tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub git: Version,
}

/// Runs git with a fixed program path and extra environment.
#[derive(Debug, Clone)]
pub struct GitRunner {
    program: PathBuf,
    envs: Vec<(String, String)>,
}

impl Default for GitRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl GitRunner {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
            envs: Vec::new(),
        }
    }

    /// Use a specific git executable instead of the one on `PATH`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Add an environment variable to every invocation.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, cwd: Option<&Path>, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        for key in GIT_ENV_OVERRIDES {
            cmd.env_remove(key);
        }
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, err: std::io::Error, cwd: Option<&Path>) -> SyncError {
        match err.kind() {
            std::io::ErrorKind::NotFound if cwd.is_some_and(|dir| !dir.is_dir()) => {
                SyncError::InvalidPath {
                    path: cwd.map(Path::to_path_buf).unwrap_or_default(),
                }
            }
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                SyncError::ToolMissing {
                    tool: self.program.display().to_string(),
                }
            }
            _ => SyncError::Unknown {
                raw: format!("failed to run {}: {err}", self.program.display()),
            },
        }
    }

    /// Run git and return its output whatever the exit status.
    #[instrument(level = "debug", skip(self), fields(program = %self.program.display()))]
    pub async fn output(&self, cwd: Option<&Path>, args: &[&str]) -> Result<GitOutput> {
        let output = self
            .command(cwd, args)
            .output()
            .await
            .map_err(|err| self.spawn_error(err, cwd))?;

        let output = GitOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(code = ?output.code(), "git finished");
        Ok(output)
    }

    /// Like [`output`](Self::output) but gives up after `limit`.
    ///
    /// The child process is killed when the deadline fires.
    #[instrument(level = "debug", skip(self), fields(program = %self.program.display()))]
    pub async fn output_with_timeout(
        &self,
        cwd: Option<&Path>,
        args: &[&str],
        limit: Duration,
    ) -> Result<GitOutput> {
        match tokio::time::timeout(limit, self.output(cwd, args)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(limit_secs = limit.as_secs(), "git deadline expired");
                Err(SyncError::deadline(limit))
            }
        }
    }

    /// Run git and classify any non-zero exit.
    pub async fn run(&self, cwd: Option<&Path>, args: &[&str]) -> Result<GitOutput> {
        let output = self.output(cwd, args).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(classify_failure(output.combined()))
        }
    }

    /// Probe `git --version`.
    pub async fn version(&self) -> Result<ToolInfo> {
        let output = self.run(None, &["--version"]).await?;
        let git = parse_git_version(output.stdout_trimmed()).ok_or_else(|| SyncError::Unknown {
            raw: format!("unexpected git version output: {}", output.stdout_trimmed()),
        })?;
        Ok(ToolInfo { git })
    }
}

/// Parse the output of `git --version` (or `git lfs version`).
///
/// Vendor suffixes such as `.windows.1` or ` (Apple Git-146)` are ignored.
pub fn parse_git_version(output: &str) -> Option<Version> {
    let first = output.split_whitespace().next()?;
    let token = match first.split_once('/') {
        Some((_, version)) => version,
        None => output
            .split_whitespace()
            .find(|word| word.chars().next().is_some_and(|c| c.is_ascii_digit()))?,
    };

    let mut parts = token
        .split(|c: char| c == '.' || c == '-')
        .map(|part| part.parse::<u64>());
    let major = parts.next()?.ok()?;
    let minor = parts.next().and_then(|p| p.ok()).unwrap_or(0);
    let patch = parts.next().and_then(|p| p.ok()).unwrap_or(0);
    Some(Version::new(major, minor, patch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_version() {
        assert_eq!(
            parse_git_version("git version 2.39.2"),
            Some(Version::new(2, 39, 2))
        );
    }

    #[test]
    fn parses_vendor_versions() {
        assert_eq!(
            parse_git_version("git version 2.43.0.windows.1"),
            Some(Version::new(2, 43, 0))
        );
        assert_eq!(
            parse_git_version("git version 2.39.3 (Apple Git-146)"),
            Some(Version::new(2, 39, 3))
        );
    }

    #[test]
    fn parses_lfs_version() {
        assert_eq!(
            parse_git_version("git-lfs/3.4.1 (GitHub; linux amd64; go 1.21.5)"),
            Some(Version::new(3, 4, 1))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_git_version("hello world"), None);
    }

    #[tokio::test]
    async fn missing_program_is_tool_missing() {
        let runner = GitRunner::new().with_program("/definitely/not/a/git/binary");
        let err = runner.output(None, &["--version"]).await.unwrap_err();
        assert!(matches!(err, SyncError::ToolMissing { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn combined_output_prefers_stderr_first() {
        let runner = GitRunner::new();
        let out = runner
            .output(None, &["definitely-not-a-subcommand"])
            .await
            .unwrap();
        assert!(!out.success());
        assert!(out.combined().contains("is not a git command"));
    }
}
