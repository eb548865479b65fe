//! Configuration schema for hubsync.toml
//!
//! Two layers share one file format:
//! - Global: ~/.config/hubsync/hubsync.toml (token, last folder, defaults)
//! - Project: ./hubsync.toml (per-project overrides)
//!
//! Every field is optional on disk. [`ConfigFile::merge`] layers project over
//! global and [`ConfigFile::resolve`] fills in defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::fs::LARGE_FILE_THRESHOLD;
use crate::git::lfs::default_patterns;
use crate::git::{DEFAULT_BRANCH, DEFAULT_COMMIT_MESSAGE, DEFAULT_PUSH_TIMEOUT, DEFAULT_REMOTE};
use crate::hosted::DEFAULT_API_BASE;

/// Per-request timeout for the hosted API.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// One layer of configuration, as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Personal access token for the hosted API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Folder used by the most recent upload or update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_folder: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_commit_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_file_threshold_bytes: Option<u64>,

    /// Replaces the built-in large-blob pattern list when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lfs_patterns: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_timeout_secs: Option<u64>,
}

impl ConfigFile {
    /// Layer `over` on top of `self`; set fields in `over` win.
    pub fn merge(self, over: ConfigFile) -> ConfigFile {
        ConfigFile {
            token: over.token.or(self.token),
            last_folder: over.last_folder.or(self.last_folder),
            remote_name: over.remote_name.or(self.remote_name),
            default_branch: over.default_branch.or(self.default_branch),
            default_commit_message: over.default_commit_message.or(self.default_commit_message),
            push_timeout_secs: over.push_timeout_secs.or(self.push_timeout_secs),
            large_file_threshold_bytes: over
                .large_file_threshold_bytes
                .or(self.large_file_threshold_bytes),
            lfs_patterns: over.lfs_patterns.or(self.lfs_patterns),
            api_base: over.api_base.or(self.api_base),
            http_timeout_secs: over.http_timeout_secs.or(self.http_timeout_secs),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if matches!(self.push_timeout_secs, Some(0)) {
            return Err(ConfigError::Invalid("push_timeout_secs must be positive".into()));
        }
        if matches!(self.http_timeout_secs, Some(0)) {
            return Err(ConfigError::Invalid("http_timeout_secs must be positive".into()));
        }
        if self.remote_name.as_deref().is_some_and(|r| r.trim().is_empty()) {
            return Err(ConfigError::Invalid("remote_name must not be empty".into()));
        }
        if self.default_branch.as_deref().is_some_and(|b| b.trim().is_empty()) {
            return Err(ConfigError::Invalid("default_branch must not be empty".into()));
        }
        Ok(())
    }

    /// Fill every unset field with its default.
    pub fn resolve(self) -> HubsyncConfig {
        HubsyncConfig {
            token: self.token.filter(|t| !t.trim().is_empty()),
            last_folder: self.last_folder,
            remote_name: self.remote_name.unwrap_or_else(|| DEFAULT_REMOTE.to_string()),
            default_branch: self
                .default_branch
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            default_commit_message: self
                .default_commit_message
                .unwrap_or_else(|| DEFAULT_COMMIT_MESSAGE.to_string()),
            push_timeout: self
                .push_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_PUSH_TIMEOUT),
            large_file_threshold_bytes: self
                .large_file_threshold_bytes
                .unwrap_or(LARGE_FILE_THRESHOLD),
            lfs_patterns: self.lfs_patterns.unwrap_or_else(default_patterns),
            api_base: self.api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            http_timeout: Duration::from_secs(
                self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
        }
    }
}

/// Effective configuration after layering and defaults.
#[derive(Clone, PartialEq, Eq)]
pub struct HubsyncConfig {
    pub token: Option<String>,
    pub last_folder: Option<PathBuf>,
    pub remote_name: String,
    pub default_branch: String,
    pub default_commit_message: String,
    pub push_timeout: Duration,
    pub large_file_threshold_bytes: u64,
    pub lfs_patterns: Vec<String>,
    pub api_base: String,
    pub http_timeout: Duration,
}

impl Default for HubsyncConfig {
    fn default() -> Self {
        ConfigFile::default().resolve()
    }
}

impl std::fmt::Debug for HubsyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubsyncConfig")
            .field("has_token", &self.token.is_some())
            .field("last_folder", &self.last_folder)
            .field("remote_name", &self.remote_name)
            .field("default_branch", &self.default_branch)
            .field("default_commit_message", &self.default_commit_message)
            .field("push_timeout", &self.push_timeout)
            .field("large_file_threshold_bytes", &self.large_file_threshold_bytes)
            .field("lfs_patterns", &self.lfs_patterns.len())
            .field("api_base", &self.api_base)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = HubsyncConfig::default();
        assert_eq!(config.remote_name, "origin");
        assert_eq!(config.default_branch, "main");
        assert_eq!(config.default_commit_message, "Update project");
        assert_eq!(config.push_timeout, Duration::from_secs(3600));
        assert_eq!(config.large_file_threshold_bytes, 100 * 1024 * 1024);
        assert_eq!(config.lfs_patterns.len(), 22);
        assert_eq!(config.api_base, "https://api.github.com");
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert!(config.token.is_none());
    }

    #[test]
    fn project_overrides_global() {
        let global = ConfigFile {
            token: Some("ghp_global".into()),
            default_branch: Some("main".into()),
            push_timeout_secs: Some(600),
            ..Default::default()
        };
        let project = ConfigFile {
            default_branch: Some("trunk".into()),
            ..Default::default()
        };

        let config = global.merge(project).resolve();
        assert_eq!(config.token.as_deref(), Some("ghp_global"));
        assert_eq!(config.default_branch, "trunk");
        assert_eq!(config.push_timeout, Duration::from_secs(600));
    }

    #[test]
    fn blank_token_is_none() {
        let config = ConfigFile {
            token: Some("  ".into()),
            ..Default::default()
        }
        .resolve();
        assert!(config.token.is_none());
    }

    #[test]
    fn zero_timeouts_are_invalid() {
        let file = ConfigFile {
            push_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(matches!(file.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn debug_hides_token() {
        let config = ConfigFile {
            token: Some("ghp_secret".into()),
            ..Default::default()
        }
        .resolve();
        assert!(!format!("{config:?}").contains("ghp_secret"));
    }
}
