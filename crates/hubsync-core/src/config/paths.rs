//! Config path resolution helpers.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// File name used in both scopes.
pub const CONFIG_FILE_NAME: &str = "hubsync.toml";

/// Where a configuration layer lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigScope {
    /// Per-user configuration directory
    Global,
    /// Root of the project being synchronized
    Project,
}

pub fn config_path_for_scope(scope: ConfigScope, global_dir: &Path, project_root: &Path) -> PathBuf {
    match scope {
        ConfigScope::Global => global_dir.join(CONFIG_FILE_NAME),
        ConfigScope::Project => project_root.join(CONFIG_FILE_NAME),
    }
}

/// `<config dir>/hubsync`
pub fn global_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("hubsync"))
        .ok_or(ConfigError::NoConfigDir)
}
