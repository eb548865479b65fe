//! Configuration for the global and project scopes
//!
//! - Global: per-user settings, including the API token
//! - Project: overrides stored next to the synchronized files (never committed)

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

use std::path::PathBuf;

use thiserror::Error;

pub use parser::{parse_config, parse_config_str, to_toml};
pub use paths::{CONFIG_FILE_NAME, ConfigScope, config_path_for_scope, global_config_dir};
pub use schema::{ConfigFile, DEFAULT_HTTP_TIMEOUT_SECS, HubsyncConfig};
pub use store::ConfigStore;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the user configuration directory")]
    NoConfigDir,

    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config{}: {message}", path.as_ref().map(|p| format!(" {}", p.display())).unwrap_or_default())]
    Parse {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    #[error("invalid config value: {0}")]
    Invalid(String),
}
