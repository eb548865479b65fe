//! Application context passed explicitly into every core operation.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{CONFIG_FILE_NAME, ConfigError, ConfigStore, HubsyncConfig};
use crate::git::GitRunner;
use crate::hosted::{GitHubClient, HostedError, HostedRepos};
use crate::sync::{InFlight, SyncEngine, SyncOptions};

/// Shared services and settings for one process.
///
/// Frontends build this once and hand it to commands; nothing in the core
/// reads tokens or settings from anywhere else.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: HubsyncConfig,
    token: Option<String>,
    runner: GitRunner,
    store: Option<ConfigStore>,
    in_flight: InFlight,
}

impl AppContext {
    pub fn new(config: HubsyncConfig, runner: GitRunner) -> Self {
        let token = config.token.clone();
        Self {
            config,
            token,
            runner,
            store: None,
            in_flight: InFlight::default(),
        }
    }

    /// Load the layered configuration from `store` and keep the store for saving.
    pub fn from_store(store: &ConfigStore) -> Result<Self, ConfigError> {
        let config = store.load()?;
        let mut ctx = Self::new(config, GitRunner::new());
        ctx.store = Some(store.clone());
        Ok(ctx)
    }

    /// Override the configured token (e.g. from the command line).
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = Some(token.trim().to_string()).filter(|t| !t.is_empty());
        self
    }

    pub fn with_runner(mut self, runner: GitRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn config(&self) -> &HubsyncConfig {
        &self.config
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn runner(&self) -> &GitRunner {
        &self.runner
    }

    pub fn store(&self) -> Option<&ConfigStore> {
        self.store.as_ref()
    }

    /// Paths that must never be committed: the project-scope config file.
    pub fn denylist(&self) -> Vec<String> {
        vec![CONFIG_FILE_NAME.to_string()]
    }

    /// GitHub client for the configured API base and token.
    pub fn hosted(&self) -> Result<Arc<dyn HostedRepos>, HostedError> {
        let client = GitHubClient::new(
            self.token.clone(),
            self.config.api_base.clone(),
            self.config.http_timeout,
        )?;
        Ok(Arc::new(client))
    }

    /// Sync options seeded from configuration.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions::from_config(&self.config).with_denylist(self.denylist())
    }

    /// Engine sharing this context's runner and in-flight registry.
    pub fn sync_engine(&self) -> SyncEngine {
        SyncEngine::new(self.runner.clone(), self.in_flight.clone())
    }

    /// Remember `folder` as the last used one, when a store is attached.
    pub fn remember_folder(&self, folder: PathBuf) -> Result<(), ConfigError> {
        match &self.store {
            Some(store) => store.save_last_folder(&folder),
            None => Ok(()),
        }
    }
}
