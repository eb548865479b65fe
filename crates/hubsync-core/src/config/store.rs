//! Config store for loading and saving hubsync.toml.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::paths::{ConfigScope, config_path_for_scope, global_config_dir};
use super::schema::{ConfigFile, HubsyncConfig};
use super::{ConfigError, parser};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    global_dir: PathBuf,
    project_root: PathBuf,
}

impl ConfigStore {
    /// Store for the per-user config dir and the given project.
    pub fn for_project(project_root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self::from_paths(global_config_dir()?, project_root.into()))
    }

    pub fn from_paths(global_dir: PathBuf, project_root: PathBuf) -> Self {
        Self {
            global_dir,
            project_root,
        }
    }

    pub fn global_dir(&self) -> &Path {
        &self.global_dir
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn config_path(&self, scope: ConfigScope) -> PathBuf {
        config_path_for_scope(scope, &self.global_dir, &self.project_root)
    }

    /// Same store pointed at a different project.
    pub fn with_project_root(&self, project_root: impl Into<PathBuf>) -> Self {
        Self {
            global_dir: self.global_dir.clone(),
            project_root: project_root.into(),
        }
    }

    /// One layer as stored; a missing file is an empty layer.
    pub fn load_scope(&self, scope: ConfigScope) -> Result<ConfigFile, ConfigError> {
        let path = self.config_path(scope);
        if !path.exists() {
            return Ok(ConfigFile::default());
        }
        parser::parse_config(&path)
    }

    /// Effective configuration: project over global, then defaults.
    pub fn load(&self) -> Result<HubsyncConfig, ConfigError> {
        let global = self.load_scope(ConfigScope::Global)?;
        let project = self.load_scope(ConfigScope::Project)?;
        Ok(global.merge(project).resolve())
    }

    pub fn save_scope(&self, scope: ConfigScope, config: &ConfigFile) -> Result<(), ConfigError> {
        let path = self.config_path(scope);
        let content = parser::to_toml(config)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&path, content).map_err(|source| ConfigError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Load a layer, apply `edit`, and write it back.
    pub fn update_scope(
        &self,
        scope: ConfigScope,
        edit: impl FnOnce(&mut ConfigFile),
    ) -> Result<(), ConfigError> {
        let mut file = self.load_scope(scope)?;
        edit(&mut file);
        self.save_scope(scope, &file)
    }

    /// Persist the API token in the global layer.
    pub fn save_token(&self, token: &str) -> Result<(), ConfigError> {
        let token = token.trim().to_string();
        self.update_scope(ConfigScope::Global, |file| file.token = Some(token))
    }

    /// Remember the folder of the latest sync in the global layer.
    pub fn save_last_folder(&self, folder: &Path) -> Result<(), ConfigError> {
        let folder = folder.to_path_buf();
        self.update_scope(ConfigScope::Global, |file| file.last_folder = Some(folder))
    }
}
