//! File-based provider configuration (YAML)
//!
//! Supports user-level (~/.config/unillm/config.yaml) and workspace-level
//! (.config/unillm/config.yaml) files:
//!
//! ```yaml
//! default: work
//! providers:
//!   work:
//!     provider: azure
//!     endpoint: https://myresource.openai.azure.com
//!     deployment_name: gpt-4o
//!   local-tests:
//!     provider: openai
//!     execution_mode: mock
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::provider::{NormalizedConfig, ProviderConfig};
use super::validator::ConfigValidator;
use crate::error::LlmError;

/// Errors from reading or writing the config file
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Provider already exists: {0}")]
    ProviderExists(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Invalid(#[from] LlmError),
}

pub type ConfigFileResult<T> = Result<T, ConfigFileError>;

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Name of the provider entry to use when none is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Named provider configurations
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

/// Config level (user or workspace)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// ~/.config/unillm/config.yaml
    User,
    /// .config/unillm/config.yaml in the workspace root
    Workspace,
    /// Explicit path
    Custom,
}

/// Reads and writes named provider configurations
///
/// # Example
///
/// ```no_run
/// use unillm_core::config::{ConfigValidator, FileConfigProvider};
///
/// let file = FileConfigProvider::user();
/// let config = file.load_validated(Some("work"), &ConfigValidator::new());
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
    level: ConfigLevel,
    cache: RwLock<Option<ConfigFile>>,
}

impl FileConfigProvider {
    /// Provider for an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_level(path, ConfigLevel::Custom)
    }

    fn with_level(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
            cache: RwLock::new(None),
        }
    }

    /// User-level config (~/.config/unillm/config.yaml)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::with_level(config_dir.join("unillm").join("config.yaml"), ConfigLevel::User)
    }

    /// Workspace-level config (.config/unillm/config.yaml)
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root.as_ref().join(".config").join("unillm").join("config.yaml");
        Self::with_level(path, ConfigLevel::Workspace)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn load(&self) -> ConfigFileResult<ConfigFile> {
        if !self.path.exists() {
            return Ok(ConfigFile::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(ConfigFile::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    fn save(&self, config: &ConfigFile) -> ConfigFileResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_yaml::to_string(config)?)?;
        *self.cache.write() = Some(config.clone());
        Ok(())
    }

    /// Cached contents, loading on first use
    pub fn get_config(&self) -> ConfigFileResult<ConfigFile> {
        if let Some(config) = self.cache.read().as_ref() {
            return Ok(config.clone());
        }
        let config = self.load()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }

    /// Reload from disk, dropping the cache
    pub fn reload(&self) -> ConfigFileResult<ConfigFile> {
        let config = self.load()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }

    /// Names of all configured providers
    pub fn provider_names(&self) -> ConfigFileResult<Vec<String>> {
        Ok(self.get_config()?.providers.into_keys().collect())
    }

    /// Look up a named entry; `None` selects the file's default
    pub fn get_provider(&self, name: Option<&str>) -> ConfigFileResult<ProviderConfig> {
        let mut config = self.get_config()?;
        let name = match name {
            Some(name) => name.to_string(),
            None => config
                .default
                .clone()
                .ok_or_else(|| ConfigFileError::ProviderNotFound("<default>".to_string()))?,
        };
        config
            .providers
            .remove(&name)
            .ok_or(ConfigFileError::ProviderNotFound(name))
    }

    /// Look up and validate a named entry
    pub fn load_validated(
        &self,
        name: Option<&str>,
        validator: &ConfigValidator,
    ) -> ConfigFileResult<NormalizedConfig> {
        let config = self.get_provider(name)?;
        Ok(validator.validate(config)?)
    }

    /// Add a named entry; fails if the name is taken
    pub fn add_provider(&self, name: &str, provider: ProviderConfig) -> ConfigFileResult<()> {
        let mut config = self.get_config()?;
        if config.providers.contains_key(name) {
            return Err(ConfigFileError::ProviderExists(name.to_string()));
        }
        config.providers.insert(name.to_string(), provider);
        self.save(&config)
    }

    /// Remove a named entry
    pub fn remove_provider(&self, name: &str) -> ConfigFileResult<()> {
        let mut config = self.get_config()?;
        if config.providers.remove(name).is_none() {
            return Err(ConfigFileError::ProviderNotFound(name.to_string()));
        }
        if config.default.as_deref() == Some(name) {
            config.default = None;
        }
        self.save(&config)
    }

    /// Set the default entry
    pub fn set_default(&self, name: &str) -> ConfigFileResult<()> {
        let mut config = self.get_config()?;
        if !config.providers.contains_key(name) {
            return Err(ConfigFileError::ProviderNotFound(name.to_string()));
        }
        config.default = Some(name.to_string());
        self.save(&config)
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("exists", &self.exists())
            .finish()
    }
}
