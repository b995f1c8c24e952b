//! File-based configuration provider (YAML)
//!
//! Supports user-level (~/.config/toolloop/config.yaml) and workspace-level
//! (.config/toolloop/config.yaml) config.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use super::error::ConfigResult;
use super::settings::{LoopConfig, PartialLoopConfig};

/// Config level (user or workspace)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// User-level config (~/.config/toolloop/config.yaml)
    User,
    /// Workspace-level config (.config/toolloop/config.yaml in workspace root)
    Workspace,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
        }
    }
}

/// File-based configuration provider
///
/// # Example
///
/// ```no_run
/// use toolloop_core::config::FileConfigProvider;
///
/// let user_config = FileConfigProvider::user();
/// let workspace_config = FileConfigProvider::workspace("/path/to/workspace");
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
    level: ConfigLevel,
    cache: RwLock<Option<PartialLoopConfig>>,
}

impl FileConfigProvider {
    /// Create a new file config provider for a specific path
    pub fn new(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
            cache: RwLock::new(None),
        }
    }

    /// Create a user-level config provider (~/.config/toolloop/config.yaml)
    pub fn user() -> Self {
        // XDG config directory (~/.config on Linux, ~/Library/Application Support on macOS)
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        let path = config_dir.join("toolloop").join("config.yaml");
        Self::new(path, ConfigLevel::User)
    }

    /// Create a workspace-level config provider (.config/toolloop/config.yaml)
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        let path = workspace_root.as_ref().join(".config").join("toolloop").join("config.yaml");
        Self::new(path, ConfigLevel::Workspace)
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the config level
    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    /// Check if the config file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the file; a missing file is an empty config
    fn read(&self) -> ConfigResult<PartialLoopConfig> {
        if !self.path.exists() {
            return Ok(PartialLoopConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(PartialLoopConfig::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Get cached or load config
    pub fn load(&self) -> ConfigResult<PartialLoopConfig> {
        if let Some(config) = self.cache.read().as_ref() {
            return Ok(config.clone());
        }

        self.reload()
    }

    /// Reload config from disk (invalidate cache)
    pub fn reload(&self) -> ConfigResult<PartialLoopConfig> {
        let config = self.read()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, config: &PartialLoopConfig) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(config)?;
        fs::write(&self.path, content)?;

        *self.cache.write() = Some(config.clone());
        Ok(())
    }

    /// Export config as JSON
    pub fn export_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(&self.load()?)?)
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

/// Defaults, then each provider in order; the result is validated
pub fn load_layered(providers: &[&FileConfigProvider]) -> ConfigResult<LoopConfig> {
    let mut config = LoopConfig::default();
    for provider in providers {
        config = config.apply(&provider.load()?);
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, PartialTruncation, ToolSelection};
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("config.yaml"), ConfigLevel::User);

        assert!(!provider.exists());
        assert_eq!(provider.load().unwrap(), PartialLoopConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let provider = FileConfigProvider::new(&path, ConfigLevel::User);

        let config = PartialLoopConfig {
            max_iterations: Some(4),
            truncation: Some(PartialTruncation { max_bytes: Some(5000) }),
            ..Default::default()
        };
        provider.save(&config).unwrap();
        assert!(provider.exists());

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("max_iterations: 4"));
        assert!(content.contains("max_bytes: 5000"));

        assert_eq!(provider.reload().unwrap(), config);
        assert!(provider.export_json().unwrap().contains("\"max_iterations\": 4"));
    }

    #[test]
    fn test_workspace_overrides_user() {
        let dir = tempdir().unwrap();
        let user = FileConfigProvider::new(dir.path().join("user.yaml"), ConfigLevel::User);
        let workspace = FileConfigProvider::workspace(dir.path());

        fs::write(user.path(), "max_iterations: 3\ntruncation:\n  max_bytes: 1000\n").unwrap();
        workspace
            .save(&PartialLoopConfig {
                truncation: Some(PartialTruncation { max_bytes: Some(64) }),
                tools: Some(ToolSelection {
                    include: vec![],
                    exclude: vec!["drop_table".to_string()],
                }),
                ..Default::default()
            })
            .unwrap();

        let config = load_layered(&[&user, &workspace]).unwrap();
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.truncation.max_bytes, 64);
        assert_eq!(config.tools.exclude, vec!["drop_table".to_string()]);
        assert_eq!(workspace.level().as_str(), "workspace");
    }

    #[test]
    fn test_invalid_yaml() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("config.yaml"), ConfigLevel::User);
        fs::write(provider.path(), "max_iterations: [not a number").unwrap();

        assert!(matches!(provider.load(), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_layered_validation() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("config.yaml"), ConfigLevel::User);
        fs::write(provider.path(), "truncation:\n  max_bytes: 0\n").unwrap();

        assert!(matches!(load_layered(&[&provider]), Err(ConfigError::Invalid(_))));
    }
}
