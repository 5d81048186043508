//! Workspace layout for a validation run.

use std::path::{Path, PathBuf};

use crate::errors::{Result, XrefError};
use crate::resolver::normalize;

/// Registry location relative to the workspace base.
pub const DEFAULT_REGISTRY_PATH: &str = ".claude-plugin/marketplace.json";

/// Directory holding plugin packages, relative to the workspace base.
pub const DEFAULT_PLUGINS_ROOT: &str = "plugins";

/// Descriptor location relative to a plugin directory.
pub const DEFAULT_DESCRIPTOR_PATH: &str = ".claude-plugin/plugin.json";

/// Conventional subdirectory every plugin is expected to have.
pub const DEFAULT_CONVENTION_DIR: &str = "skills";

/// Where the registry, plugins, and per-plugin files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XrefConfig {
    /// Workspace base directory; relative values resolve against the
    /// process working directory.
    pub base_dir: PathBuf,
    /// Registry document, relative to `base_dir`.
    pub registry_path: PathBuf,
    /// Allowed root for plugin directories, relative to `base_dir`.
    pub plugins_root: String,
    /// Descriptor file, relative to each plugin directory.
    pub descriptor_path: PathBuf,
    /// Advisory subdirectory, relative to each plugin directory.
    pub convention_dir: String,
}

impl Default for XrefConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            registry_path: PathBuf::from(DEFAULT_REGISTRY_PATH),
            plugins_root: DEFAULT_PLUGINS_ROOT.to_string(),
            descriptor_path: PathBuf::from(DEFAULT_DESCRIPTOR_PATH),
            convention_dir: DEFAULT_CONVENTION_DIR.to_string(),
        }
    }
}

impl XrefConfig {
    /// Set the workspace base directory.
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    /// Set the registry path.
    #[must_use]
    pub fn with_registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry_path = path.into();
        self
    }

    /// Set the plugins root.
    #[must_use]
    pub fn with_plugins_root(mut self, root: impl Into<String>) -> Self {
        self.plugins_root = root.into();
        self
    }

    /// Absolute, normalized workspace base.
    pub fn absolute_base(&self) -> Result<PathBuf> {
        if self.base_dir.is_absolute() {
            return Ok(normalize(&self.base_dir));
        }
        let cwd = std::env::current_dir().map_err(XrefError::WorkingDir)?;
        Ok(normalize(&cwd.join(&self.base_dir)))
    }

    /// Registry file location under `base`.
    #[must_use]
    pub fn registry_file(&self, base: &Path) -> PathBuf {
        base.join(&self.registry_path)
    }

    /// Source used for an entry that does not name one.
    #[must_use]
    pub fn default_source(&self, name: &str) -> String {
        format!("{}/{name}", self.plugins_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_marketplace_layout() {
        let config = XrefConfig::default();
        assert_eq!(
            config.registry_path,
            PathBuf::from(".claude-plugin/marketplace.json")
        );
        assert_eq!(config.plugins_root, "plugins");
        assert_eq!(
            config.descriptor_path,
            PathBuf::from(".claude-plugin/plugin.json")
        );
        assert_eq!(config.convention_dir, "skills");
    }

    #[test]
    fn default_source_joins_plugins_root_and_name() {
        let config = XrefConfig::default();
        assert_eq!(config.default_source("foo"), "plugins/foo");
        let config = config.with_plugins_root("ext");
        assert_eq!(config.default_source("foo"), "ext/foo");
    }

    #[test]
    fn absolute_base_keeps_absolute_dir() {
        let config = XrefConfig::default().with_base_dir("/work/repo/./x/..");
        assert_eq!(config.absolute_base().unwrap(), PathBuf::from("/work/repo"));
    }

    #[test]
    fn absolute_base_resolves_relative_dir_against_cwd() {
        let config = XrefConfig::default().with_base_dir("sub");
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(config.absolute_base().unwrap(), normalize(&cwd.join("sub")));
    }

    #[test]
    fn registry_file_joins_base() {
        let config = XrefConfig::default().with_registry_path("reg.json");
        assert_eq!(
            config.registry_file(Path::new("/w")),
            PathBuf::from("/w/reg.json")
        );
    }
}
