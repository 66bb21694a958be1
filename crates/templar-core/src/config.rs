//! Explicit configuration for the template store and placeholder engine.
//!
//! Every component receives its settings through [`TemplarConfig`]; nothing in
//! the core looks up global application state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TemplarError};

/// Default placeholder pattern: `{{ token }}` with optional inner whitespace.
///
/// Braces are escaped because the regex crate rejects a bare `{` with nothing
/// to repeat.
pub const DEFAULT_PATTERN: &str = r"\{\{\s*(\w+)\s*\}\}";

/// Default name of the per-project provider file.
pub const DEFAULT_PROJECT_FILE: &str = "templar.json";

/// Configuration shared by the index store, the placeholder engine and the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TemplarConfig {
    /// Directory holding `index.json` and the `<id>.template` files.
    pub store_root: PathBuf,
    /// Placeholder regex with exactly one capturing group for the token name.
    pub pattern: String,
    /// Optional JSON file of global macros (`token -> value`).
    pub macro_file: Option<PathBuf>,
    /// Known project roots used to relativize instantiation targets.
    pub project_roots: Vec<PathBuf>,
    /// File name of the project-local provider table inside a project root.
    pub project_file: String,
}

impl Default for TemplarConfig {
    fn default() -> Self {
        Self {
            store_root: default_store_root(),
            pattern: DEFAULT_PATTERN.into(),
            macro_file: None,
            project_roots: Vec::new(),
            project_file: DEFAULT_PROJECT_FILE.into(),
        }
    }
}

impl TemplarConfig {
    /// Config rooted at `store_root` with every other field defaulted.
    pub fn with_store_root(store_root: impl Into<PathBuf>) -> Self {
        Self {
            store_root: store_root.into(),
            ..Self::default()
        }
    }

    /// Load a config file. Missing or unreadable files are `ConfigNotFound`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| TemplarError::ConfigNotFound {
                path: path.to_path_buf(),
                source: e,
            })?;
        serde_json::from_str(&contents).map_err(|e| TemplarError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load a config file, falling back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write the config as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TemplarError::storage(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| TemplarError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| TemplarError::storage(path, e))
    }
}

/// `<user config dir>/templar/template-store`, or a relative `template-store`
/// when the platform reports no config directory.
pub fn default_store_root() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("templar").join("template-store"))
        .unwrap_or_else(|| PathBuf::from("template-store"))
}

/// `<user config dir>/templar/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("templar").join("config.json"))
        .unwrap_or_else(|| PathBuf::from("templar.config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.json");
        let config = TemplarConfig {
            store_root: dir.path().join("store"),
            pattern: r"<%\s*(\w+)\s*%>".into(),
            macro_file: Some(dir.path().join("macros.json")),
            project_roots: vec![dir.path().join("project")],
            project_file: "templar.json".into(),
        };
        config.save(&path).unwrap();
        assert_eq!(TemplarConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "store_root": "/tmp/templar-store" }"#).unwrap();
        let config = TemplarConfig::load(&path).unwrap();
        assert_eq!(config.store_root, PathBuf::from("/tmp/templar-store"));
        assert_eq!(config.pattern, DEFAULT_PATTERN);
        assert_eq!(config.project_file, DEFAULT_PROJECT_FILE);
        assert!(config.macro_file.is_none());
    }

    #[test]
    fn test_load_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let result = TemplarConfig::load(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(TemplarError::ConfigNotFound { .. })));
        assert!(TemplarConfig::load_or_default(&dir.path().join("missing.json")).is_ok());
    }

    #[test]
    fn test_load_malformed_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            TemplarConfig::load(&path),
            Err(TemplarError::ConfigParse { .. })
        ));
    }
}
