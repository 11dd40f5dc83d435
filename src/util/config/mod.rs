//! recycle-lint configuration system
//!
//! Supports user-level and project-level configuration with merge semantics.
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high -> low):
//! 1. CLI arguments
//! 2. Project-level (recycle-lint.toml, searched upwards from the checked path)
//! 3. User-level (~/.config/recycle-lint/config.toml)
//! 4. Default values
//! ```
//!
//! # Example
//!
//! ```toml
//! [lint]
//! severity = "error"
//! disabled_kinds = ["Message"]
//!
//! [[lint.extra_kinds]]
//! name = "Bitmap"
//! owner = "android/graphics/Bitmap"
//! obtain = [{ owner = "android/graphics/Bitmap", name = "createBitmap" }]
//!
//! [log]
//! level = "debug"
//! ```

use crate::middle::passes::recycle::resource::{ResourceKind, ResourceTable};
use crate::util::diagnostic::Severity;
use crate::util::logger::LogLevel;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Project-level config file name
pub const PROJECT_CONFIG_FILE: &str = "recycle-lint.toml";

/// Effective lint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintConfig {
    /// Master switch
    pub enabled: bool,
    /// Resource kinds (by name) that are never reported
    pub disabled_kinds: Vec<String>,
    /// Severity of reported findings
    pub severity: Severity,
    /// Run precise checks and units on the rayon pool
    pub parallel: bool,
    /// Honour the coarse second pass
    pub rescan: bool,
    /// Additional resource kinds, replacing built-ins of the same name
    pub extra_kinds: Vec<ResourceKind>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            disabled_kinds: Vec::new(),
            severity: Severity::Warning,
            parallel: true,
            rescan: true,
            extra_kinds: Vec::new(),
        }
    }
}

impl LintConfig {
    /// Overlay a file layer; set fields win, `extra_kinds` accumulate
    pub fn apply(
        &mut self,
        layer: &LintLayer,
    ) {
        if let Some(enabled) = layer.enabled {
            self.enabled = enabled;
        }
        if let Some(disabled) = &layer.disabled_kinds {
            self.disabled_kinds = disabled.clone();
        }
        if let Some(severity) = layer.severity {
            self.severity = severity;
        }
        if let Some(parallel) = layer.parallel {
            self.parallel = parallel;
        }
        if let Some(rescan) = layer.rescan {
            self.rescan = rescan;
        }
        self.extra_kinds.extend(layer.extra_kinds.iter().cloned());
    }

    /// Resource table after applying `disabled_kinds` and `extra_kinds`
    pub fn resource_table(&self) -> ResourceTable {
        let table = ResourceTable::configured(&self.disabled_kinds, &self.extra_kinds);
        for name in &self.disabled_kinds {
            let known = ResourceTable::builtin().find(name).is_some()
                || self.extra_kinds.iter().any(|k| &k.name == name);
            if !known {
                warn!("disabled_kinds names unknown resource kind `{}`", name);
            }
        }
        table
    }
}

/// `[lint]` table as written in a config file; unset fields inherit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintLayer {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub disabled_kinds: Option<Vec<String>>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub parallel: Option<bool>,
    #[serde(default)]
    pub rescan: Option<bool>,
    #[serde(default)]
    pub extra_kinds: Vec<ResourceKind>,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub level: Option<LogLevel>,
}

/// One configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub lint: LintLayer,
    #[serde(default)]
    pub log: LogConfig,
}

/// Fully resolved configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub lint: LintConfig,
    pub log_level: Option<LogLevel>,
    /// Files that contributed, lowest priority first
    pub sources: Vec<PathBuf>,
}

impl ResolvedConfig {
    fn apply(
        &mut self,
        file: &ConfigFile,
        path: &Path,
    ) {
        self.lint.apply(&file.lint);
        if file.log.level.is_some() {
            self.log_level = file.log.level;
        }
        self.sources.push(path.to_path_buf());
    }
}

/// Get the user config directory
pub fn get_config_dir() -> Option<PathBuf> {
    // Try XDG config directory on Unix
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join("recycle-lint"));
    }

    // Fallback to ~/.config/recycle-lint
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join("recycle-lint"));
    }

    // On Windows, try %APPDATA%
    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join("recycle-lint"));
    }

    None
}

/// Get the user config file path (~/.config/recycle-lint/config.toml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Search `start` and its ancestors for a project config file
pub fn find_project_config(start: &Path) -> Option<PathBuf> {
    let start = if start.is_file() { start.parent()? } else { start };
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

/// Parse a config file from TOML text
pub fn parse_config(
    text: &str,
    path: &Path,
) -> Result<ConfigFile, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load one config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, path)
}

/// Resolve user and project layers.
///
/// An explicit path replaces the project search and must exist.
pub fn resolve_config(
    explicit: Option<&Path>,
    project_root: &Path,
) -> Result<ResolvedConfig, ConfigError> {
    let mut resolved = ResolvedConfig::default();

    if let Some(user_path) = get_config_path().filter(|p| p.is_file()) {
        let file = load_config_file(&user_path)?;
        resolved.apply(&file, &user_path);
    }

    let project = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_project_config(project_root),
    };
    if let Some(path) = project {
        let file = load_config_file(&path)?;
        resolved.apply(&file, &path);
    }

    debug!("Resolved configuration from {:?}", resolved.sources);
    Ok(resolved)
}

/// Write a default project config file
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let defaults = LintConfig::default();
    let file = ConfigFile {
        lint: LintLayer {
            enabled: Some(defaults.enabled),
            disabled_kinds: Some(defaults.disabled_kinds),
            severity: Some(defaults.severity),
            parallel: Some(defaults.parallel),
            rescan: Some(defaults.rescan),
            extra_kinds: Vec::new(),
        },
        log: LogConfig::default(),
    };

    let content = toml::to_string_pretty(&file).map_err(ConfigError::Serialize)?;
    fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config serialize error: {0}")]
    Serialize(#[source] toml::ser::Error),
}
