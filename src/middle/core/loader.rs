//! Unit loading
//!
//! Compiled units are stored as serialized [`ClassUnit`]s, either JSON or RON,
//! chosen by file extension.

use super::ir::ClassUnit;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Extensions recognised as unit files
pub const UNIT_EXTENSIONS: &[&str] = &["json", "ron"];

/// 加载错误
#[derive(Debug, Error)]
pub enum LoadError {
    /// 读取失败
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON 解析失败
    #[error("Invalid JSON unit {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// RON 解析失败
    #[error("Invalid RON unit {path}: {source}")]
    Ron {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    /// 不支持的扩展名
    #[error("Unsupported unit file {0} (expected .json or .ron)")]
    UnsupportedExtension(PathBuf),

    /// 路径不存在
    #[error("Path does not exist: {0}")]
    NotFound(PathBuf),

    /// 目录遍历失败
    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str())
}

/// Whether a path names a unit file
pub fn is_unit_file(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| UNIT_EXTENSIONS.contains(&ext))
}

/// Parse a unit from text in the given format (`"json"` or `"ron"`).
pub fn parse_unit(
    text: &str,
    format: &str,
    path: &Path,
) -> Result<ClassUnit, LoadError> {
    match format {
        "json" => serde_json::from_str(text).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        }),
        "ron" => ron::from_str(text).map_err(|source| LoadError::Ron {
            path: path.to_path_buf(),
            source,
        }),
        _ => Err(LoadError::UnsupportedExtension(path.to_path_buf())),
    }
}

/// Load one unit file
pub fn load_unit(path: &Path) -> Result<ClassUnit, LoadError> {
    let Some(format) = extension_of(path).filter(|ext| UNIT_EXTENSIONS.contains(ext)) else {
        return Err(LoadError::UnsupportedExtension(path.to_path_buf()));
    };

    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let unit = parse_unit(&text, format, path)?;
    debug!(
        "Loaded unit {} ({} methods) from {}",
        unit.name,
        unit.methods.len(),
        path.display()
    );
    Ok(unit)
}

/// Collect unit files from files and directories.
///
/// Explicit files must carry a unit extension; directories are walked and
/// non-unit files inside them are skipped. The result is sorted.
pub fn collect_unit_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();

    for path in paths {
        if !path.exists() {
            return Err(LoadError::NotFound(path.clone()));
        }

        if path.is_file() {
            if !is_unit_file(path) {
                return Err(LoadError::UnsupportedExtension(path.clone()));
            }
            files.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path).follow_links(true) {
                let entry = entry.map_err(|source| LoadError::Walk {
                    path: path.clone(),
                    source,
                })?;
                if entry.file_type().is_file() && is_unit_file(entry.path()) {
                    files.push(entry.path().to_path_buf());
                }
            }
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}
