use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::doc::Info;
use crate::error::ConfigError;

/// Document build configuration, loadable from `.oapi.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpecConfig {
    /// Path prefixes removed from route paths; the first match wins.
    pub strip_prefixes: Vec<String>,
    /// Number of trailing module-path segments prefixed to schema names.
    pub obj_pkg_segments: usize,
    pub title: String,
    pub version: String,
}

impl Default for SpecConfig {
    fn default() -> Self {
        Self {
            strip_prefixes: Vec::new(),
            obj_pkg_segments: 0,
            title: "API".to_string(),
            version: "1.0.0".to_string(),
        }
    }
}

impl SpecConfig {
    pub fn info(&self) -> Info {
        Info {
            title: self.title.clone(),
            version: self.version.clone(),
        }
    }

    /// `path` with the first matching configured prefix removed.
    pub fn strip_prefix<'p>(&self, path: &'p str) -> &'p str {
        self.strip_prefixes
            .iter()
            .find_map(|prefix| path.strip_prefix(prefix.as_str()))
            .unwrap_or(path)
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".oapi.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<SpecConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(config))
}
