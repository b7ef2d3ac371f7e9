//! Settings file plus environment overrides.
//!
//! The file lives in the platform config folder, e.g.
//! `~/.config/works-explorer/config.json` on Linux. Every field is optional.

use crate::cache::WORKS_CACHE_TTL;
use crate::filter::GALLERY_PAGE_SIZE;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "spwarehouse";
const APP_NAME: &str = "works-explorer";
const CONFIG_FILENAME: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Cloudinary credentials. Any missing value disables uploads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageHostConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: PathBuf,
    pub page_size: usize,
    pub cache_ttl_secs: u64,
    pub log_file: PathBuf,
    pub image_host: ImageHostConfig,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
}

impl Default for AppConfig {
    fn default() -> Self {
        let (data, cache) = match project_dirs() {
            Some(dirs) => (dirs.data_dir().to_path_buf(), dirs.cache_dir().to_path_buf()),
            None => (PathBuf::from("."), PathBuf::from(".")),
        };
        Self {
            database: data.join("works.db"),
            page_size: GALLERY_PAGE_SIZE,
            cache_ttl_secs: WORKS_CACHE_TTL.as_secs(),
            log_file: cache.join("works-explorer.log"),
            image_host: ImageHostConfig::default(),
        }
    }
}

/// Default location of the config file.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    project_dirs()
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
        .ok_or(ConfigError::NoHomeDir)
}

impl AppConfig {
    /// Load from `path` (or the default location), falling back to defaults
    /// when the file does not exist, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };
        let mut config = match std::fs::read_to_string(&path) {
            Ok(content) => {
                info!(path = %path.display(), "loaded config");
                Self::from_json(&content).map_err(|source| ConfigError::Parse {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_str(content)?;
        if config.page_size == 0 {
            config.page_size = GALLERY_PAGE_SIZE;
        }
        Ok(config)
    }

    /// Image host credentials from the environment win over the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let host = &mut self.image_host;
        for (key, slot) in [
            ("CLOUDINARY_CLOUD_NAME", &mut host.cloud_name),
            ("CLOUDINARY_API_KEY", &mut host.api_key),
            ("CLOUDINARY_API_SECRET", &mut host.api_secret),
        ] {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *slot = Some(value);
            }
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.page_size, 8);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert!(config.database.ends_with("works.db"));
        assert!(config.image_host.cloud_name.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_json(r#"{"page_size": 12, "image_host": {"cloud_name": "demo"}}"#).unwrap();
        assert_eq!(config.page_size, 12);
        assert_eq!(config.cache_ttl_secs, 300);
        assert_eq!(config.image_host.cloud_name.as_deref(), Some("demo"));

        let zero = AppConfig::from_json(r#"{"page_size": 0}"#).unwrap();
        assert_eq!(zero.page_size, GALLERY_PAGE_SIZE);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = AppConfig::from_json(r#"{"image_host": {"cloud_name": "file", "api_key": "k"}}"#).unwrap();
        let env: HashMap<&str, &str> = [("CLOUDINARY_CLOUD_NAME", "env"), ("CLOUDINARY_API_KEY", " ")].into();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.image_host.cloud_name.as_deref(), Some("env"));
        // blank env values do not clobber the file
        assert_eq!(config.image_host.api_key.as_deref(), Some("k"));
        assert!(config.image_host.api_secret.is_none());
    }

    #[test]
    fn test_load_missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none.json");
        let config = AppConfig::load(Some(&missing)).unwrap();
        assert_eq!(config.page_size, 8);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(AppConfig::load(Some(&bad)), Err(ConfigError::Parse { .. })));
    }
}
