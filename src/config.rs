//! Tool configuration loaded from TOML.
//!
//! ```toml
//! [processing]
//! workers = 4
//!
//! [storage]
//! backend = "s3"
//! bucket = "statements-archive"
//! region = "ap-south-1"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RedactorError, RedactorResult};
use crate::redaction::DEFAULT_WORKERS;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub processing: ProcessingConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Where archived bundles go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    S3,
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Region override; the AWS provider chain decides when unset
    #[serde(default)]
    pub region: Option<String>,

    /// Root directory of the local backend
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            bucket: default_bucket(),
            region: None,
            local_root: default_local_root(),
        }
    }
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_bucket() -> String {
    "unit-redactor-archive".to_string()
}

fn default_local_root() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("archive"))
        .unwrap_or_else(|| PathBuf::from("archive"))
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "unit-redactor", "unit-redactor")
}

impl Config {
    /// Loads `explicit` if given, else the default location, else defaults.
    pub fn load(explicit: Option<&Path>) -> RedactorResult<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> RedactorResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RedactorError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> RedactorResult<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| RedactorError::invalid_input("config", e.to_string()))?;
        if config.processing.workers == 0 {
            return Err(RedactorError::invalid_input(
                "config",
                "processing.workers must be at least 1",
            ));
        }
        Ok(config)
    }

    /// Default config file path for this platform.
    pub fn config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
