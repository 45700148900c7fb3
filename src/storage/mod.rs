//! Object storage for the output archive.
//!
//! Keys use `/` as the folder separator. Backends only need flat object
//! operations; folder views are derived by [`browse`].

pub mod browse;
pub mod local;
pub mod s3;

pub use browse::{
    archive_key, browse, download_zip, filter_folders, folder_name, human_size, parent_path,
    upload_bundles, ArchiveView, FolderSummary,
};
pub use local::LocalStore;
pub use s3::S3Store;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::RedactorResult;

/// An object and its size in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
}

impl ObjectEntry {
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }

    /// Last path segment of the key.
    pub fn name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

/// One level of the key hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Sub-folder prefixes, each ending with `/`
    pub folders: Vec<String>,
    /// Objects directly under the prefix
    pub files: Vec<ObjectEntry>,
}

/// Flat key/value object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` under `key`, replacing any previous object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> RedactorResult<()>;

    /// Reads the object stored under `key`.
    async fn get(&self, key: &str) -> RedactorResult<Vec<u8>>;

    /// Lists folders and objects one level below `prefix`.
    async fn list(&self, prefix: &str) -> RedactorResult<Listing>;

    /// Lists every object whose key starts with `prefix`.
    async fn list_recursive(&self, prefix: &str) -> RedactorResult<Vec<ObjectEntry>>;

    /// Total size of every object under `prefix`.
    async fn folder_size(&self, prefix: &str) -> RedactorResult<u64> {
        Ok(self
            .list_recursive(prefix)
            .await?
            .iter()
            .map(|entry| entry.size)
            .sum())
    }

    /// Returns a human-readable description of the backend.
    fn describe(&self) -> String;
}

/// Opens the backend named by the configuration.
pub async fn open_store(config: &StorageConfig) -> Box<dyn ObjectStore> {
    let store: Box<dyn ObjectStore> = match config.backend {
        StorageBackend::S3 => {
            Box::new(S3Store::new(&config.bucket, config.region.as_deref()).await)
        }
        StorageBackend::Local => Box::new(LocalStore::new(&config.local_root)),
    };
    debug!("Using {}", store.describe());
    store
}

/// Content type of an archive object, from its extension.
pub fn content_type_for(key: &str) -> &'static str {
    match key.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("pdf") => "application/pdf",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}
