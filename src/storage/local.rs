//! Filesystem backend: keys are paths below a root directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{Listing, ObjectEntry, ObjectStore};
use crate::error::{RedactorError, RedactorResult};

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> RedactorResult<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return Err(RedactorError::Storage {
                key: key.to_string(),
                message: "key must be a relative path inside the store".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }

    /// Directory holding `prefix` and the name fragment after the last `/`.
    fn split_prefix<'a>(&self, prefix: &'a str) -> RedactorResult<(PathBuf, &'a str, &'a str)> {
        let (dir, stem) = match prefix.rfind('/') {
            Some(idx) => (&prefix[..=idx], &prefix[idx + 1..]),
            None => ("", prefix),
        };
        let path = if dir.is_empty() {
            self.root.clone()
        } else {
            self.path_for(dir)?
        };
        Ok((path, dir, stem))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> RedactorError {
    RedactorError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> RedactorResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }
        fs::write(&path, bytes).await.map_err(|e| io_error(&path, e))
    }

    async fn get(&self, key: &str) -> RedactorResult<Vec<u8>> {
        let path = self.path_for(key)?;
        fs::read(&path).await.map_err(|e| io_error(&path, e))
    }

    async fn list(&self, prefix: &str) -> RedactorResult<Listing> {
        let (dir_path, dir, stem) = self.split_prefix(prefix)?;
        let mut listing = Listing::default();

        let mut entries = match fs::read_dir(&dir_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(listing),
            Err(e) => return Err(io_error(&dir_path, e)),
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&dir_path, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(stem) {
                continue;
            }
            let metadata = entry.metadata().await.map_err(|e| io_error(&entry.path(), e))?;
            if metadata.is_dir() {
                listing.folders.push(format!("{dir}{name}/"));
            } else {
                listing
                    .files
                    .push(ObjectEntry::new(format!("{dir}{name}"), metadata.len()));
            }
        }

        listing.folders.sort();
        listing.files.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(listing)
    }

    async fn list_recursive(&self, prefix: &str) -> RedactorResult<Vec<ObjectEntry>> {
        let (start, dir, _) = self.split_prefix(prefix)?;
        let mut found = Vec::new();
        let mut pending = vec![(start, dir.to_string())];

        while let Some((path, key_prefix)) = pending.pop() {
            let mut entries = match fs::read_dir(&path).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(io_error(&path, e)),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| io_error(&path, e))?
            {
                let name = entry.file_name().to_string_lossy().into_owned();
                let key = format!("{key_prefix}{name}");
                let metadata = entry.metadata().await.map_err(|e| io_error(&entry.path(), e))?;
                if metadata.is_dir() {
                    let folder = format!("{key}/");
                    if folder.starts_with(prefix) || prefix.starts_with(&folder) {
                        pending.push((entry.path(), folder));
                    }
                } else if key.starts_with(prefix) {
                    found.push(ObjectEntry::new(key, metadata.len()));
                }
            }
        }

        found.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(found)
    }

    fn describe(&self) -> String {
        format!("local store at {}", self.root.display())
    }
}
