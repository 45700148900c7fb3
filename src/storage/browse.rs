//! Archive uploads and folder browsing on top of an [`ObjectStore`].

use tracing::{debug, info};

use super::{content_type_for, ObjectEntry, ObjectStore};
use crate::error::RedactorResult;
use crate::output::zip_entries;
use crate::redaction::BatchOutcome;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Formats a byte count with two decimals, `1536` → `1.50 KB`.
pub fn human_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in SIZE_UNITS {
        if size < 1024.0 {
            return format!("{size:.2} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.2} PB")
}

/// Last segment of a folder prefix, `PF/Mar-2025/` → `Mar-2025`.
pub fn folder_name(prefix: &str) -> &str {
    let trimmed = prefix.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Parent folder of `path`, or `None` at or above `root`.
pub fn parent_path(path: &str, root: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() || trimmed == root.trim_end_matches('/') {
        return None;
    }
    let parent = match trimmed.rfind('/') {
        Some(idx) => format!("{}/", &trimmed[..idx]),
        None => return None,
    };
    parent.starts_with(root).then_some(parent)
}

/// Folders whose name contains `query`, ignoring case, sorted.
pub fn filter_folders(folders: &[String], query: &str) -> Vec<String> {
    let query = query.trim().to_lowercase();
    let mut kept: Vec<String> = folders
        .iter()
        .filter(|f| folder_name(f).to_lowercase().contains(&query))
        .cloned()
        .collect();
    kept.sort();
    kept
}

/// A sub-folder with its recursive size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSummary {
    pub prefix: String,
    pub size: u64,
}

impl FolderSummary {
    pub fn name(&self) -> &str {
        folder_name(&self.prefix)
    }

    pub fn readable_size(&self) -> String {
        human_size(self.size)
    }
}

/// One page of the archive browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveView {
    pub path: String,
    pub parent: Option<String>,
    pub folders: Vec<FolderSummary>,
    pub files: Vec<ObjectEntry>,
}

/// Lists `path`, keeping folders that match `search`.
///
/// `root` bounds parent navigation, usually the statement kind's folder.
pub async fn browse(
    store: &dyn ObjectStore,
    root: &str,
    path: &str,
    search: &str,
) -> RedactorResult<ArchiveView> {
    let listing = store.list(path).await?;
    debug!(
        "Listed {}: {} folder(s), {} file(s)",
        path,
        listing.folders.len(),
        listing.files.len()
    );

    let mut folders = Vec::new();
    for prefix in filter_folders(&listing.folders, search) {
        let size = store.folder_size(&prefix).await?;
        folders.push(FolderSummary { prefix, size });
    }

    let mut files = listing.files;
    files.sort_by(|a, b| a.key.cmp(&b.key));

    Ok(ArchiveView {
        path: path.to_string(),
        parent: parent_path(path, root),
        folders,
        files,
    })
}

/// Zips whole folders and single files.
///
/// Folder contents land under the folder's name; files under their own name.
pub async fn download_zip(
    store: &dyn ObjectStore,
    folders: &[String],
    files: &[String],
) -> RedactorResult<Vec<u8>> {
    let mut entries: Vec<(String, Vec<u8>)> = Vec::new();

    for folder in folders {
        let prefix = if folder.ends_with('/') {
            folder.clone()
        } else {
            format!("{folder}/")
        };
        let name = folder_name(&prefix).to_string();
        for object in store.list_recursive(&prefix).await? {
            let relative = &object.key[prefix.len()..];
            let bytes = store.get(&object.key).await?;
            entries.push((format!("{name}/{relative}"), bytes));
        }
    }

    for key in files {
        let bytes = store.get(key).await?;
        let name = ObjectEntry::new(key.as_str(), bytes.len() as u64).name().to_string();
        entries.push((name, bytes));
    }

    info!("Packed {} archive object(s)", entries.len());
    zip_entries(entries)
}

/// Key of an archived object: `{folder}{Mon}-{Year}/{unit}/{file}`.
pub fn archive_key(outcome: &BatchOutcome, unit: &str, file: &str) -> String {
    format!(
        "{}{}/{}/{}",
        outcome.kind.storage_folder(),
        outcome.period,
        unit,
        file
    )
}

/// Uploads every bundle's PDF and exports, returning the written keys.
pub async fn upload_bundles(
    store: &dyn ObjectStore,
    outcome: &BatchOutcome,
) -> RedactorResult<Vec<String>> {
    let kind = outcome.kind;
    let mut keys = Vec::new();

    for bundle in &outcome.bundles {
        let objects = [
            (kind.storage_pdf_name(&bundle.unit), &bundle.pdf),
            (kind.matched_entry_name(&bundle.unit), &bundle.matched),
            (kind.unmatched_entry_name(&bundle.unit), &bundle.unmatched),
        ];
        for (file, bytes) in objects {
            let key = archive_key(outcome, &bundle.unit, &file);
            store
                .put(&key, bytes.clone(), content_type_for(&key))
                .await?;
            debug!("Uploaded {} ({})", key, human_size(bytes.len() as u64));
            keys.push(key);
        }
    }

    info!("Uploaded {} object(s) to {}", keys.len(), store.describe());
    Ok(keys)
}
