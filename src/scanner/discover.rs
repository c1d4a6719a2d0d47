use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::models::MediaItem;

/// Videos sharing one containing folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderBatch {
    pub folder: PathBuf,
    /// Folder name when the folder is below the scan root
    pub group_id: Option<String>,
    pub items: Vec<MediaItem>,
}

/// Check the extension, case-insensitively, without the dot
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Find videos under `root`, sorted by path within each folder
///
/// Hidden files (AppleDouble `._*` and friends) are ignored.
pub fn discover(root: &Path, recursive: bool, extension: &str) -> Vec<MediaItem> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut items = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file() || !has_extension(path, extension) {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        if file_name.starts_with('.') {
            tracing::debug!("Skipping hidden file: {}", path.display());
            continue;
        }

        let Some(video_id) = path.file_stem().and_then(|s| s.to_str()) else {
            tracing::debug!("Skipping file with non UTF-8 name: {}", path.display());
            continue;
        };

        let group_id = path
            .parent()
            .filter(|parent| *parent != root)
            .and_then(|parent| parent.file_name())
            .and_then(|name| name.to_str())
            .map(str::to_string);

        items.push(MediaItem {
            path: path.to_path_buf(),
            video_id: video_id.to_string(),
            group_id,
        });
    }

    items
}

/// Group items by containing folder, keeping first-seen order
pub fn group_by_folder(items: Vec<MediaItem>) -> Vec<FolderBatch> {
    let mut batches: Vec<FolderBatch> = Vec::new();

    for item in items {
        let folder = item
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        match batches.iter_mut().find(|b| b.folder == folder) {
            Some(batch) => batch.items.push(item),
            None => batches.push(FolderBatch {
                folder,
                group_id: item.group_id.clone(),
                items: vec![item],
            }),
        }
    }

    batches
}
