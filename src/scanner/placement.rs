use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::naming::sanitize;

/// Where a renamed video ends up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementStrategy {
    /// Rename the file inside its own folder
    RenameInPlace,
    /// Leave the original alone and copy it to `<destination>/<channel name>/`
    CopyToChannel { destination: PathBuf },
}

impl PlacementStrategy {
    pub fn verb(&self) -> &'static str {
        match self {
            PlacementStrategy::RenameInPlace => "rename",
            PlacementStrategy::CopyToChannel { .. } => "copy",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            PlacementStrategy::RenameInPlace => "Renamed",
            PlacementStrategy::CopyToChannel { .. } => "Copied",
        }
    }

    pub fn needs_channel(&self) -> bool {
        matches!(self, PlacementStrategy::CopyToChannel { .. })
    }

    /// Folder the new file goes into
    pub fn target_dir(&self, source: &Path, channel_name: &str) -> PathBuf {
        match self {
            PlacementStrategy::RenameInPlace => source
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
            PlacementStrategy::CopyToChannel { destination } => {
                destination.join(sanitize(channel_name))
            }
        }
    }

    /// Move or copy `source` to `target`, creating the target folder for copies
    pub async fn apply(&self, source: &Path, target: &Path) -> Result<()> {
        match self {
            PlacementStrategy::RenameInPlace => {
                fs::rename(source, target).await.with_context(|| {
                    format!(
                        "Failed to rename '{}' to '{}'",
                        source.display(),
                        target.display()
                    )
                })?;
            }
            PlacementStrategy::CopyToChannel { .. } => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).await.with_context(|| {
                        format!("Failed to create folder '{}'", parent.display())
                    })?;
                }
                fs::copy(source, target).await.with_context(|| {
                    format!(
                        "Failed to copy '{}' to '{}'",
                        source.display(),
                        target.display()
                    )
                })?;
            }
        }
        Ok(())
    }
}

/// First free path for `file_name` in `dir`
///
/// `Title.mp4` becomes `Title_1.mp4`, `Title_2.mp4`, ... while taken.
/// A path equal to `source` counts as free so renaming a file to its current
/// name is a no-op instead of producing a suffixed copy.
pub fn unique_target(dir: &Path, file_name: &str, source: Option<&Path>) -> PathBuf {
    let candidate = dir.join(file_name);
    if is_free(&candidate, source) {
        return candidate;
    }

    let (stem, ext) = match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some(ext) => (&file_name[..file_name.len() - ext.len() - 1], Some(ext)),
        None => (file_name, None),
    };

    let mut counter = 1u32;
    loop {
        let name = match ext {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        let candidate = dir.join(name);
        if is_free(&candidate, source) {
            return candidate;
        }
        counter += 1;
    }
}

fn is_free(candidate: &Path, source: Option<&Path>) -> bool {
    source.is_some_and(|s| s == candidate) || !candidate.exists()
}
