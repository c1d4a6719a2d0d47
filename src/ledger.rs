// Processed-item ledger
// Plain text, one `video_id,file_name` pair per line. Append-only apart from
// rotation, which keeps the most recent lines. A single process writes it;
// overlapping runs against the same ledger are not supported.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::models::LedgerEntry;

#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// All parseable entries, oldest first. A missing file is an empty ledger.
    pub async fn entries(&self) -> Result<Vec<LedgerEntry>> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read ledger {}", self.path.display()))?;

        Ok(contents.lines().filter_map(LedgerEntry::parse).collect())
    }

    /// True if a line's id field equals `video_id` exactly
    pub async fn has_processed(&self, video_id: &str) -> Result<bool> {
        Ok(self
            .entries()
            .await?
            .iter()
            .any(|entry| entry.video_id == video_id))
    }

    /// True if a line's file name field equals `file_name` exactly
    pub async fn contains_output(&self, file_name: &str) -> Result<bool> {
        Ok(self
            .entries()
            .await?
            .iter()
            .any(|entry| entry.file_name == file_name))
    }

    pub async fn record(&self, video_id: &str, file_name: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let entry = LedgerEntry {
            video_id: video_id.to_string(),
            file_name: file_name.replace(['\r', '\n'], " "),
        };

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open ledger {}", self.path.display()))?;
        file.write_all(format!("{}\n", entry.to_line()).as_bytes())
            .await?;
        file.flush().await?;

        tracing::debug!("Ledger: recorded {} -> {}", video_id, file_name);
        Ok(())
    }

    /// Keep only the most recent `max_entries` lines
    pub async fn rotate(&self, max_entries: usize) -> Result<usize> {
        retain_last_lines(&self.path, max_entries).await
    }
}

/// Truncate a line-oriented file to its last `max_lines` lines.
/// Returns how many lines were dropped; a missing file drops nothing.
pub async fn retain_last_lines(path: &Path, max_lines: usize) -> Result<usize> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        return Ok(0);
    }

    let contents = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let lines: Vec<&str> = contents.lines().collect();

    if lines.len() <= max_lines {
        return Ok(0);
    }

    let dropped = lines.len() - max_lines;
    let mut kept = lines[dropped..].join("\n");
    if !kept.is_empty() {
        kept.push('\n');
    }

    fs::write(path, kept)
        .await
        .with_context(|| format!("Failed to rewrite {}", path.display()))?;

    tracing::debug!("Rotated {}: dropped {} lines", path.display(), dropped);
    Ok(dropped)
}
