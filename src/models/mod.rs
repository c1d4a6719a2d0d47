use std::path::PathBuf;

/// A video file found during a directory walk
///
/// The file itself may be renamed or copied, this record never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub path: PathBuf,
    /// File name without extension, used as the lookup key
    pub video_id: String,
    /// Name of the containing folder when it is below the scan root
    pub group_id: Option<String>,
}

impl MediaItem {
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// One line of the processed-item ledger: `video_id,file_name`
///
/// An id containing a comma, starting with a quote or carrying edge
/// whitespace is written quoted, CSV style, so it reads back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub video_id: String,
    pub file_name: String,
}

impl LedgerEntry {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (video_id, file_name) = match line.strip_prefix('"') {
            Some(rest) => parse_quoted(rest)?,
            None => {
                let (video_id, file_name) = line.split_once(',')?;
                (video_id.trim().to_string(), file_name)
            }
        };

        if video_id.is_empty() {
            return None;
        }
        Some(Self {
            video_id,
            file_name: file_name.to_string(),
        })
    }

    pub fn to_line(&self) -> String {
        let needs_quotes = self.video_id.contains(',')
            || self.video_id.starts_with('"')
            || self.video_id.trim() != self.video_id;
        if needs_quotes {
            format!("\"{}\",{}", self.video_id.replace('"', "\"\""), self.file_name)
        } else {
            format!("{},{}", self.video_id, self.file_name)
        }
    }
}

/// Split `id",rest` (opening quote already stripped), undoing `""` escapes
fn parse_quoted(rest: &str) -> Option<(String, &str)> {
    let mut id = String::new();
    let mut chars = rest.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if c != '"' {
            id.push(c);
            continue;
        }
        if let Some(&(_, '"')) = chars.peek() {
            chars.next();
            id.push('"');
            continue;
        }
        let file_name = rest[idx + 1..].strip_prefix(',')?;
        return Some((id, file_name));
    }

    None
}

/// Counters for one directory (or a whole run)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub discovered: usize,
    pub placed: usize,
    pub already_processed: usize,
    pub lookup_failed: usize,
    pub declined: usize,
    pub failed: usize,
}

impl ScanResult {
    pub fn merge(&mut self, other: &ScanResult) {
        self.discovered += other.discovered;
        self.placed += other.placed;
        self.already_processed += other.already_processed;
        self.lookup_failed += other.lookup_failed;
        self.declined += other.declined;
        self.failed += other.failed;
    }
}
