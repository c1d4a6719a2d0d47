// Configuration module for tube-renamer
// Reads a flat TOML or JSON file (the JSON layout of older installs is accepted
// as-is), applies environment overrides and resolves it into an immutable AppConfig.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::naming::{FilenameTemplate, TemplateError};
use crate::pacing::PacingPolicy;
use crate::scanner::PlacementStrategy;

const APP_NAME: &str = "tube-renamer";
const CONFIG_FILENAME: &str = "config.toml";
const LEGACY_CONFIG_FILENAME: &str = "config.json";
/// Placeholder written by older setup scripts, treated as "no token"
const TOKEN_PLACEHOLDER: &str = "YOUR_PLEX_TOKEN_HERE";

/// Errors that stop the run before any file is touched
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {path} is not properly formatted: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid filename_pattern: {0}")]
    Template(#[from] TemplateError),
}

/// On-disk format, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

/// Directories to scan: a comma-separated string or a list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DirectoryPaths {
    Joined(String),
    List(Vec<String>),
}

impl DirectoryPaths {
    pub fn to_paths(&self) -> Vec<PathBuf> {
        let parts: Vec<&str> = match self {
            DirectoryPaths::Joined(s) => s.split(',').collect(),
            DirectoryPaths::List(list) => list.iter().map(String::as_str).collect(),
        };
        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect()
    }
}

/// Configuration file structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Plex server URL (default: http://localhost:32400)
    pub plex_url: String,

    /// Plex API token, rescans are skipped without it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plex_token: Option<String>,

    /// Plex library section to rescan
    #[serde(
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub library_section_id: Option<String>,

    /// Directories to scan for videos
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_paths: Option<DirectoryPaths>,

    /// Descend into subdirectories (default: true)
    pub scan_recursively: bool,

    /// Maximum title length in characters (default: 50)
    pub title_length_limit: usize,

    /// Run log (default: <data dir>/tube-renamer/renamer.log)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file_path: Option<PathBuf>,

    /// When set, files are copied into <destination>/<channel name>/
    /// instead of being renamed in place
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_folder: Option<PathBuf>,

    /// Seconds to wait after each processed video (default: 10)
    pub wait_timer: f64,

    /// Title lookup attempts per video (default: 3)
    pub max_retries: u32,

    /// Seconds between lookup attempts (default: 5)
    pub retry_delay: f64,

    /// Filename pattern. Placeholders: {title}, {id}/{video_id}, {date},
    /// {original}, {channel_name}
    pub filename_pattern: String,

    /// Lines kept in the run log and the ledger (default: 1000)
    pub max_log_entries: usize,

    /// Processed-item ledger (default: <data dir>/tube-renamer/processed.log)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_log: Option<PathBuf>,

    /// Video extension to match, without the dot (default: mp4)
    pub video_extension: String,

    /// Skip ids already in the ledger and record new ones (default: true)
    pub use_ledger: bool,

    /// Ask Plex to rescan after each directory (default: true)
    pub trigger_rescan: bool,

    /// Cron expression for external schedulers; read but not acted on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            plex_url: "http://localhost:32400".to_string(),
            plex_token: None,
            library_section_id: None,
            directory_paths: None,
            scan_recursively: true,
            title_length_limit: 50,
            log_file_path: None,
            destination_folder: None,
            wait_timer: 10.0,
            max_retries: 3,
            retry_delay: 5.0,
            filename_pattern: "{title}.mp4".to_string(),
            max_log_entries: 1000,
            metadata_log: None,
            video_extension: "mp4".to_string(),
            use_ledger: true,
            trigger_rescan: true,
            schedule: None,
        }
    }
}

/// Accept `"1"` as well as `1`
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => Some(s),
        Some(Raw::Number(n)) => Some(n.to_string()),
        None => None,
    })
}

impl ConfigFile {
    pub fn parse(contents: &str, format: ConfigFormat) -> Result<Self, String> {
        match format {
            ConfigFormat::Toml => toml::from_str(contents).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(contents).map_err(|e| e.to_string()),
        }
    }

    /// Read and parse a config file; a missing file is an error
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&contents, ConfigFormat::from_path(path)).map_err(|message| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            }
        })
    }

    /// Serialize in the format matching `path`
    pub fn to_string_for(&self, format: ConfigFormat) -> anyhow::Result<String> {
        Ok(match format {
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
        })
    }

    /// Defaults written by `--setup`, with example values filled in
    pub fn template() -> Self {
        let data_dir = default_data_dir();
        Self {
            plex_token: Some(String::new()),
            library_section_id: Some("1".to_string()),
            directory_paths: Some(DirectoryPaths::List(vec![
                "/path/to/videos".to_string()
            ])),
            log_file_path: Some(data_dir.join("renamer.log")),
            metadata_log: Some(data_dir.join("processed.log")),
            ..Default::default()
        }
    }
}

/// Environment values that take priority over the file
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub plex_url: Option<String>,
    pub plex_token: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            plex_url: std::env::var("PLEX_URL").ok().filter(|v| !v.is_empty()),
            plex_token: std::env::var("PLEX_TOKEN").ok().filter(|v| !v.is_empty()),
        }
    }
}

/// Rescan settings, decoupled from the placement strategy
#[derive(Debug, Clone)]
pub struct RescanConfig {
    pub enabled: bool,
    pub plex_url: String,
    pub plex_token: Option<String>,
    pub section_id: Option<String>,
}

impl RescanConfig {
    /// Token and section id, if both are present
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.plex_token.as_deref(), self.section_id.as_deref()) {
            (Some(token), Some(section)) => Some((token, section)),
            _ => None,
        }
    }
}

/// Resolved, read-only configuration for one run
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// File the configuration came from
    pub source: PathBuf,

    /// Directories to scan, in order
    pub directories: Vec<PathBuf>,

    pub scan_recursively: bool,
    pub title_length_limit: usize,
    pub log_file_path: PathBuf,
    pub ledger_path: PathBuf,
    pub max_log_entries: usize,
    pub video_extension: String,
    pub use_ledger: bool,

    pub pacing: PacingPolicy,
    pub template: FilenameTemplate,
    pub strategy: PlacementStrategy,
    pub rescan: RescanConfig,
}

impl AppConfig {
    /// Load configuration
    ///
    /// Priority for the file location:
    /// 1. Explicit path (`--config`)
    /// 2. TUBE_RENAMER_CONFIG environment variable
    /// 3. <config dir>/tube-renamer/config.toml, then config.json
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = resolve_config_path(explicit);
        let file = ConfigFile::read(&path)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Self::build(path, file, EnvOverrides::from_env())
    }

    /// Build configuration from a parsed file with environment overrides
    pub fn build(
        source: PathBuf,
        file: ConfigFile,
        env: EnvOverrides,
    ) -> Result<Self, ConfigError> {
        let template = FilenameTemplate::parse(&file.filename_pattern)?;

        let data_dir = default_data_dir();
        let log_file_path = file
            .log_file_path
            .unwrap_or_else(|| data_dir.join("renamer.log"));
        let ledger_path = file
            .metadata_log
            .unwrap_or_else(|| data_dir.join("processed.log"));

        let strategy = match file.destination_folder {
            Some(destination) => PlacementStrategy::CopyToChannel { destination },
            None => PlacementStrategy::RenameInPlace,
        };

        // Plex: env > config
        let plex_url = env.plex_url.unwrap_or(file.plex_url);
        let plex_token = env
            .plex_token
            .or(file.plex_token)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && t != TOKEN_PLACEHOLDER);
        let section_id = file
            .library_section_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let video_extension = file
            .video_extension
            .trim()
            .trim_start_matches('.')
            .to_lowercase();

        Ok(Self {
            source,
            directories: file
                .directory_paths
                .map(|d| d.to_paths())
                .unwrap_or_default(),
            scan_recursively: file.scan_recursively,
            title_length_limit: file.title_length_limit,
            log_file_path,
            ledger_path,
            max_log_entries: file.max_log_entries,
            video_extension: if video_extension.is_empty() {
                "mp4".to_string()
            } else {
                video_extension
            },
            use_ledger: file.use_ledger,
            pacing: PacingPolicy {
                item_delay: seconds(file.wait_timer),
                max_attempts: file.max_retries,
                retry_delay: seconds(file.retry_delay),
            },
            template,
            strategy,
            rescan: RescanConfig {
                enabled: file.trigger_rescan,
                plex_url,
                plex_token,
                section_id,
            },
        })
    }

    /// Log configuration status
    pub fn log_config(&self) {
        tracing::info!("Configuration: {}", self.source.display());
        for dir in &self.directories {
            tracing::debug!("Scan directory: {}", dir.display());
        }
        tracing::debug!("Ledger: {}", self.ledger_path.display());
        tracing::debug!("Filename pattern: {}", self.template.as_str());

        match &self.strategy {
            PlacementStrategy::RenameInPlace => tracing::debug!("Placement: rename in place"),
            PlacementStrategy::CopyToChannel { destination } => {
                tracing::debug!("Placement: copy into {}", destination.display())
            }
        }

        if self.rescan.enabled && self.rescan.credentials().is_none() {
            tracing::warn!("Plex token or library section ID missing, rescans will be skipped");
        }
    }
}

fn seconds(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

/// Find the config file path
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }

    // Environment variable takes priority
    if let Ok(path) = std::env::var("TUBE_RENAMER_CONFIG") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    let dir = default_config_dir();
    let toml_path = dir.join(CONFIG_FILENAME);
    let json_path = dir.join(LEGACY_CONFIG_FILENAME);

    if !toml_path.exists() && json_path.exists() {
        return json_path;
    }
    toml_path
}

/// XDG config dir, or the current directory as a fallback
fn default_config_dir() -> PathBuf {
    if let Some(dir) = dirs::config_dir() {
        return dir.join(APP_NAME);
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// XDG data dir, or the current directory as a fallback
fn default_data_dir() -> PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join(APP_NAME);
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Write the setup template to `path`, creating parent directories
pub fn write_default_config(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let contents = ConfigFile::template().to_string_for(ConfigFormat::from_path(path))?;
    std::fs::write(path, contents)?;
    Ok(())
}
