// Scanner - walks configured directories and renames or copies each video
// after looking up its title. Items are handled one at a time: lookup,
// ledger check, templating, placement, ledger write, then a fixed wait.

mod discover;
mod placement;

pub use placement::PlacementStrategy;

use discover::{discover, group_by_folder};
use placement::unique_target;

use std::io::{BufRead, Write};
use std::path::Path;

use crate::config::AppConfig;
use crate::ledger::{retain_last_lines, Ledger};
use crate::models::{MediaItem, ScanResult};
use crate::naming::{trim_title, Placeholder, TemplateVars};
use crate::pacing::Pacer;
use crate::services::lookup::{fetch_title, resolve_channel_name, MetadataSource, UNKNOWN_CHANNEL};
use crate::services::plex::LibraryNotifier;

const DRY_RUN_PREFIX: &str = "[DRY RUN] ";

/// Asks the user whether to go ahead with one file
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Reads a y/n answer from stdin
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{} (y/n): ", prompt);
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        answer.trim().eq_ignore_ascii_case("y")
    }
}

/// Destination for user-facing progress lines
pub trait Narrator: Send + Sync {
    fn say(&self, line: &str);
}

/// Prints progress to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutNarrator;

impl Narrator for StdoutNarrator {
    fn say(&self, line: &str) {
        println!("{}", line);
    }
}

/// What happened to one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Renamed or copied, or would have been in a dry run
    Placed,
    AlreadyProcessed,
    LookupFailed,
    Declined,
    Failed,
}

/// Runs the rename pipeline for one configuration
pub struct Renamer<'a> {
    config: &'a AppConfig,
    source: &'a dyn MetadataSource,
    pacer: &'a dyn Pacer,
    notifier: Option<&'a dyn LibraryNotifier>,
    confirmer: Option<&'a dyn Confirmer>,
    narrator: &'a dyn Narrator,
    ledger: Ledger,
    dry_run: bool,
}

impl<'a> Renamer<'a> {
    pub fn new(
        config: &'a AppConfig,
        source: &'a dyn MetadataSource,
        pacer: &'a dyn Pacer,
    ) -> Self {
        Self {
            config,
            source,
            pacer,
            notifier: None,
            confirmer: None,
            narrator: &StdoutNarrator,
            ledger: Ledger::new(&config.ledger_path),
            dry_run: false,
        }
    }

    /// Rescan target; without one, rescans are reported as skipped
    pub fn with_notifier(mut self, notifier: &'a dyn LibraryNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Ask before touching each file
    pub fn with_confirmer(mut self, confirmer: &'a dyn Confirmer) -> Self {
        self.confirmer = Some(confirmer);
        self
    }

    /// Send progress lines somewhere other than stdout
    pub fn with_narrator(mut self, narrator: &'a dyn Narrator) -> Self {
        self.narrator = narrator;
        self
    }

    /// Describe every change instead of making it
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn say(&self, line: &str) {
        self.narrator.say(line);
    }

    fn prefix(&self) -> &'static str {
        if self.dry_run {
            DRY_RUN_PREFIX
        } else {
            ""
        }
    }

    /// Process every configured directory in order
    pub async fn run(&self) -> ScanResult {
        let mut total = ScanResult::default();

        if self.config.directories.is_empty() {
            tracing::warn!("No directory_paths configured, nothing to do");
            self.say("No directory_paths configured, nothing to do.");
            return total;
        }

        for dir in &self.config.directories {
            if !dir.is_dir() {
                tracing::warn!("Directory '{}' does not exist. Skipping.", dir.display());
                self.say(&format!("Directory '{}' does not exist. Skipping.", dir.display()));
                continue;
            }

            let result = self.process_directory(dir).await;
            total.merge(&result);
        }

        total
    }

    /// Process one directory, then ask the media server to rescan
    pub async fn process_directory(&self, root: &Path) -> ScanResult {
        let mut result = ScanResult::default();

        self.say(&format!("\nScanning directory: {}", root.display()));
        tracing::info!("Scanning directory: {}", root.display());

        let items = discover(root, self.config.scan_recursively, &self.config.video_extension);
        result.discovered = items.len();
        tracing::debug!("Found {} candidate files in {}", items.len(), root.display());

        let needs_channel = self.config.strategy.needs_channel()
            || self.config.template.uses(Placeholder::ChannelName);

        for batch in group_by_folder(items) {
            // Resolved once per folder, reused for every file in it
            let channel_name = match (&batch.group_id, needs_channel) {
                (_, false) => None,
                (Some(group_id), true) => {
                    let name = resolve_channel_name(self.source, group_id).await;
                    tracing::info!("Channel for folder '{}': {}", group_id, name);
                    Some(name)
                }
                (None, true) => Some(UNKNOWN_CHANNEL.to_string()),
            };

            for item in &batch.items {
                match self.process_item(item, channel_name.as_deref()).await {
                    ItemOutcome::Placed => result.placed += 1,
                    ItemOutcome::AlreadyProcessed => result.already_processed += 1,
                    ItemOutcome::LookupFailed => result.lookup_failed += 1,
                    ItemOutcome::Declined => result.declined += 1,
                    ItemOutcome::Failed => result.failed += 1,
                }
            }
        }

        tracing::info!(
            "Finished {}: {} found, {} {}, {} already processed, {} without title, {} declined, {} failed",
            root.display(),
            result.discovered,
            result.placed,
            self.config.strategy.past_tense().to_lowercase(),
            result.already_processed,
            result.lookup_failed,
            result.declined,
            result.failed
        );

        self.notify_rescan().await;
        result
    }

    /// Handle one video: skip check, lookup, render, confirm, place, record, wait
    pub async fn process_item(&self, item: &MediaItem, channel_name: Option<&str>) -> ItemOutcome {
        let file_name = item.file_name();
        self.say(&format!("\nProcessing video ID: {}", item.video_id));

        if self.config.use_ledger {
            match self.is_known(item).await {
                Ok(true) => {
                    self.say(&format!("[INFO] Skipping '{}' (already renamed).", file_name));
                    tracing::debug!("Skipping '{}' (already in ledger)", item.path.display());
                    return ItemOutcome::AlreadyProcessed;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!("Cannot read ledger, skipping '{}': {:#}", file_name, e);
                    self.say(&format!("Cannot read ledger, skipping '{}': {:#}", file_name, e));
                    return ItemOutcome::Failed;
                }
            }
        }

        let Some(title) =
            fetch_title(self.source, self.pacer, &self.config.pacing, &item.video_id).await
        else {
            self.say(&format!("Could not fetch title for '{}', skipping.", file_name));
            return ItemOutcome::LookupFailed;
        };

        let trimmed = trim_title(&title, self.config.title_length_limit);
        if trimmed != title {
            tracing::debug!("Trimmed title: {}", trimmed);
        }

        let channel = channel_name.unwrap_or(UNKNOWN_CHANNEL);
        let new_name = self.config.template.render(&TemplateVars {
            title: &trimmed,
            video_id: &item.video_id,
            original: &item.video_id,
            channel_name: channel,
            date: chrono::Local::now().date_naive(),
        });

        let strategy = &self.config.strategy;
        if let Some(confirmer) = self.confirmer {
            let prompt = format!(
                "{}{} '{}' to '{}'?",
                self.prefix(),
                capitalize(strategy.verb()),
                file_name,
                new_name
            );
            if !confirmer.confirm(&prompt) {
                self.say("Skipping file.");
                tracing::debug!("User declined '{}'", file_name);
                return ItemOutcome::Declined;
            }
        }

        let target_dir = strategy.target_dir(&item.path, channel);
        let in_place_source = matches!(strategy, PlacementStrategy::RenameInPlace)
            .then_some(item.path.as_path());
        let target = unique_target(&target_dir, &new_name, in_place_source);

        let outcome = if self.dry_run {
            self.say(&format!(
                "{}Would {} '{}' to '{}'",
                DRY_RUN_PREFIX,
                strategy.verb(),
                file_name,
                target_name(&target)
            ));
            tracing::info!(
                "{}Would {} '{}' to '{}'",
                DRY_RUN_PREFIX,
                strategy.verb(),
                item.path.display(),
                target.display()
            );
            ItemOutcome::Placed
        } else {
            self.place(item, &target).await
        };

        self.pacer.pause(self.config.pacing.item_delay).await;
        outcome
    }

    /// Apply the placement, then record and rotate
    async fn place(&self, item: &MediaItem, target: &Path) -> ItemOutcome {
        let strategy = &self.config.strategy;

        if target != item.path {
            if let Err(e) = strategy.apply(&item.path, target).await {
                tracing::error!("{:#}", e);
                self.say(&format!("Error: {:#}", e));
                return ItemOutcome::Failed;
            }
        }

        let final_name = target_name(target);

        tracing::info!(
            "{} '{}' to '{}'",
            strategy.past_tense(),
            item.path.display(),
            target.display()
        );
        self.say(&format!(
            "{} '{}' to '{}'",
            strategy.past_tense(),
            item.file_name(),
            final_name
        ));

        if self.config.use_ledger {
            if let Err(e) = self.ledger.record(&item.video_id, &final_name).await {
                tracing::error!("Failed to record '{}' in ledger: {:#}", item.video_id, e);
            }
        }
        self.rotate_logs().await;

        ItemOutcome::Placed
    }

    /// Known id, or a file this tool produced on an earlier run
    async fn is_known(&self, item: &MediaItem) -> anyhow::Result<bool> {
        Ok(self.ledger.has_processed(&item.video_id).await?
            || self.ledger.contains_output(item.file_name()).await?)
    }

    async fn rotate_logs(&self) {
        let max = self.config.max_log_entries;

        if self.config.use_ledger {
            if let Err(e) = self.ledger.rotate(max).await {
                tracing::warn!("Failed to rotate ledger: {:#}", e);
            }
        }

        if let Err(e) = retain_last_lines(&self.config.log_file_path, max).await {
            tracing::warn!("Failed to rotate run log: {:#}", e);
        }
    }

    /// Best-effort rescan; failures are logged, never fatal
    async fn notify_rescan(&self) {
        if !self.config.rescan.enabled {
            return;
        }

        if self.dry_run {
            let message = format!("{}Would trigger Plex library scan", DRY_RUN_PREFIX);
            self.say(&message);
            tracing::info!("{}", message);
            return;
        }

        let Some(notifier) = self.notifier else {
            self.say("Plex token or library section ID missing in config. Skipping Plex scan.");
            return;
        };

        match notifier.trigger_rescan().await {
            Ok(()) => {
                self.say("Triggered Plex library scan successfully.");
                tracing::info!("Triggered Plex library scan successfully.");
            }
            Err(e) => {
                self.say(&format!("Failed to trigger Plex scan: {:#}", e));
                tracing::error!("Failed to trigger Plex scan: {:#}", e);
            }
        }
    }
}

fn target_name(target: &Path) -> String {
    target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFile, EnvOverrides};
    use crate::pacing::testing::RecordingPacer;
    use crate::services::lookup::testing::StubSource;
    use crate::services::plex::testing::CountingNotifier;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    const VIDEO_ID: &str = "dQw4w9WgXcQ";
    const LONG_TITLE: &str = "Test Video Title That Is Quite Long Indeed";

    struct Fixture {
        _tmp: tempfile::TempDir,
        videos: PathBuf,
        config: AppConfig,
    }

    fn fixture(edit: impl FnOnce(&mut ConfigFile)) -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let videos = tmp.path().join("videos");
        fs::create_dir_all(&videos).unwrap();

        let mut file = ConfigFile {
            directory_paths: Some(crate::config::DirectoryPaths::List(vec![videos
                .to_string_lossy()
                .into_owned()])),
            title_length_limit: 20,
            log_file_path: Some(tmp.path().join("renamer.log")),
            metadata_log: Some(tmp.path().join("processed.log")),
            wait_timer: 10.0,
            retry_delay: 5.0,
            ..Default::default()
        };
        edit(&mut file);

        let config =
            AppConfig::build(tmp.path().join("config.toml"), file, EnvOverrides::default())
                .unwrap();
        Fixture {
            _tmp: tmp,
            videos,
            config,
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"video").unwrap();
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn ledger_lines(config: &AppConfig) -> Vec<String> {
        fs::read_to_string(&config.ledger_path)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    #[derive(Default)]
    struct RecordingNarrator {
        lines: Mutex<Vec<String>>,
    }

    impl RecordingNarrator {
        fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl Narrator for RecordingNarrator {
        fn say(&self, line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }

    struct ScriptedConfirmer {
        answers: Mutex<Vec<bool>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedConfirmer {
        fn new(answers: Vec<bool>) -> Self {
            Self {
                answers: Mutex::new(answers),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl Confirmer for ScriptedConfirmer {
        fn confirm(&self, prompt: &str) -> bool {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let mut answers = self.answers.lock().unwrap();
            if answers.is_empty() {
                false
            } else {
                answers.remove(0)
            }
        }
    }

    #[tokio::test]
    async fn test_rename_end_to_end() {
        let fx = fixture(|_| {});
        touch(&fx.videos.join(format!("{}.mp4", VIDEO_ID)));

        let source = StubSource::new().with_title(VIDEO_ID, LONG_TITLE);
        let pacer = RecordingPacer::default();
        let notifier = CountingNotifier::default();

        let result = Renamer::new(&fx.config, &source, &pacer)
            .with_notifier(&notifier)
            .run()
            .await;

        assert_eq!(result.discovered, 1);
        assert_eq!(result.placed, 1);
        assert_eq!(file_names(&fx.videos), vec!["Test Video Title.mp4"]);
        assert_eq!(
            ledger_lines(&fx.config),
            vec![format!("{},Test Video Title.mp4", VIDEO_ID)]
        );
        assert_eq!(notifier.calls(), 1);
        assert_eq!(pacer.pauses(), vec![Duration::from_secs(10)]);
    }

    #[tokio::test]
    async fn test_rerun_skips_without_network() {
        let fx = fixture(|_| {});
        let original = fx.videos.join(format!("{}.mp4", VIDEO_ID));
        touch(&original);
        Ledger::new(&fx.config.ledger_path)
            .record(VIDEO_ID, "Earlier Title.mp4")
            .await
            .unwrap();

        let source = StubSource::new().with_title(VIDEO_ID, LONG_TITLE);
        let pacer = RecordingPacer::default();

        let result = Renamer::new(&fx.config, &source, &pacer).run().await;

        assert_eq!(result.already_processed, 1);
        assert!(source.calls().is_empty());
        assert!(original.exists());
        assert!(pacer.pauses().is_empty());
        assert_eq!(ledger_lines(&fx.config).len(), 1);
    }

    #[tokio::test]
    async fn test_renamed_output_not_looked_up_again() {
        let fx = fixture(|_| {});
        touch(&fx.videos.join(format!("{}.mp4", VIDEO_ID)));
        let source = StubSource::new().with_title(VIDEO_ID, LONG_TITLE);
        let pacer = RecordingPacer::default();

        let renamer = Renamer::new(&fx.config, &source, &pacer);
        renamer.run().await;
        let second = renamer.run().await;

        assert_eq!(second.already_processed, 1);
        assert_eq!(source.calls().len(), 1);
        assert_eq!(file_names(&fx.videos), vec!["Test Video Title.mp4"]);
    }

    #[tokio::test]
    async fn test_dry_run_changes_nothing() {
        let fx = fixture(|_| {});
        let original = fx.videos.join(format!("{}.mp4", VIDEO_ID));
        touch(&original);

        let source = StubSource::new().with_title(VIDEO_ID, LONG_TITLE);
        let pacer = RecordingPacer::default();
        let notifier = CountingNotifier::default();

        let result = Renamer::new(&fx.config, &source, &pacer)
            .with_notifier(&notifier)
            .dry_run(true)
            .run()
            .await;

        assert_eq!(result.placed, 1);
        assert!(original.exists());
        assert_eq!(file_names(&fx.videos).len(), 1);
        assert!(ledger_lines(&fx.config).is_empty());
        assert_eq!(notifier.calls(), 0);
        // Same pacing as a real run
        assert_eq!(pacer.pauses(), vec![Duration::from_secs(10)]);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_silent_skip() {
        let fx = fixture(|f| f.max_retries = 2);
        let original = fx.videos.join("unknownid.mp4");
        touch(&original);

        let source = StubSource::new();
        let pacer = RecordingPacer::default();

        let result = Renamer::new(&fx.config, &source, &pacer).run().await;

        assert_eq!(result.lookup_failed, 1);
        assert!(original.exists());
        assert!(ledger_lines(&fx.config).is_empty());
        // Only the retry delay, no inter-item wait
        assert_eq!(pacer.pauses(), vec![Duration::from_secs(5)]);
    }

    #[tokio::test]
    async fn test_collision_gets_suffix() {
        let fx = fixture(|f| f.filename_pattern = "{title}.mp4".to_string());
        touch(&fx.videos.join("Same Title.mp4"));
        touch(&fx.videos.join("aaa.mp4"));
        touch(&fx.videos.join("bbb.mp4"));

        let source = StubSource::new()
            .with_title("aaa", "Same Title")
            .with_title("bbb", "Same Title")
            .with_title("Same Title", "Same Title");
        let pacer = RecordingPacer::default();

        Renamer::new(&fx.config, &source, &pacer).run().await;

        assert_eq!(
            file_names(&fx.videos),
            vec!["Same Title.mp4", "Same Title_1.mp4", "Same Title_2.mp4"]
        );
        assert!(ledger_lines(&fx.config)
            .contains(&"aaa,Same Title_1.mp4".to_string()));
    }

    #[tokio::test]
    async fn test_dot_title_does_not_hide_file() {
        let fx = fixture(|f| f.filename_pattern = "{title}".to_string());
        touch(&fx.videos.join("aaa.mp4"));
        let source = StubSource::new().with_title("aaa", "..");
        let pacer = RecordingPacer::default();

        Renamer::new(&fx.config, &source, &pacer).run().await;

        assert_eq!(file_names(&fx.videos), vec!["unnamed_file"]);
    }

    #[tokio::test]
    async fn test_interactive_decline_skips_without_recording() {
        let fx = fixture(|_| {});
        touch(&fx.videos.join("aaa.mp4"));
        touch(&fx.videos.join("bbb.mp4"));

        let source = StubSource::new()
            .with_title("aaa", "First")
            .with_title("bbb", "Second");
        let pacer = RecordingPacer::default();
        let confirmer = ScriptedConfirmer::new(vec![false, true]);

        let result = Renamer::new(&fx.config, &source, &pacer)
            .with_confirmer(&confirmer)
            .run()
            .await;

        assert_eq!(result.declined, 1);
        assert_eq!(result.placed, 1);
        assert_eq!(file_names(&fx.videos), vec!["Second.mp4", "aaa.mp4"]);
        assert_eq!(ledger_lines(&fx.config), vec!["bbb,Second.mp4".to_string()]);
        assert_eq!(
            confirmer.prompts.lock().unwrap()[0],
            "Rename 'aaa.mp4' to 'First.mp4'?"
        );
    }

    #[tokio::test]
    async fn test_copy_into_channel_folders() {
        let tmp_dest = tempfile::tempdir().unwrap();
        let destination = tmp_dest.path().to_path_buf();
        let fx = fixture(|f| {
            f.destination_folder = Some(destination.clone());
            f.filename_pattern = "{channel_name} - {title}.mp4".to_string();
        });
        touch(&fx.videos.join("UCone").join("aaa.mp4"));
        touch(&fx.videos.join("UCone").join("bbb.mp4"));
        touch(&fx.videos.join("UCtwo").join("ccc.mp4"));

        let source = StubSource::new()
            .with_title("aaa", "First")
            .with_title("bbb", "Second")
            .with_title("ccc", "Third")
            .with_channel("UCone", "Channel One");
        let pacer = RecordingPacer::default();

        let result = Renamer::new(&fx.config, &source, &pacer).run().await;
        assert_eq!(result.placed, 3);

        // Originals stay put
        assert!(fx.videos.join("UCone").join("aaa.mp4").exists());
        assert_eq!(
            file_names(&destination.join("Channel One")),
            vec!["Channel One - First.mp4", "Channel One - Second.mp4"]
        );
        assert_eq!(
            file_names(&destination.join(UNKNOWN_CHANNEL)),
            vec!["Unknown - Third.mp4"]
        );

        // One channel lookup per folder
        let channel_calls: Vec<_> = source
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("channel:"))
            .collect();
        assert_eq!(channel_calls, vec!["channel:UCone", "channel:UCtwo"]);
    }

    #[tokio::test]
    async fn test_rescan_disabled_makes_no_call() {
        let fx = fixture(|f| f.trigger_rescan = false);
        let source = StubSource::new();
        let pacer = RecordingPacer::default();
        let notifier = CountingNotifier::default();

        Renamer::new(&fx.config, &source, &pacer)
            .with_notifier(&notifier)
            .run()
            .await;
        assert_eq!(notifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_rescan_without_credentials_prints_notice() {
        let fx = fixture(|_| {});
        let source = StubSource::new();
        let pacer = RecordingPacer::default();
        let narrator = RecordingNarrator::default();

        Renamer::new(&fx.config, &source, &pacer)
            .with_narrator(&narrator)
            .run()
            .await;

        assert!(narrator
            .lines()
            .contains(&"Plex token or library section ID missing in config. Skipping Plex scan.".to_string()));
    }

    #[tokio::test]
    async fn test_dry_run_narration_mirrors_real_run() {
        let fx = fixture(|_| {});
        touch(&fx.videos.join(format!("{}.mp4", VIDEO_ID)));
        let source = StubSource::new().with_title(VIDEO_ID, LONG_TITLE);
        let pacer = RecordingPacer::default();
        let notifier = CountingNotifier::default();

        let mut transcripts = Vec::new();
        for _ in 0..2 {
            let narrator = RecordingNarrator::default();
            Renamer::new(&fx.config, &source, &pacer)
                .with_notifier(&notifier)
                .with_narrator(&narrator)
                .dry_run(true)
                .run()
                .await;
            transcripts.push(narrator.lines());
        }
        assert_eq!(transcripts[0], transcripts[1]);
        let first = transcripts.remove(0);

        let real = RecordingNarrator::default();
        Renamer::new(&fx.config, &source, &pacer)
            .with_notifier(&notifier)
            .with_narrator(&real)
            .run()
            .await;

        let scanning = format!("\nScanning directory: {}", fx.videos.display());
        let processing = format!("\nProcessing video ID: {}", VIDEO_ID);
        assert_eq!(
            first,
            vec![
                scanning.clone(),
                processing.clone(),
                format!("[DRY RUN] Would rename '{}.mp4' to 'Test Video Title.mp4'", VIDEO_ID),
                "[DRY RUN] Would trigger Plex library scan".to_string(),
            ]
        );
        assert_eq!(
            real.lines(),
            vec![
                scanning,
                processing,
                format!("Renamed '{}.mp4' to 'Test Video Title.mp4'", VIDEO_ID),
                "Triggered Plex library scan successfully.".to_string(),
            ]
        );
        assert_eq!(notifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_run_log_truncated_after_item() {
        let fx = fixture(|f| f.max_log_entries = 2);
        fs::write(&fx.config.log_file_path, "one\ntwo\nthree\nfour\n").unwrap();
        touch(&fx.videos.join("aaa.mp4"));
        let source = StubSource::new().with_title("aaa", "First");
        let pacer = RecordingPacer::default();

        Renamer::new(&fx.config, &source, &pacer).run().await;

        assert_eq!(
            fs::read_to_string(&fx.config.log_file_path).unwrap(),
            "three\nfour\n"
        );
    }

    #[tokio::test]
    async fn test_rescan_failure_does_not_abort() {
        let fx = fixture(|_| {});
        touch(&fx.videos.join("aaa.mp4"));
        let source = StubSource::new().with_title("aaa", "First");
        let pacer = RecordingPacer::default();
        let notifier = CountingNotifier::failing();

        let result = Renamer::new(&fx.config, &source, &pacer)
            .with_notifier(&notifier)
            .run()
            .await;

        assert_eq!(result.placed, 1);
        assert_eq!(notifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_directory_is_skipped() {
        let fx = fixture(|f| {
            f.directory_paths = Some(crate::config::DirectoryPaths::Joined(
                "/definitely/not/here".to_string(),
            ))
        });
        let source = StubSource::new();
        let pacer = RecordingPacer::default();
        let notifier = CountingNotifier::default();

        let result = Renamer::new(&fx.config, &source, &pacer)
            .with_notifier(&notifier)
            .run()
            .await;

        assert_eq!(result, ScanResult::default());
        assert_eq!(notifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_ledger_disabled_reprocesses() {
        let fx = fixture(|f| f.use_ledger = false);
        touch(&fx.videos.join("aaa.mp4"));
        Ledger::new(&fx.config.ledger_path)
            .record("aaa", "Old.mp4")
            .await
            .unwrap();

        let source = StubSource::new().with_title("aaa", "First");
        let pacer = RecordingPacer::default();

        let result = Renamer::new(&fx.config, &source, &pacer).run().await;

        assert_eq!(result.placed, 1);
        assert_eq!(ledger_lines(&fx.config), vec!["aaa,Old.mp4".to_string()]);
    }

    #[tokio::test]
    async fn test_ledger_rotated_after_each_item() {
        let fx = fixture(|f| f.max_log_entries = 2);
        for id in ["aaa", "bbb", "ccc"] {
            touch(&fx.videos.join(format!("{}.mp4", id)));
        }
        let source = StubSource::new()
            .with_title("aaa", "One")
            .with_title("bbb", "Two")
            .with_title("ccc", "Three");
        let pacer = RecordingPacer::default();

        Renamer::new(&fx.config, &source, &pacer).run().await;

        assert_eq!(
            ledger_lines(&fx.config),
            vec!["bbb,Two.mp4".to_string(), "ccc,Three.mp4".to_string()]
        );
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("rename"), "Rename");
        assert_eq!(capitalize(""), "");
    }
}
