//! Application wiring: load, synchronize, report, and the watch loop.
//!
//! Single-shot mode runs one pass and prints the report. Watch mode keeps
//! running: file-system changes feed the scheduler, the scheduler debounces
//! them, and each due pass reloads the document, synchronizes it, and
//! reprints the report.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::align::{self, report::AlignmentReport};
use crate::document::Document;
use crate::scheduler::SyncScheduler;
use crate::watcher::FileWatcher;

/// How often the watch loop polls for file events and due passes.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Owns the run configuration and drives passes.
pub struct App {
    file_path: PathBuf,
    watch_enabled: bool,
    json_output: bool,
    check_mode: bool,
    debounce_ms: u64,
    recheck_ms: u64,
}

impl App {
    /// Create an application for the given document file.
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            watch_enabled: false,
            json_output: false,
            check_mode: false,
            debounce_ms: SyncScheduler::DEFAULT_DEBOUNCE_MS,
            recheck_ms: SyncScheduler::DEFAULT_RECHECK_MS,
        }
    }

    /// Enable or disable watch mode.
    pub const fn with_watch(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    /// Emit JSON instead of the text report.
    pub const fn with_json(mut self, enabled: bool) -> Self {
        self.json_output = enabled;
        self
    }

    /// Report stale styles instead of synchronizing.
    pub const fn with_check(mut self, enabled: bool) -> Self {
        self.check_mode = enabled;
        self
    }

    /// Override the change debounce window.
    pub const fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Override the late re-check delay.
    pub const fn with_recheck_ms(mut self, ms: u64) -> Self {
        self.recheck_ms = ms;
        self
    }

    /// Run the application; returns the process exit code.
    ///
    /// # Errors
    /// Returns an error if the document cannot be read or parsed on the
    /// initial pass, or the watcher cannot be created in watch mode.
    pub fn run(&self) -> Result<i32> {
        if self.check_mode {
            return self.run_check();
        }

        let mut doc = self.load_document()?;
        align::synchronize(&mut doc);
        println!("{}", self.render_report(&doc)?);

        if !self.watch_enabled {
            return Ok(0);
        }
        self.watch_loop(doc)
    }

    /// Check mode: report nodes whose applied style disagrees with a fresh
    /// pass. Exit code 1 when drift is found.
    fn run_check(&self) -> Result<i32> {
        let doc = self.load_document()?;
        let stale = align::check_stale(&doc);
        if self.json_output {
            println!("{}", serde_json::to_string_pretty(&stale)?);
        } else if stale.is_empty() {
            println!("styles are consistent");
        } else {
            for entry in &stale {
                println!(
                    "<{}> has text-align {}, expected {}",
                    entry.tag,
                    entry.found.as_deref().unwrap_or("(none)"),
                    entry.expected.as_deref().unwrap_or("(none)"),
                );
            }
        }
        Ok(i32::from(!stale.is_empty()))
    }

    fn watch_loop(&self, mut doc: Document) -> Result<i32> {
        let mut watcher = FileWatcher::new(&self.file_path)
            .with_context(|| format!("Failed to watch {}", self.file_path.display()))?;
        let mut scheduler = SyncScheduler::new(self.debounce_ms, self.recheck_ms);
        let start = Instant::now();
        scheduler.start(0);
        // The initial pass already ran; consume the queued startup pass.
        scheduler.take_ready(0);

        loop {
            std::thread::sleep(POLL_INTERVAL);
            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            if watcher.poll_changed() {
                scheduler.notify(now_ms);
            }
            while let Some(reason) = scheduler.take_ready(now_ms) {
                debug!(?reason, "pass due");
                match self.load_document() {
                    Ok(reloaded) => doc = reloaded,
                    Err(err) => {
                        // Keep showing the previous consistent state.
                        warn!(%err, "reload failed, keeping previous document");
                        continue;
                    }
                }
                align::synchronize(&mut doc);
                println!("{}", self.render_report(&doc)?);
            }
        }
    }

    fn load_document(&self) -> Result<Document> {
        let source = std::fs::read_to_string(&self.file_path)
            .with_context(|| format!("Failed to read {}", self.file_path.display()))?;
        Document::parse(&source)
            .with_context(|| format!("Failed to parse {}", self.file_path.display()))
    }

    fn render_report(&self, doc: &Document) -> Result<String> {
        let report = AlignmentReport::from_document(doc);
        if self.json_output {
            Ok(report.to_json()?)
        } else {
            Ok(report.to_string().trim_end().to_string())
        }
    }
}
