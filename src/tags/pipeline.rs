//! Debounced background re-tagging
//!
//! Keystrokes arm a single-shot timer. When it fires, the open pages are
//! written to the snapshot directory, the parser runs over it in the
//! background, and its elements are fanned out to every page together with
//! the firmware library elements parsed once at startup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::IdeConfig;
use crate::errors::Result;
use crate::models::{ElementSet, SourceElement};
use crate::tags::debounce::{Clock, Debouncer, SystemClock};
use crate::tags::page::EditorPage;
use crate::tags::parser::CodeParser;
use crate::tags::snapshot::TagSnapshot;

/// Notified after every successful parse cycle, in registration order
pub trait TagsListener: Send {
    fn handle_tags_ready(&mut self, elements: &ElementSet);
}

impl<F> TagsListener for F
where
    F: FnMut(&ElementSet) + Send,
{
    fn handle_tags_ready(&mut self, elements: &ElementSet) {
        self(elements)
    }
}

/// Result of one background parse
#[derive(Debug)]
pub struct ParseOutcome {
    pub cycle: u64,
    pub result: Result<Vec<SourceElement>>,
}

pub struct TagPipeline<C: Clock = SystemClock> {
    snapshot: TagSnapshot,
    debouncer: Debouncer<C>,
    parser: Arc<dyn CodeParser>,
    outcomes_tx: mpsc::UnboundedSender<ParseOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<ParseOutcome>,
    elements: ElementSet,
    library: ElementSet,
    cycles: u64,
    in_flight: Option<u64>,
    deferred: bool,
    listeners: Vec<Box<dyn TagsListener>>,
}

impl TagPipeline<SystemClock> {
    pub fn new(config: &IdeConfig, parser: Arc<dyn CodeParser>) -> Self {
        Self::with_clock(
            config.tags_dir(),
            config.debounce_window(),
            parser,
            SystemClock,
        )
    }
}

impl<C: Clock> TagPipeline<C> {
    pub fn with_clock(
        snapshot_dir: impl Into<PathBuf>,
        window: Duration,
        parser: Arc<dyn CodeParser>,
        clock: C,
    ) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        Self {
            snapshot: TagSnapshot::new(snapshot_dir),
            debouncer: Debouncer::new(window, clock),
            parser,
            outcomes_tx,
            outcomes_rx,
            elements: ElementSet::default(),
            library: ElementSet::default(),
            cycles: 0,
            in_flight: None,
            deferred: false,
            listeners: Vec::new(),
        }
    }

    pub fn add_listener(&mut self, listener: impl TagsListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Elements of the last completed cycle
    pub fn elements(&self) -> &ElementSet {
        &self.elements
    }

    /// Elements of the firmware library headers, never replaced by a cycle
    pub fn library(&self) -> &ElementSet {
        &self.library
    }

    /// Parse the library headers in `dir`. A missing directory or a failed
    /// parse leaves the pages with project elements only.
    pub async fn load_library(&mut self, dir: &Path) -> bool {
        if !dir.is_dir() {
            log::debug!("No library headers at {}", dir.display());
            return false;
        }

        match self.parser.parse(dir).await {
            Ok(elements) => {
                log::info!(
                    "Loaded {} library element(s) from {}",
                    elements.len(),
                    dir.display()
                );
                self.library = ElementSet::new(elements);
                true
            }
            Err(e) => {
                log::warn!("Failed to tag library headers in {}: {}", dir.display(), e);
                false
            }
        }
    }

    /// Give a newly opened page everything known so far
    pub fn setup_page<P: EditorPage>(&self, page: &mut P) {
        let merged = self.merged_elements();
        page.replace_completions(&merged);
        page.replace_highlight_elements(&merged);
        page.rehighlight();
    }

    /// Project elements followed by the library elements
    fn merged_elements(&self) -> Vec<SourceElement> {
        self.elements
            .all()
            .iter()
            .chain(self.library.all())
            .cloned()
            .collect()
    }

    /// Number of snapshot+parse cycles started so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn is_parsing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn snapshot(&self) -> &TagSnapshot {
        &self.snapshot
    }

    pub fn debouncer(&self) -> &Debouncer<C> {
        &self.debouncer
    }

    /// A keystroke in any open page restarts the quiescence window
    pub fn key_pressed(&mut self) {
        self.debouncer.arm();
    }

    /// Check the timer and start a cycle if it fired. A firing while a parse
    /// is still running is held back until that parse has been applied.
    pub fn poll_timer<P: EditorPage>(&mut self, pages: &[P]) -> bool {
        if !self.debouncer.poll() {
            return false;
        }
        if self.in_flight.is_some() {
            log::debug!("Parse still running, deferring re-tag");
            self.deferred = true;
            return false;
        }
        self.start_cycle(pages)
    }

    /// Snapshot the pages and launch the parser in the background
    pub fn start_cycle<P: EditorPage>(&mut self, pages: &[P]) -> bool {
        let report = match self.snapshot.write(pages) {
            Ok(report) => report,
            Err(e) => {
                log::error!("Tagging cycle aborted: {}", e);
                return false;
            }
        };
        if !report.failed.is_empty() {
            log::warn!(
                "{} page(s) missing from the tag snapshot",
                report.failed.len()
            );
        }

        self.cycles += 1;
        let cycle = self.cycles;
        self.in_flight = Some(cycle);

        let parser = self.parser.clone();
        let dir = self.snapshot.dir().to_path_buf();
        let tx = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let result = parser.parse(&dir).await;
            let _ = tx.send(ParseOutcome { cycle, result });
        });

        log::debug!("Tagging cycle {} started", cycle);
        true
    }

    /// Wait for the running parse to complete
    pub async fn next_outcome(&mut self) -> Option<ParseOutcome> {
        self.outcomes_rx.recv().await
    }

    /// Fan a parse outcome out to the pages. Returns whether new elements
    /// were applied.
    pub fn apply<P: EditorPage>(&mut self, outcome: ParseOutcome, pages: &mut [P]) -> bool {
        if self.in_flight != Some(outcome.cycle) {
            log::debug!("Dropping outcome of stale cycle {}", outcome.cycle);
            return false;
        }
        self.in_flight = None;

        let applied = match outcome.result {
            Ok(elements) => {
                self.elements = ElementSet::new(elements);
                let merged = self.merged_elements();
                for page in pages.iter_mut() {
                    // Leave an in-progress completion selection alone
                    if !page.completion_popup_visible() {
                        page.replace_completions(&merged);
                    }
                    page.replace_highlight_elements(&merged);
                    page.rehighlight();
                }
                for listener in &mut self.listeners {
                    listener.handle_tags_ready(&self.elements);
                }
                log::debug!(
                    "Cycle {} applied {} element(s) to {} page(s)",
                    outcome.cycle,
                    self.elements.len(),
                    pages.len()
                );
                true
            }
            Err(e) => {
                log::warn!("Tagging cycle {} failed: {}", outcome.cycle, e);
                false
            }
        };

        if std::mem::take(&mut self.deferred) {
            self.start_cycle(&*pages);
        }
        applied
    }

    /// Run one full cycle immediately and apply its outcome
    pub async fn run_cycle<P: EditorPage>(&mut self, pages: &mut [P]) -> bool {
        self.debouncer.cancel();
        if !self.start_cycle(&*pages) {
            return false;
        }
        while self.in_flight.is_some() {
            match self.next_outcome().await {
                Some(outcome) => {
                    if self.apply(outcome, pages) && self.in_flight.is_none() {
                        return true;
                    }
                }
                None => return false,
            }
        }
        false
    }
}
