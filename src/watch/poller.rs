/// Directory poller state machine
///
/// Running: every `interval`, count matching files in `dir`. Report
/// `Progress` until the count reaches `total_expected`, then report a final
/// `Progress { total, total }` followed by `Done` and stop.
///
/// The poller owns its counter, runs as its own tokio task and talks to the
/// caller only through a channel. Listing failures are logged and retried;
/// they never end the task.

use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::TransientIoError;
use crate::files;

/// Poll interval used unless the caller overrides it
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Consecutive listing failures before a `Stalled` event is reported
pub const DEFAULT_STALL_AFTER: u32 = 25;

/// Which directory entries count as finished outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFilter {
    /// Segmentation images or `.npz` arrays
    Segmentations,
    /// Any image
    Images,
    /// Model checkpoints (`.pkl`)
    Models,
    /// Files with this extension
    Extension(String),
}

impl OutputFilter {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            OutputFilter::Segmentations => files::is_segmentation_output(name),
            OutputFilter::Images => files::is_image(name),
            OutputFilter::Models => files::is_model_file(name),
            OutputFilter::Extension(ext) => files::has_extension(name, ext),
        }
    }
}

/// What to watch and when to stop
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub dir: PathBuf,
    pub filter: OutputFilter,
    pub total_expected: usize,
    pub interval: Duration,
    pub stall_after: u32,
}

impl WatchConfig {
    pub fn new(dir: PathBuf, filter: OutputFilter, total_expected: usize) -> Self {
        Self {
            dir,
            filter,
            total_expected,
            interval: DEFAULT_POLL_INTERVAL,
            stall_after: DEFAULT_STALL_AFTER,
        }
    }

    /// Segmentation run: one output per submitted image
    pub fn segmentation(seg_dir: PathBuf, total_images: usize) -> Self {
        Self::new(seg_dir, OutputFilter::Segmentations, total_images)
    }

    /// Training: one checkpoint per finished epoch
    pub fn models(models_dir: PathBuf, total_models: usize) -> Self {
        Self::new(models_dir, OutputFilter::Models, total_models)
    }

    /// Dataset extension: images arriving in a dataset directory
    pub fn dataset(dataset_dir: PathBuf, total_images: usize) -> Self {
        Self::new(dataset_dir, OutputFilter::Images, total_images)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_stall_after(mut self, failures: u32) -> Self {
        self.stall_after = failures;
        self
    }
}

/// Events delivered to the owner of a poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    /// `observed` never decreases and never exceeds `total`
    Progress { observed: usize, total: usize },
    /// Listing has failed `failures` times in a row. Sent once per stall;
    /// polling continues.
    Stalled { failures: u32 },
    /// All expected outputs exist. Always the last event.
    Done,
}

/// Owner's end of a running poller.
///
/// Dropping the handle cancels the poller.
#[derive(Debug)]
pub struct WatchHandle {
    events: mpsc::UnboundedReceiver<WatchEvent>,
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Next event, or `None` once the poller has stopped
    pub async fn next(&mut self) -> Option<WatchEvent> {
        self.events.recv().await
    }

    /// Next event if one is already queued
    pub fn try_next(&mut self) -> Option<WatchEvent> {
        self.events.try_recv().ok()
    }

    /// Stop the poller. Events still queued are discarded, so nothing is
    /// observed after this returns. The worker is not told.
    pub fn cancel(&mut self) {
        let _ = self.cancel.send(true);
        self.events.close();
        while self.events.try_recv().is_ok() {}
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Collect every remaining event until the poller stops
    pub async fn collect(mut self) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        events
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        let _ = self.cancel.send(true);
    }
}

/// Start polling in a new task. Must be called from within a tokio runtime.
pub fn spawn_watch(config: WatchConfig) -> WatchHandle {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let task = tokio::spawn(run_watch(config, events_tx, cancel_rx));

    WatchHandle {
        events: events_rx,
        cancel: cancel_tx,
        task,
    }
}

async fn run_watch(
    config: WatchConfig,
    events: mpsc::UnboundedSender<WatchEvent>,
    mut cancel: watch::Receiver<bool>,
) {
    let total = config.total_expected;
    let stall_after = config.stall_after.max(1);

    if total == 0 {
        emit(&events, &cancel, WatchEvent::Done);
        return;
    }

    tracing::debug!(dir = %config.dir.display(), total, "watch started");

    let mut observed = 0;
    let mut failures = 0u32;
    let mut stalled = false;

    loop {
        match count_outputs(&config).await {
            Ok(count) => {
                if stalled {
                    tracing::info!(dir = %config.dir.display(), "listing recovered");
                }
                failures = 0;
                stalled = false;

                if count >= total {
                    if emit(&events, &cancel, WatchEvent::Progress { observed: total, total }) {
                        emit(&events, &cancel, WatchEvent::Done);
                    }
                    tracing::debug!(dir = %config.dir.display(), total, "watch done");
                    return;
                }

                observed = observed.max(count);
                if !emit(&events, &cancel, WatchEvent::Progress { observed, total }) {
                    return;
                }
            }
            Err(err) => {
                failures += 1;
                tracing::warn!(failures, "{}", err);

                if failures >= stall_after && !stalled {
                    stalled = true;
                    if !emit(&events, &cancel, WatchEvent::Stalled { failures }) {
                        return;
                    }
                }
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            // Fires on cancel and when the handle is gone
            _ = cancel.changed() => return,
        }
    }
}

/// Send unless cancelled. Returns false when the poller should stop.
fn emit(
    events: &mpsc::UnboundedSender<WatchEvent>,
    cancel: &watch::Receiver<bool>,
    event: WatchEvent,
) -> bool {
    if *cancel.borrow() {
        return false;
    }
    events.send(event).is_ok()
}

async fn count_outputs(config: &WatchConfig) -> Result<usize, TransientIoError> {
    let dir = config.dir.clone();
    let filter = config.filter.clone();

    let listing = tokio::task::spawn_blocking(move || {
        files::ls_matching(&dir, |name| filter.matches(name)).map(|names| names.len())
    })
    .await;

    match listing {
        Ok(Ok(count)) => Ok(count),
        Ok(Err(source)) => Err(TransientIoError {
            path: config.dir.clone(),
            source,
        }),
        Err(join_err) => Err(TransientIoError {
            path: config.dir.clone(),
            source: std::io::Error::other(join_err),
        }),
    }
}
