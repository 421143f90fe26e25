//! File watching for rebuilds.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Quiet period that closes a batch of changes.
const QUIET_PERIOD: Duration = Duration::from_millis(100);

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Template or fragment (`.html`) was modified
    TemplateModified(PathBuf),

    /// Script payload was modified
    ScriptModified(PathBuf),

    /// File was created
    Created(PathBuf),

    /// File was deleted
    Deleted(PathBuf),

    /// Generic modification
    Modified(PathBuf),
}

impl WatchEvent {
    /// The path the event is about.
    pub fn path(&self) -> &Path {
        match self {
            Self::TemplateModified(path)
            | Self::ScriptModified(path)
            | Self::Created(path)
            | Self::Deleted(path)
            | Self::Modified(path) => path,
        }
    }
}

/// File watcher for detecting changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Create a new file watcher for the given paths.
    ///
    /// Returns the watcher and a channel of change batches. A batch is sent
    /// once no relevant change has arrived for 100ms, so the last save of a
    /// burst is always part of a batch.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<Vec<WatchEvent>>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            }
        }

        std::thread::spawn(move || {
            let mut debouncer = Debouncer::new(QUIET_PERIOD);

            loop {
                let received = match debouncer.remaining(Instant::now()) {
                    Some(wait) => sync_rx.recv_timeout(wait),
                    None => sync_rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
                };

                match received {
                    Ok(event) => debouncer.push(&event, Instant::now()),
                    Err(RecvTimeoutError::Timeout) => {
                        if async_tx.blocking_send(debouncer.take()).is_err() {
                            return;
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        let batch = debouncer.take();
                        if !batch.is_empty() {
                            let _ = async_tx.blocking_send(batch);
                        }
                        return;
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Trailing-edge debouncer collecting classified events into one batch.
#[derive(Debug)]
struct Debouncer {
    quiet: Duration,
    pending: Vec<WatchEvent>,
    deadline: Option<Instant>,
}

impl Debouncer {
    fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: Vec::new(),
            deadline: None,
        }
    }

    /// Add a raw event. Events that classify to nothing (such as file access)
    /// neither join the batch nor extend the quiet period.
    fn push(&mut self, event: &notify::Event, now: Instant) {
        let mut relevant = false;

        for path in &event.paths {
            if let Some(e) = classify_event(path, &event.kind) {
                relevant = true;
                if !self.pending.contains(&e) {
                    self.pending.push(e);
                }
            }
        }

        if relevant {
            self.deadline = Some(now + self.quiet);
        }
    }

    /// Time left until the pending batch is due, `None` when nothing is
    /// pending.
    fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    fn take(&mut self) -> Vec<WatchEvent> {
        self.deadline = None;
        std::mem::take(&mut self.pending)
    }
}

/// Classify a notify event into a WatchEvent.
fn classify_event(path: &Path, kind: &notify::EventKind) -> Option<WatchEvent> {
    use notify::EventKind;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    match kind {
        EventKind::Create(_) => Some(WatchEvent::Created(path.to_path_buf())),
        EventKind::Remove(_) => Some(WatchEvent::Deleted(path.to_path_buf())),
        EventKind::Modify(_) => match ext {
            "html" | "htm" => Some(WatchEvent::TemplateModified(path.to_path_buf())),
            "js" | "mjs" => Some(WatchEvent::ScriptModified(path.to_path_buf())),
            _ => Some(WatchEvent::Modified(path.to_path_buf())),
        },
        _ => None,
    }
}
