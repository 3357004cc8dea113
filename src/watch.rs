//! Score file watcher. Reloads the PDF when it is rewritten on disk.
//!
//! notify::RecommendedWatcher runs callbacks on an internal thread; events
//! are forwarded to the viewer thread over an mpsc channel. Engravers often
//! write a PDF in several bursts, so a change is only reported once the
//! file has been quiet for the settle interval.

use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Result;
use log::debug;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

pub struct FileWatcher {
    rx: mpsc::Receiver<()>,
    settle: Settle,
    _watcher: RecommendedWatcher, // Drop stops watching
}

impl FileWatcher {
    /// Watch `path` for modification, creation or replacement.
    ///
    /// inotify loses the watch when the file is replaced by rename, so the
    /// parent directory is watched (NonRecursive) and events are filtered
    /// by path.
    pub fn new(path: &Path, settle: Duration) -> Result<Self> {
        let canonical = path.canonicalize()?;
        let target = canonical.clone();
        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| {
                if let Ok(event) = res {
                    let ours = event.paths.iter().any(|p| p == &target);
                    if ours && (event.kind.is_modify() || event.kind.is_create()) {
                        let _ = tx.send(());
                    }
                }
            },
            notify::Config::default(),
        )?;
        let parent = canonical
            .parent()
            .ok_or_else(|| anyhow::anyhow!("cannot watch root path"))?;
        watcher.watch(parent, RecursiveMode::NonRecursive)?;
        debug!("watch: {} (settle {}ms)", canonical.display(), settle.as_millis());

        Ok(Self {
            rx,
            settle: Settle::new(settle),
            _watcher: watcher,
        })
    }

    /// Non-blocking. True once per burst of changes, after it has settled.
    pub fn poll(&mut self, now: Instant) -> bool {
        while self.rx.try_recv().is_ok() {
            self.settle.touch(now);
        }
        self.settle.ready(now)
    }

    /// Upper bound on how long the caller may go without polling.
    pub fn interval(&self) -> Duration {
        self.settle.interval
    }

    /// When `poll` should next be called to catch a settling burst.
    pub fn deadline(&self) -> Option<Instant> {
        self.settle.deadline()
    }
}

/// Quiet-period detector: `touch` on every event, `ready` fires once the
/// last event is at least `interval` old.
#[derive(Debug)]
struct Settle {
    interval: Duration,
    last_event: Option<Instant>,
}

impl Settle {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_event: None,
        }
    }

    fn touch(&mut self, now: Instant) {
        self.last_event = Some(now);
    }

    fn deadline(&self) -> Option<Instant> {
        self.last_event.map(|t| t + self.interval)
    }

    fn ready(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(d) if now >= d => {
                self.last_event = None;
                true
            }
            _ => false,
        }
    }
}
