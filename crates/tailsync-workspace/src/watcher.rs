//! File watching for continuous sync.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

use crate::graph::{PACKAGE_FILE, PROJECT_FILE};

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A package.json or project.json changed
    ManifestChanged(PathBuf),

    /// A stylesheet was modified
    StylesheetChanged(PathBuf),

    /// A directory or file appeared
    Created(PathBuf),

    /// A directory or file was removed
    Deleted(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &Path {
        match self {
            WatchEvent::ManifestChanged(p)
            | WatchEvent::StylesheetChanged(p)
            | WatchEvent::Created(p)
            | WatchEvent::Deleted(p) => p,
        }
    }
}

/// Drops repeats of the same event that arrive within a short window.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last: Option<(Instant, WatchEvent)>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Whether `event` seen at `now` should be forwarded.
    pub fn accept(&mut self, event: &WatchEvent, now: Instant) -> bool {
        let repeated = self.last.as_ref().is_some_and(|(at, previous)| {
            previous == event && now.duration_since(*at) < self.window
        });

        if !repeated {
            self.last = Some((now, event.clone()));
        }
        !repeated
    }
}

/// Watches workspace directories and reports sync-relevant changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Start watching `paths`, skipping any that do not exist.
    ///
    /// Classified, debounced events arrive on the returned receiver.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (raw_tx, raw_rx) = mpsc::channel::<notify::Event>();
        let (tx, rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = raw_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths.iter().filter(|p| p.exists()) {
            watcher
                .watch(path, RecursiveMode::Recursive)
                .map_err(std::io::Error::other)?;
        }

        std::thread::Builder::new()
            .name("tailsync-watch".to_string())
            .spawn(move || forward(raw_rx, tx))?;

        Ok((Self { _watcher: watcher }, rx))
    }
}

/// Classify raw notify events and pass them on until either side hangs up.
fn forward(raw: mpsc::Receiver<notify::Event>, tx: async_mpsc::Sender<WatchEvent>) {
    // Editors often emit several events per save
    let mut debouncer = Debouncer::new(Duration::from_millis(100));

    for event in raw {
        let classified = event
            .paths
            .iter()
            .filter_map(|path| classify_event(path, &event.kind));

        for watch_event in classified {
            if !debouncer.accept(&watch_event, Instant::now()) {
                continue;
            }
            if tx.blocking_send(watch_event).is_err() {
                return;
            }
        }
    }
}

/// Classify a notify event into a WatchEvent.
///
/// Anything under `node_modules` and any file that cannot affect the sync
/// result is ignored.
pub fn classify_event(path: &Path, kind: &notify::EventKind) -> Option<WatchEvent> {
    use notify::EventKind;

    if path.components().any(|c| c.as_os_str() == "node_modules") {
        return None;
    }

    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let is_manifest = file_name == PACKAGE_FILE || file_name == PROJECT_FILE;

    match kind {
        EventKind::Create(_) | EventKind::Modify(_) if is_manifest => {
            Some(WatchEvent::ManifestChanged(path.to_path_buf()))
        }
        EventKind::Create(_) => Some(WatchEvent::Created(path.to_path_buf())),
        EventKind::Remove(_) => Some(WatchEvent::Deleted(path.to_path_buf())),
        EventKind::Modify(_) if ext == "css" => {
            Some(WatchEvent::StylesheetChanged(path.to_path_buf()))
        }
        _ => None,
    }
}
