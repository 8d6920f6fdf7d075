//! Continuous sync on workspace changes.

use std::time::Duration;

use anyhow::{Context, Result};
use tailsync_workspace::{FileWatcher, WatchEvent};

use crate::commands::sync::sync_once;
use crate::config::Workspace;

/// Quiet period collecting follow-up events before re-syncing.
const SETTLE: Duration = Duration::from_millis(200);

/// Run the watch command until interrupted.
pub async fn run(workspace: &Workspace) -> Result<()> {
    sync_once(workspace, None, false)?;

    let paths = workspace.watch_paths();
    let (watcher, mut rx) = FileWatcher::new(&paths).context("Failed to start file watcher")?;

    tracing::info!("Watching {} director(ies) for changes", paths.len());

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    tracing::warn!("File watcher stopped");
                    break;
                };

                let mut batch = vec![event];
                tokio::time::sleep(SETTLE).await;
                while let Ok(event) = rx.try_recv() {
                    batch.push(event);
                }

                if !batch.iter().any(|e| is_relevant(workspace, e)) {
                    continue;
                }

                for e in &batch {
                    tracing::debug!("Changed: {}", e.path().display());
                }
                tracing::debug!("Re-syncing after {} change(s)", batch.len());
                if let Err(e) = sync_once(workspace, None, false) {
                    tracing::warn!("Sync failed: {:#}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping watcher");
                break;
            }
        }
    }

    drop(watcher);
    Ok(())
}

/// Whether an event can change what the synchronizer writes.
///
/// Stylesheet edits only matter for the configured stylesheet filename; our
/// own writes re-trigger a run that finds nothing to do.
fn is_relevant(workspace: &Workspace, event: &WatchEvent) -> bool {
    match event {
        WatchEvent::StylesheetChanged(path) => path
            .file_name()
            .is_some_and(|name| name == workspace.config.sync.stylesheet.as_str()),
        WatchEvent::ManifestChanged(_) | WatchEvent::Created(_) | WatchEvent::Deleted(_) => true,
    }
}
