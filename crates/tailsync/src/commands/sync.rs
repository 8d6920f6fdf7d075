//! One-shot sync command.

use anyhow::Result;
use tailsync_core::SourceSync;
use tailsync_workspace::{ChangeKind, FileChange, FsTree, Tree};

use crate::config::Workspace;

/// Run the sync command.
pub async fn run(workspace: &Workspace, project: Option<String>, dry_run: bool) -> Result<()> {
    let changes = sync_once(workspace, project.as_deref(), dry_run)?;

    if changes.is_empty() {
        tracing::info!("All stylesheets are in sync");
    } else if dry_run {
        tracing::info!("Dry run, {} file(s) would change", changes.len());
    }

    Ok(())
}

/// Run the synchronizer and commit its changes unless `dry_run` is set.
pub fn sync_once(
    workspace: &Workspace,
    project: Option<&str>,
    dry_run: bool,
) -> Result<Vec<FileChange>> {
    let graph = workspace.graph_source();
    let formatter = workspace.formatter();
    let sync = SourceSync::new(workspace.sync_config(), &graph, formatter.as_ref());

    let mut tree = FsTree::new(&workspace.root);
    let result = sync.run(&mut tree, project)?;

    if let Some(message) = result.and_then(|r| r.out_of_sync_message) {
        tracing::info!("{}", message);
    }

    let changes = if dry_run {
        tree.changes()
    } else {
        tree.commit()?
    };

    for change in &changes {
        let verb = match (change.kind, dry_run) {
            (ChangeKind::Create, false) => "CREATE",
            (ChangeKind::Update, false) => "UPDATE",
            (ChangeKind::Create, true) => "WOULD CREATE",
            (ChangeKind::Update, true) => "WOULD UPDATE",
        };
        tracing::info!("{} {}", verb, change.path.display());
    }

    Ok(changes)
}
