//! Check that every stylesheet is in sync without writing anything.

use anyhow::{bail, Result};
use tailsync_core::SourceSync;
use tailsync_workspace::FsTree;

use crate::config::Workspace;

/// Run the check command.
pub async fn run(workspace: &Workspace) -> Result<()> {
    let out_of_sync = out_of_sync_apps(workspace)?;

    if out_of_sync.is_empty() {
        tracing::info!("All stylesheets are in sync");
        return Ok(());
    }

    bail!(
        "{} app(s) out of sync: {}. Run 'tailsync sync' to fix.",
        out_of_sync.len(),
        out_of_sync.join(", ")
    )
}

/// Names of applications a sync would update.
pub fn out_of_sync_apps(workspace: &Workspace) -> Result<Vec<String>> {
    let graph = workspace.graph_source();
    let formatter = workspace.formatter();
    let sync = SourceSync::new(workspace.sync_config(), &graph, formatter.as_ref());

    let mut tree = FsTree::new(&workspace.root);
    let result = sync.sync_all(&mut tree)?;

    Ok(result.updated().map(|app| app.name.clone()).collect())
}
