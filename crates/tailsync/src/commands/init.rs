//! Initialize tailsync in a workspace.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(root: &Path, config_path: &Path, yes: bool) -> Result<()> {
    let path = root.join(config_path);

    if path.exists() && !yes {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            path.display()
        );
        return Ok(());
    }

    fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Created {}", path.display());
    tracing::info!("Run 'tailsync sync' to update your stylesheets.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# tailsync configuration

[sync]
# Folder containing applications
apps_dir = "apps"

# Folder containing workspace packages
packages_dir = "packages"

# Stylesheet location inside each application
source_dir = "src/app"
stylesheet = "globals.css"

# Dependency manifest inside each application
manifest = "package.json"

# Version marking a workspace-local dependency
workspace_protocol = "workspace:*"

# Module imported by the anchor line: @import "tailwindcss";
anchor = "tailwindcss"

[workspace]
# Top-level folders scanned for projects
project_dirs = ["apps", "packages", "libs"]

# Normalize trailing whitespace in written files
format = true
"#;
