//! Configuration file (tailsync.toml) loading.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tailsync_core::SyncConfig;
use tailsync_workspace::{Formatter, FsGraphSource, NoopFormatter, WhitespaceFormatter};

/// Configuration file structure (tailsync.toml).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub workspace: WorkspaceSettings,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceSettings {
    /// Top-level folders scanned for projects
    #[serde(default = "default_project_dirs")]
    pub project_dirs: Vec<String>,

    /// Normalize whitespace in written files
    #[serde(default = "default_format")]
    pub format: bool,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            project_dirs: default_project_dirs(),
            format: default_format(),
        }
    }
}

fn default_project_dirs() -> Vec<String> {
    vec!["apps".to_string(), "packages".to_string(), "libs".to_string()]
}
fn default_format() -> bool {
    true
}

/// A workspace root together with its loaded configuration.
#[derive(Debug)]
pub struct Workspace {
    pub root: PathBuf,
    pub config: ConfigFile,
}

impl Workspace {
    /// Load configuration for the workspace at `root`.
    ///
    /// A relative `config_path` is resolved against `root`. A missing file
    /// yields defaults; a malformed one is an error.
    pub fn load(root: &Path, config_path: &Path) -> Result<Self> {
        let path = if config_path.is_absolute() {
            config_path.to_path_buf()
        } else {
            root.join(config_path)
        };

        let config = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: ConfigFile = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            tracing::info!("Loaded config from {}", path.display());
            config
        } else {
            ConfigFile::default()
        };

        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    pub fn sync_config(&self) -> SyncConfig {
        self.config.sync.clone()
    }

    /// Project graph source for this workspace.
    pub fn graph_source(&self) -> FsGraphSource {
        FsGraphSource::new(&self.root)
            .with_project_dirs(self.config.workspace.project_dirs.clone())
            .with_apps_dir(self.config.sync.apps_dir.to_string_lossy())
    }

    /// Formatter applied after a run.
    pub fn formatter(&self) -> Box<dyn Formatter> {
        if self.config.workspace.format {
            Box::new(WhitespaceFormatter::new())
        } else {
            Box::new(NoopFormatter)
        }
    }

    /// Directories whose changes can affect the sync result.
    pub fn watch_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .config
            .workspace
            .project_dirs
            .iter()
            .map(|dir| self.root.join(dir))
            .collect();

        for dir in [&self.config.sync.apps_dir, &self.config.sync.packages_dir] {
            let path = self.root.join(dir);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        paths
    }
}
