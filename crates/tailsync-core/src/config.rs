//! Synchronizer settings.

use std::path::PathBuf;

use serde::Deserialize;

/// Directive keyword recognised and emitted by the rewriter.
pub const DIRECTIVE_KEYWORD: &str = "@source";

/// Paths and literals the synchronizer works with.
///
/// All paths are relative to the workspace root, except `source_dir`,
/// `stylesheet` and `manifest`, which are relative to an application root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Folder containing applications
    #[serde(default = "default_apps_dir")]
    pub apps_dir: PathBuf,

    /// Folder containing workspace packages
    #[serde(default = "default_packages_dir")]
    pub packages_dir: PathBuf,

    /// Directory directives are computed relative to
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Stylesheet filename inside `source_dir`
    #[serde(default = "default_stylesheet")]
    pub stylesheet: String,

    /// Dependency manifest filename
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Version constraint marking a workspace-local dependency
    #[serde(default = "default_workspace_protocol")]
    pub workspace_protocol: String,

    /// Module named by the anchor `@import`
    #[serde(default = "default_anchor")]
    pub anchor: String,
}

fn default_apps_dir() -> PathBuf {
    PathBuf::from("apps")
}
fn default_packages_dir() -> PathBuf {
    PathBuf::from("packages")
}
fn default_source_dir() -> PathBuf {
    PathBuf::from("src/app")
}
fn default_stylesheet() -> String {
    "globals.css".to_string()
}
fn default_manifest() -> String {
    "package.json".to_string()
}
fn default_workspace_protocol() -> String {
    "workspace:*".to_string()
}
fn default_anchor() -> String {
    "tailwindcss".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            apps_dir: default_apps_dir(),
            packages_dir: default_packages_dir(),
            source_dir: default_source_dir(),
            stylesheet: default_stylesheet(),
            manifest: default_manifest(),
            workspace_protocol: default_workspace_protocol(),
            anchor: default_anchor(),
        }
    }
}

impl SyncConfig {
    /// Root of an application addressed by name.
    pub fn app_root(&self, name: &str) -> PathBuf {
        self.apps_dir.join(name)
    }

    /// Stylesheet path for an application root.
    pub fn stylesheet_path(&self, app_root: &std::path::Path) -> PathBuf {
        app_root.join(&self.source_dir).join(&self.stylesheet)
    }

    /// Both accepted spellings of the anchor line.
    pub fn anchor_patterns(&self) -> [String; 2] {
        [
            format!("@import \"{}\"", self.anchor),
            format!("@import '{}'", self.anchor),
        ]
    }
}
