//! Project graph discovery.
//!
//! A workspace is a set of projects, each rooted in its own directory under
//! one of a few well-known top-level folders:
//! ```text
//! workspace/
//! ├── apps/
//! │   └── web/            # project.json and/or package.json
//! ├── packages/
//! │   ├── ui/
//! │   └── @acme/tokens/   # scoped packages sit one level deeper
//! └── libs/
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

/// Project configuration filename.
pub const PROJECT_FILE: &str = "project.json";

/// Package manifest filename.
pub const PACKAGE_FILE: &str = "package.json";

/// Kind of project, as declared or inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Application,
    Library,
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectType::Application => write!(f, "application"),
            ProjectType::Library => write!(f, "library"),
        }
    }
}

/// A single project in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectNode {
    /// Project name
    pub name: String,

    /// Declared or inferred project type
    pub project_type: ProjectType,

    /// Project root, relative to the workspace root
    pub root: PathBuf,
}

/// All projects in a workspace, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectGraph {
    pub nodes: BTreeMap<String, ProjectNode>,
}

impl ProjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project, rejecting duplicate names.
    pub fn add(&mut self, node: ProjectNode) -> Result<(), GraphError> {
        if let Some(existing) = self.nodes.get(&node.name) {
            return Err(GraphError::DuplicateProject {
                name: node.name,
                first: existing.root.display().to_string(),
                second: node.root.display().to_string(),
            });
        }
        self.nodes.insert(node.name.clone(), node);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Errors that can occur while building the project graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Workspace root not found: {0}")]
    RootNotFound(String),

    #[error("Failed to scan {path}: {message}")]
    ScanError { path: String, message: String },

    #[error("Invalid {path}: {message}")]
    InvalidProjectFile { path: String, message: String },

    #[error("Project '{name}' is defined twice ({first} and {second})")]
    DuplicateProject {
        name: String,
        first: String,
        second: String,
    },
}

/// Anything that can produce a project graph.
pub trait GraphSource {
    fn create_project_graph(&self) -> Result<ProjectGraph, GraphError>;
}

/// A fixed graph is its own source.
impl GraphSource for ProjectGraph {
    fn create_project_graph(&self) -> Result<ProjectGraph, GraphError> {
        Ok(self.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectFile {
    name: Option<String>,
    project_type: Option<ProjectType>,
}

#[derive(Debug, Default, Deserialize)]
struct PackageFile {
    name: Option<String>,
}

/// Discovers projects by scanning the workspace directory.
#[derive(Debug, Clone)]
pub struct FsGraphSource {
    root: PathBuf,
    project_dirs: Vec<String>,
    apps_dir: String,
}

impl FsGraphSource {
    /// Create a source scanning `apps/`, `packages/` and `libs/` under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            project_dirs: vec!["apps".into(), "packages".into(), "libs".into()],
            apps_dir: "apps".into(),
        }
    }

    /// Override the top-level folders that contain projects.
    pub fn with_project_dirs(mut self, dirs: Vec<String>) -> Self {
        self.project_dirs = dirs;
        self
    }

    /// Override the folder whose projects default to applications.
    pub fn with_apps_dir(mut self, dir: impl Into<String>) -> Self {
        self.apps_dir = dir.into();
        self
    }

    fn read_project(&self, dir: &Path, relative: &Path) -> Result<ProjectNode, GraphError> {
        let project: ProjectFile = read_json(&dir.join(PROJECT_FILE))?.unwrap_or_default();
        let package: PackageFile = read_json(&dir.join(PACKAGE_FILE))?.unwrap_or_default();

        let name = project
            .name
            .or(package.name)
            .or_else(|| {
                relative
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
            })
            .ok_or_else(|| GraphError::InvalidProjectFile {
                path: relative.display().to_string(),
                message: "cannot determine project name".to_string(),
            })?;

        let project_type = project.project_type.unwrap_or_else(|| {
            if relative.starts_with(&self.apps_dir) {
                ProjectType::Application
            } else {
                ProjectType::Library
            }
        });

        Ok(ProjectNode {
            name,
            project_type,
            root: relative.to_path_buf(),
        })
    }
}

impl GraphSource for FsGraphSource {
    fn create_project_graph(&self) -> Result<ProjectGraph, GraphError> {
        if !self.root.is_dir() {
            return Err(GraphError::RootNotFound(self.root.display().to_string()));
        }

        let mut graph = ProjectGraph::new();

        for dir in &self.project_dirs {
            let base = self.root.join(dir);
            if !base.is_dir() {
                continue;
            }

            let mut found: Vec<PathBuf> = Vec::new();

            let walker = WalkDir::new(&base)
                .min_depth(1)
                .max_depth(2)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.file_name() != "node_modules");

            for entry in walker {
                let entry = entry.map_err(|e| GraphError::ScanError {
                    path: base.display().to_string(),
                    message: e.to_string(),
                })?;

                if !entry.file_type().is_dir() {
                    continue;
                }

                let path = entry.path();

                // Only the outermost directory with a config is a project
                if found.iter().any(|root| path.starts_with(root)) {
                    continue;
                }

                if !path.join(PROJECT_FILE).is_file() && !path.join(PACKAGE_FILE).is_file() {
                    continue;
                }

                found.push(path.to_path_buf());

                let relative = path.strip_prefix(&self.root).unwrap_or(path);
                let node = self.read_project(path, relative)?;
                tracing::debug!(
                    "Discovered project {} ({}) at {}",
                    node.name,
                    node.project_type,
                    node.root.display()
                );
                graph.add(node)?;
            }
        }

        Ok(graph)
    }
}

/// Read a JSON file if it exists.
fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, GraphError> {
    if !path.is_file() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| GraphError::ScanError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| GraphError::InvalidProjectFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })
}
