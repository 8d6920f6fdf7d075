//! Synchronization of `@source` directives across applications.

use std::fmt;
use std::path::{Path, PathBuf};

use tailsync_workspace::{Formatter, GraphError, GraphSource, Tree, TreeError};

use crate::config::SyncConfig;
use crate::directive::compute_directives;
use crate::manifest::{read_workspace_dependencies, ManifestError};
use crate::stylesheet::{rewrite, Rewrite};

/// Why an application was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoManifest,
    NoWorkspaceDependencies,
    NoWorkspacePackages,
    NoStylesheet,
    NoAnchor,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::NoManifest => "no dependency manifest",
            SkipReason::NoWorkspaceDependencies => "no workspace dependencies",
            SkipReason::NoWorkspacePackages => "no workspace packages found",
            SkipReason::NoStylesheet => "no stylesheet",
            SkipReason::NoAnchor => "stylesheet has no tailwind import",
        };
        f.write_str(reason)
    }
}

/// Outcome of syncing one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppStatus {
    /// Not applicable to this application
    Skipped(SkipReason),

    /// Stylesheet already in sync
    Unchanged,

    /// Stylesheet rewritten with the given directives
    Updated {
        stylesheet: PathBuf,
        directives: Vec<String>,
    },
}

/// Per-application entry in a sync result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppReport {
    pub name: String,
    pub root: PathBuf,
    pub status: AppStatus,
}

/// Result of a discovery-mode run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// Summary, present only when at least one application was updated
    pub out_of_sync_message: Option<String>,

    /// Every application that was checked, in graph order
    pub apps: Vec<AppReport>,
}

impl SyncResult {
    /// Applications whose stylesheet was rewritten.
    pub fn updated(&self) -> impl Iterator<Item = &AppReport> {
        self.apps
            .iter()
            .filter(|app| matches!(app.status, AppStatus::Updated { .. }))
    }
}

/// Errors that abort a sync run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("Failed to create project graph: {0}")]
    Graph(#[from] GraphError),
}

/// Keeps application stylesheets pointed at their workspace packages.
pub struct SourceSync<'a> {
    config: SyncConfig,
    graph: &'a dyn GraphSource,
    formatter: &'a dyn Formatter,
}

impl<'a> SourceSync<'a> {
    /// Create a synchronizer with its collaborators.
    pub fn new(
        config: SyncConfig,
        graph: &'a dyn GraphSource,
        formatter: &'a dyn Formatter,
    ) -> Self {
        Self {
            config,
            graph,
            formatter,
        }
    }

    /// Run for one named application, or for every application when `app`
    /// is `None`.
    ///
    /// A targeted run always formats and returns `None`. A discovery run
    /// formats only when something changed.
    pub fn run(
        &self,
        tree: &mut dyn Tree,
        app: Option<&str>,
    ) -> Result<Option<SyncResult>, SyncError> {
        match app {
            Some(name) => {
                let root = self.config.app_root(name);
                self.sync_app(tree, name, &root)?;
                self.formatter.format_files(tree)?;
                Ok(None)
            }
            None => self.sync_all(tree).map(Some),
        }
    }

    /// Discovery mode: sync every project rooted under the apps directory.
    pub fn sync_all(&self, tree: &mut dyn Tree) -> Result<SyncResult, SyncError> {
        tracing::info!("Running sync for all apps...");
        tracing::debug!("Workspace root: {}", tree.root().display());

        let graph = self.graph.create_project_graph()?;
        tracing::info!("Found {} projects total", graph.len());

        let mut result = SyncResult::default();
        let mut updated_apps = 0;

        for (name, project) in &graph.nodes {
            tracing::debug!(
                "Project {}: type={}, root={}",
                name,
                project.project_type,
                project.root.display()
            );

            if !is_under(&project.root, &self.config.apps_dir) {
                continue;
            }

            tracing::info!("Checking app: {}", name);
            let status = self.sync_app(tree, name, &project.root)?;

            match &status {
                AppStatus::Updated { .. } => {
                    updated_apps += 1;
                    tracing::info!("Updated app: {}", name);
                }
                AppStatus::Unchanged => tracing::info!("No updates needed for app: {}", name),
                AppStatus::Skipped(reason) => {
                    tracing::info!("No updates needed for app: {} ({})", name, reason)
                }
            }

            result.apps.push(AppReport {
                name: name.clone(),
                root: project.root.clone(),
                status,
            });
        }

        if updated_apps > 0 {
            tracing::debug!("Formatting with {} formatter", self.formatter.name());
            self.formatter.format_files(tree)?;
            result.out_of_sync_message = Some(format!(
                "Updated @source directives in {} app(s).",
                updated_apps
            ));
        }

        Ok(result)
    }

    /// Sync a single application rooted at `root`.
    pub fn sync_app(
        &self,
        tree: &mut dyn Tree,
        name: &str,
        root: &Path,
    ) -> Result<AppStatus, SyncError> {
        let manifest = root.join(&self.config.manifest);
        let Some(dependencies) =
            read_workspace_dependencies(tree, &manifest, &self.config.workspace_protocol)?
        else {
            return Ok(skip(name, SkipReason::NoManifest));
        };

        if dependencies.is_empty() {
            return Ok(skip(name, SkipReason::NoWorkspaceDependencies));
        }

        let directives = compute_directives(tree, root, &dependencies, &self.config);
        if directives.is_empty() {
            return Ok(skip(name, SkipReason::NoWorkspacePackages));
        }

        let stylesheet = self.config.stylesheet_path(root);
        if !tree.exists(&stylesheet) {
            return Ok(skip(name, SkipReason::NoStylesheet));
        }

        let current = tree.read_to_string(&stylesheet)?;
        let content = match rewrite(&current, &directives, &self.config.anchor_patterns()) {
            Rewrite::NoAnchor => return Ok(skip(name, SkipReason::NoAnchor)),
            Rewrite::Unchanged => return Ok(AppStatus::Unchanged),
            Rewrite::Updated { content } => content,
        };

        tree.write(&stylesheet, content);

        tracing::info!(
            "Updated {} with {} workspace package sources:",
            stylesheet.display(),
            directives.len()
        );
        for directive in &directives {
            tracing::info!("  {}", directive);
        }

        Ok(AppStatus::Updated {
            stylesheet,
            directives,
        })
    }
}

fn skip(name: &str, reason: SkipReason) -> AppStatus {
    tracing::debug!("Skipping {}: {}", name, reason);
    AppStatus::Skipped(reason)
}

/// Whether `root` lies strictly inside `dir`, compared by path component.
fn is_under(root: &Path, dir: &Path) -> bool {
    root.starts_with(dir) && root != dir
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::fs;
    use tailsync_workspace::{
        FsTree, NoopFormatter, ProjectGraph, ProjectNode, ProjectType, WhitespaceFormatter,
    };
    use tempfile::{tempdir, TempDir};

    const UI_SOURCE: &str = "@source '../../../../packages/ui/';";

    /// Counts how often the formatting pass runs.
    #[derive(Default)]
    struct CountingFormatter {
        calls: Cell<usize>,
    }

    impl Formatter for CountingFormatter {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn format_files(&self, _tree: &mut dyn Tree) -> Result<(), TreeError> {
            self.calls.set(self.calls.get() + 1);
            Ok(())
        }
    }

    struct FailingGraph;

    impl GraphSource for FailingGraph {
        fn create_project_graph(&self) -> Result<ProjectGraph, GraphError> {
            Err(GraphError::RootNotFound("/nowhere".to_string()))
        }
    }

    fn write(root: &Path, path: &str, content: &str) {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    fn workspace() -> TempDir {
        let temp = tempdir().unwrap();
        write(
            temp.path(),
            "apps/app1/package.json",
            r#"{"dependencies": {"ui": "workspace:*", "react": "18.0.0"}}"#,
        );
        write(
            temp.path(),
            "apps/app1/src/app/globals.css",
            "@import \"tailwindcss\";\n",
        );
        fs::create_dir_all(temp.path().join("packages/ui")).unwrap();
        temp
    }

    fn node(name: &str, root: &str, project_type: ProjectType) -> ProjectNode {
        ProjectNode {
            name: name.to_string(),
            project_type,
            root: PathBuf::from(root),
        }
    }

    fn graph(nodes: Vec<ProjectNode>) -> ProjectGraph {
        let mut graph = ProjectGraph::new();
        for node in nodes {
            graph.add(node).unwrap();
        }
        graph
    }

    fn stylesheet(tree: &FsTree, app: &str) -> String {
        tree.read_to_string(&PathBuf::from(format!("apps/{app}/src/app/globals.css")))
            .unwrap()
    }

    #[test]
    fn targeted_run_inserts_directive_and_formats() {
        let temp = workspace();
        let mut tree = FsTree::new(temp.path());
        let formatter = CountingFormatter::default();
        let empty = ProjectGraph::new();
        let sync = SourceSync::new(SyncConfig::default(), &empty, &formatter);

        let result = sync.run(&mut tree, Some("app1")).unwrap();

        assert!(result.is_none());
        assert_eq!(formatter.calls.get(), 1);
        assert_eq!(
            stylesheet(&tree, "app1"),
            format!("@import \"tailwindcss\";\n\n{UI_SOURCE}\n")
        );
        assert!(!stylesheet(&tree, "app1").contains("react"));
    }

    #[test]
    fn targeted_run_formats_even_without_changes() {
        let temp = workspace();
        let mut tree = FsTree::new(temp.path());
        let formatter = CountingFormatter::default();
        let empty = ProjectGraph::new();
        let sync = SourceSync::new(SyncConfig::default(), &empty, &formatter);

        sync.run(&mut tree, Some("missing-app")).unwrap();

        assert_eq!(formatter.calls.get(), 1);
        assert!(tree.changes().is_empty());
    }

    #[test]
    fn second_run_changes_nothing() {
        let temp = workspace();
        let graph = graph(vec![node("app1", "apps/app1", ProjectType::Application)]);
        let formatter = WhitespaceFormatter::new();
        let sync = SourceSync::new(SyncConfig::default(), &graph, &formatter);

        let mut tree = FsTree::new(temp.path());
        let first = sync.run(&mut tree, None).unwrap().unwrap();
        assert_eq!(
            first.out_of_sync_message.as_deref(),
            Some("Updated @source directives in 1 app(s).")
        );
        tree.commit().unwrap();

        let before = fs::read(temp.path().join("apps/app1/src/app/globals.css")).unwrap();

        let mut tree = FsTree::new(temp.path());
        let second = sync.run(&mut tree, None).unwrap().unwrap();

        assert_eq!(second.out_of_sync_message, None);
        assert_eq!(second.apps[0].status, AppStatus::Unchanged);
        assert!(tree.changes().is_empty());
        assert_eq!(
            fs::read(temp.path().join("apps/app1/src/app/globals.css")).unwrap(),
            before
        );
    }

    #[test]
    fn discovery_only_visits_apps_directory() {
        let temp = workspace();
        write(
            temp.path(),
            "apps-legacy/old/package.json",
            r#"{"dependencies": {"ui": "workspace:*"}}"#,
        );
        write(
            temp.path(),
            "apps-legacy/old/src/app/globals.css",
            "@import \"tailwindcss\";\n",
        );
        let graph = graph(vec![
            node("app1", "apps/app1", ProjectType::Application),
            node("old", "apps-legacy/old", ProjectType::Application),
            node("ui", "packages/ui", ProjectType::Library),
        ]);
        let formatter = NoopFormatter;
        let sync = SourceSync::new(SyncConfig::default(), &graph, &formatter);
        let mut tree = FsTree::new(temp.path());

        let result = sync.run(&mut tree, None).unwrap().unwrap();

        let names: Vec<&str> = result.apps.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["app1"]);
        assert_eq!(
            tree.read_to_string(Path::new("apps-legacy/old/src/app/globals.css"))
                .unwrap(),
            "@import \"tailwindcss\";\n"
        );
    }

    #[test]
    fn discovery_without_updates_returns_empty_result_and_skips_formatting() {
        let temp = tempdir().unwrap();
        write(
            temp.path(),
            "apps/plain/package.json",
            r#"{"dependencies": {"react": "18.0.0"}}"#,
        );
        write(
            temp.path(),
            "apps/plain/src/app/globals.css",
            "@import \"tailwindcss\";\n",
        );
        let graph = graph(vec![
            node("plain", "apps/plain", ProjectType::Application),
            node("bare", "apps/bare", ProjectType::Application),
        ]);
        let formatter = CountingFormatter::default();
        let sync = SourceSync::new(SyncConfig::default(), &graph, &formatter);
        let mut tree = FsTree::new(temp.path());

        let result = sync.run(&mut tree, None).unwrap().unwrap();

        assert_eq!(result.out_of_sync_message, None);
        assert_eq!(result.updated().count(), 0);
        assert_eq!(formatter.calls.get(), 0);
        assert_eq!(
            result
                .apps
                .iter()
                .map(|a| a.status.clone())
                .collect::<Vec<_>>(),
            vec![
                AppStatus::Skipped(SkipReason::NoManifest),
                AppStatus::Skipped(SkipReason::NoWorkspaceDependencies),
            ]
        );
    }

    #[test]
    fn reports_each_skip_reason() {
        let temp = tempdir().unwrap();
        write(
            temp.path(),
            "apps/nopkg/package.json",
            r#"{"dependencies": {"ghost": "workspace:*"}}"#,
        );
        write(
            temp.path(),
            "apps/nocss/package.json",
            r#"{"devDependencies": {"ui": "workspace:*"}}"#,
        );
        write(
            temp.path(),
            "apps/noanchor/package.json",
            r#"{"dependencies": {"ui": "workspace:*"}}"#,
        );
        write(
            temp.path(),
            "apps/noanchor/src/app/globals.css",
            "body { margin: 0; }\n",
        );
        fs::create_dir_all(temp.path().join("packages/ui")).unwrap();

        let mut tree = FsTree::new(temp.path());
        let empty = ProjectGraph::new();
        let sync = SourceSync::new(SyncConfig::default(), &empty, &NoopFormatter);

        let status = |tree: &mut FsTree, name: &str| {
            sync.sync_app(tree, name, &PathBuf::from("apps").join(name))
                .unwrap()
        };

        assert_eq!(
            status(&mut tree, "nopkg"),
            AppStatus::Skipped(SkipReason::NoWorkspacePackages)
        );
        assert_eq!(
            status(&mut tree, "nocss"),
            AppStatus::Skipped(SkipReason::NoStylesheet)
        );
        assert_eq!(
            status(&mut tree, "noanchor"),
            AppStatus::Skipped(SkipReason::NoAnchor)
        );
        assert!(tree.changes().is_empty());
    }

    #[test]
    fn uses_graph_root_for_discovered_apps() {
        let temp = workspace();
        let graph = graph(vec![node("@acme/web", "apps/app1", ProjectType::Application)]);
        let sync = SourceSync::new(SyncConfig::default(), &graph, &NoopFormatter);
        let mut tree = FsTree::new(temp.path());

        let result = sync.run(&mut tree, None).unwrap().unwrap();

        assert_eq!(
            result.apps[0].status,
            AppStatus::Updated {
                stylesheet: PathBuf::from("apps/app1/src/app/globals.css"),
                directives: vec![UI_SOURCE.to_string()],
            }
        );
    }

    #[test]
    fn propagates_graph_failures() {
        let sync = SourceSync::new(SyncConfig::default(), &FailingGraph, &NoopFormatter);
        let temp = tempdir().unwrap();
        let mut tree = FsTree::new(temp.path());

        let result = sync.run(&mut tree, None);

        assert!(matches!(result, Err(SyncError::Graph(_))));
    }

    #[test]
    fn respects_custom_config() {
        let temp = tempdir().unwrap();
        write(
            temp.path(),
            "sites/blog/package.json",
            r#"{"dependencies": {"kit": "workspace:^"}}"#,
        );
        write(
            temp.path(),
            "sites/blog/styles/main.css",
            "@import 'tailwindcss';\n",
        );
        fs::create_dir_all(temp.path().join("libs/kit")).unwrap();

        let config = SyncConfig {
            apps_dir: PathBuf::from("sites"),
            packages_dir: PathBuf::from("libs"),
            source_dir: PathBuf::from("styles"),
            stylesheet: "main.css".to_string(),
            workspace_protocol: "workspace:^".to_string(),
            ..Default::default()
        };
        let empty = ProjectGraph::new();
        let sync = SourceSync::new(config, &empty, &NoopFormatter);
        let mut tree = FsTree::new(temp.path());

        sync.run(&mut tree, Some("blog")).unwrap();

        assert_eq!(
            tree.read_to_string(Path::new("sites/blog/styles/main.css"))
                .unwrap(),
            "@import 'tailwindcss';\n\n@source '../../../libs/kit/';\n"
        );
    }
}
