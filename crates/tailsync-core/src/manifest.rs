//! Application dependency manifest (`package.json`) reading.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tailsync_workspace::{Tree, TreeError};

/// The dependency groups of a package manifest, in declaration order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Runtime dependencies
    #[serde(default)]
    pub dependencies: IndexMap<String, Value>,

    /// Development dependencies
    #[serde(default)]
    pub dev_dependencies: IndexMap<String, Value>,
}

impl Manifest {
    /// Parse manifest JSON.
    pub fn parse(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    /// Runtime and development dependencies merged into one map.
    ///
    /// Development entries overwrite runtime entries with the same name; the
    /// name keeps the position of its first declaration.
    pub fn merged(&self) -> IndexMap<&str, &Value> {
        let mut merged = IndexMap::with_capacity(self.dependencies.len());
        for (name, version) in self.dependencies.iter().chain(&self.dev_dependencies) {
            merged.insert(name.as_str(), version);
        }
        merged
    }

    /// Names of dependencies whose version equals `protocol`.
    pub fn workspace_dependencies(&self, protocol: &str) -> Vec<String> {
        self.merged()
            .into_iter()
            .filter(|(_, version)| version.as_str() == Some(protocol))
            .map(|(name, _)| name.to_string())
            .collect()
    }
}

/// Errors that can occur when reading a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error(transparent)]
    Read(#[from] TreeError),

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Read the workspace-local dependencies of the manifest at `path`.
///
/// Returns `None` when the manifest does not exist.
pub fn read_workspace_dependencies(
    tree: &dyn Tree,
    path: &Path,
    protocol: &str,
) -> Result<Option<Vec<String>>, ManifestError> {
    if !tree.exists(path) {
        return Ok(None);
    }

    let source = tree.read_to_string(path)?;
    let manifest = Manifest::parse(&source).map_err(|source| ManifestError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    Ok(Some(manifest.workspace_dependencies(protocol)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tailsync_workspace::FsTree;
    use tempfile::tempdir;

    #[test]
    fn filters_workspace_dependencies_in_order() {
        let manifest = Manifest::parse(
            r#"{
  "name": "app1",
  "dependencies": {
    "ui": "workspace:*",
    "react": "18.0.0",
    "tokens": "workspace:*"
  },
  "devDependencies": {
    "config": "workspace:*",
    "typescript": "^5.4.0"
  }
}"#,
        )
        .unwrap();

        assert_eq!(
            manifest.workspace_dependencies("workspace:*"),
            vec!["ui", "tokens", "config"]
        );
    }

    #[test]
    fn dev_dependencies_overwrite_runtime_entries() {
        let manifest = Manifest::parse(
            r#"{
  "dependencies": { "ui": "workspace:*", "icons": "1.0.0" },
  "devDependencies": { "ui": "2.0.0", "icons": "workspace:*" }
}"#,
        )
        .unwrap();

        // "icons" keeps its runtime position but takes the dev value
        assert_eq!(manifest.workspace_dependencies("workspace:*"), vec!["icons"]);
    }

    #[test]
    fn ignores_non_string_versions_and_missing_groups() {
        let manifest = Manifest::parse(r#"{ "dependencies": { "odd": 1, "ui": "workspace:*" } }"#)
            .unwrap();

        assert_eq!(manifest.workspace_dependencies("workspace:*"), vec!["ui"]);
        assert!(Manifest::parse("{}")
            .unwrap()
            .workspace_dependencies("workspace:*")
            .is_empty());
    }

    #[test]
    fn missing_manifest_is_not_applicable() {
        let temp = tempdir().unwrap();
        let tree = FsTree::new(temp.path());

        let deps =
            read_workspace_dependencies(&tree, Path::new("apps/app1/package.json"), "workspace:*")
                .unwrap();

        assert!(deps.is_none());
    }

    #[test]
    fn errors_on_malformed_manifest() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("package.json"), "{ nope").unwrap();
        let tree = FsTree::new(temp.path());

        let result = read_workspace_dependencies(&tree, Path::new("package.json"), "workspace:*");

        assert!(matches!(result, Err(ManifestError::Parse { .. })));
    }
}
