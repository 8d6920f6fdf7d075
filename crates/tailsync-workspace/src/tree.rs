//! Staged view of the workspace file system.
//!
//! Generators never write to disk directly. They read and write through a
//! [`Tree`], which keeps every write in memory until [`FsTree::commit`] is
//! called. This makes dry runs and "is anything out of sync?" checks the
//! same code path as a real run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// How a staged file relates to what is on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// File did not exist before this run
    Create,

    /// File existed and its content differs
    Update,
}

/// A pending change recorded in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Path relative to the workspace root
    pub path: PathBuf,

    /// Whether the file is new or rewritten
    pub kind: ChangeKind,
}

/// Errors that can occur while reading or flushing a tree.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Read/write access to workspace files, addressed relative to the root.
pub trait Tree {
    /// Workspace root all paths are resolved against.
    fn root(&self) -> &Path;

    /// Whether a file or directory exists, taking staged writes into account.
    fn exists(&self, path: &Path) -> bool;

    /// Read a file, preferring staged content over disk.
    fn read_to_string(&self, path: &Path) -> Result<String, TreeError>;

    /// Stage new content for a file.
    fn write(&mut self, path: &Path, content: String);

    /// Files whose staged content differs from disk, sorted by path.
    fn changes(&self) -> Vec<FileChange>;
}

#[derive(Debug, Clone)]
struct Staged {
    content: String,
    kind: ChangeKind,
}

/// A [`Tree`] backed by the real file system with in-memory staging.
#[derive(Debug)]
pub struct FsTree {
    root: PathBuf,
    staged: BTreeMap<PathBuf, Staged>,
}

impl FsTree {
    /// Create a tree rooted at the given workspace directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            staged: BTreeMap::new(),
        }
    }

    /// Flush all staged changes to disk and return what was written.
    pub fn commit(self) -> Result<Vec<FileChange>, TreeError> {
        let changes = self.changes();

        for change in &changes {
            let Some(staged) = self.staged.get(&change.path) else {
                continue;
            };
            let target = self.root.join(&change.path);

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|source| TreeError::Write {
                    path: parent.display().to_string(),
                    source,
                })?;
            }

            fs::write(&target, &staged.content).map_err(|source| TreeError::Write {
                path: change.path.display().to_string(),
                source,
            })?;
            tracing::debug!("Wrote {}", change.path.display());
        }

        Ok(changes)
    }

    fn read_disk(&self, path: &Path) -> Result<String, TreeError> {
        fs::read_to_string(self.root.join(path)).map_err(|source| TreeError::Read {
            path: path.display().to_string(),
            source,
        })
    }
}

impl Tree for FsTree {
    fn root(&self) -> &Path {
        &self.root
    }

    fn exists(&self, path: &Path) -> bool {
        self.staged.contains_key(path) || self.root.join(path).exists()
    }

    fn read_to_string(&self, path: &Path) -> Result<String, TreeError> {
        match self.staged.get(path) {
            Some(staged) => Ok(staged.content.clone()),
            None => self.read_disk(path),
        }
    }

    fn write(&mut self, path: &Path, content: String) {
        let kind = match self.staged.get(path) {
            Some(previous) => previous.kind,
            None if self.root.join(path).is_file() => ChangeKind::Update,
            None => ChangeKind::Create,
        };

        self.staged
            .insert(path.to_path_buf(), Staged { content, kind });
    }

    fn changes(&self) -> Vec<FileChange> {
        self.staged
            .iter()
            .filter(|(path, staged)| match staged.kind {
                ChangeKind::Create => true,
                // A write that restores the on-disk content is not a change
                ChangeKind::Update => self
                    .read_disk(path)
                    .map(|disk| disk != staged.content)
                    .unwrap_or(true),
            })
            .map(|(path, staged)| FileChange {
                path: path.clone(),
                kind: staged.kind,
            })
            .collect()
    }
}
