//! Workspace collaborators for tailsync.
//!
//! This crate provides the pieces a generator runs against: a staged file
//! tree, project graph discovery, a formatting pass and a file watcher.

pub mod format;
pub mod graph;
pub mod tree;
pub mod watcher;

pub use format::{Formatter, NoopFormatter, WhitespaceFormatter};
pub use graph::{
    FsGraphSource, GraphError, GraphSource, ProjectGraph, ProjectNode, ProjectType, PACKAGE_FILE,
    PROJECT_FILE,
};
pub use tree::{ChangeKind, FileChange, FsTree, Tree, TreeError};
pub use watcher::{classify_event, Debouncer, FileWatcher, WatchEvent};
