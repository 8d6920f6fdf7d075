//! Tailwind `@source` directive synchronization.
//!
//! For every application in a workspace, this crate reads the app's
//! `package.json`, finds its `workspace:*` dependencies and makes sure the
//! app's stylesheet has one `@source` directive per workspace package,
//! placed right after `@import "tailwindcss"`.

pub mod config;
pub mod directive;
pub mod manifest;
pub mod stylesheet;
pub mod sync;

pub use config::{SyncConfig, DIRECTIVE_KEYWORD};
pub use directive::{compute_directives, format_directive, is_directive, relative_path};
pub use manifest::{read_workspace_dependencies, Manifest, ManifestError};
pub use stylesheet::{rewrite, Rewrite};
pub use sync::{AppReport, AppStatus, SkipReason, SourceSync, SyncError, SyncResult};
