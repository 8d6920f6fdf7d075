//! Formatting pass over files changed in a tree.

use crate::tree::{Tree, TreeError};

/// Normalizes files written during a run. Must be idempotent.
pub trait Formatter {
    /// Formatter identifier for logging
    fn name(&self) -> &'static str;

    /// Format every changed file in the tree.
    fn format_files(&self, tree: &mut dyn Tree) -> Result<(), TreeError>;
}

/// Strips trailing whitespace and ensures a single trailing newline.
///
/// Blank-line runs are left alone, so the output of a generator that relies
/// on a specific blank-line layout survives formatting unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceFormatter;

impl WhitespaceFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a single file's content.
    pub fn normalize(content: &str) -> String {
        let mut out = content
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n");

        let trimmed_len = out.trim_end_matches('\n').len();
        out.truncate(trimmed_len);

        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

impl Formatter for WhitespaceFormatter {
    fn name(&self) -> &'static str {
        "whitespace"
    }

    fn format_files(&self, tree: &mut dyn Tree) -> Result<(), TreeError> {
        for change in tree.changes() {
            let current = tree.read_to_string(&change.path)?;
            let formatted = Self::normalize(&current);

            if formatted != current {
                tracing::debug!("Formatted {}", change.path.display());
                tree.write(&change.path, formatted);
            }
        }
        Ok(())
    }
}

/// Leaves files exactly as written.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFormatter;

impl Formatter for NoopFormatter {
    fn name(&self) -> &'static str {
        "none"
    }

    fn format_files(&self, _tree: &mut dyn Tree) -> Result<(), TreeError> {
        Ok(())
    }
}
