//! `@source` directive computation.

use std::path::{Component, Path};

use tailsync_workspace::Tree;

use crate::config::{SyncConfig, DIRECTIVE_KEYWORD};

/// Format a directive for a package at `relative` from the stylesheet dir.
pub fn format_directive(relative: &str) -> String {
    format!("{DIRECTIVE_KEYWORD} '{relative}/';")
}

/// Whether a stylesheet line is a directive.
pub fn is_directive(line: &str) -> bool {
    line.trim().starts_with(DIRECTIVE_KEYWORD)
}

/// Compute the directives an application needs.
///
/// Dependencies without a matching directory under the packages root are
/// dropped. Order follows `dependencies`; identical directives are emitted
/// once.
pub fn compute_directives(
    tree: &dyn Tree,
    app_root: &Path,
    dependencies: &[String],
    config: &SyncConfig,
) -> Vec<String> {
    let source_dir = app_root.join(&config.source_dir);
    let mut directives: Vec<String> = Vec::with_capacity(dependencies.len());

    for dependency in dependencies {
        let package = config.packages_dir.join(dependency);
        if !tree.exists(&package) {
            tracing::debug!(
                "Skipping {}: {} does not exist",
                dependency,
                package.display()
            );
            continue;
        }

        let directive = format_directive(&relative_path(&source_dir, &package));
        if !directives.contains(&directive) {
            directives.push(directive);
        }
    }

    directives
}

/// Lexical relative path from directory `from` to `to`, joined with `/`.
///
/// Both paths are interpreted relative to the same base; `.` segments are
/// dropped and `..` segments are resolved before comparing.
pub fn relative_path(from: &Path, to: &Path) -> String {
    let from = normalize(from);
    let to = normalize(to);

    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<&str> = Vec::new();
    segments.extend(std::iter::repeat("..").take(from.len() - common));
    segments.extend(to[common..].iter().map(String::as_str));

    segments.join("/")
}

fn normalize(path: &Path) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                segments.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    segments
}
