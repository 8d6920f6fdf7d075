//! Stylesheet rewriting.
//!
//! The rewrite strips every existing directive and reinserts the computed
//! block after the anchor import:
//!
//! ```css
//! @import "tailwindcss";
//!
//! @source '../../../../packages/ui/';
//! @source '../../../../packages/tokens/';
//! ```
//!
//! Any blank lines already following the anchor are kept, and exactly one
//! blank separator is inserted before the block. When the blank run after
//! the anchor ends in a directive, its last blank line is that separator and
//! is stripped along with the directives, so rewriting the output again
//! yields the same text. Blank lines anywhere else are never touched.
//!
//! The block always ends directly above the next rule. A hand-written
//! layout with a blank line below the block, such as
//!
//! ```css
//! @import "tailwindcss";
//!
//! @source '../ui/';
//!
//! :root {}
//! ```
//!
//! is rewritten once (the blank line below the block moves above it), and
//! `tailsync check` reports it as out of sync until then.

use crate::directive::is_directive;

/// Result of rewriting a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// No anchor import was found; the stylesheet is left alone
    NoAnchor,

    /// The stylesheet already contains exactly the requested block
    Unchanged,

    /// The stylesheet needs new content
    Updated { content: String },
}

/// Rewrite `content` so it carries exactly `directives` after the anchor.
///
/// `anchors` are the accepted spellings of the anchor import; the first line
/// containing any of them is used.
pub fn rewrite(content: &str, directives: &[String], anchors: &[String]) -> Rewrite {
    let (body, trailing_newline) = match content.strip_suffix('\n') {
        Some(body) => (body, true),
        None => (content, false),
    };

    let is_anchor =
        |line: &str| !is_directive(line) && anchors.iter().any(|a| line.contains(a.as_str()));

    let Some(separator) = find_separator(body, &is_anchor) else {
        return Rewrite::NoAnchor;
    };

    let mut lines: Vec<&str> = body
        .split('\n')
        .enumerate()
        .filter(|(i, line)| Some(*i) != separator && !is_directive(line))
        .map(|(_, line)| line)
        .collect();

    let Some(anchor) = lines.iter().position(|line| is_anchor(*line)) else {
        return Rewrite::NoAnchor;
    };

    let mut insert_at = anchor + 1;
    while insert_at < lines.len() && lines[insert_at].trim().is_empty() {
        insert_at += 1;
    }

    if !directives.is_empty() {
        let tail = lines.split_off(insert_at);
        lines.push("");
        lines.extend(directives.iter().map(String::as_str));
        lines.extend(tail);
    }

    let mut updated = lines.join("\n");
    if trailing_newline {
        updated.push('\n');
    }

    if updated == content {
        Rewrite::Unchanged
    } else {
        Rewrite::Updated { content: updated }
    }
}

/// Locate the separator a previous rewrite inserted above the block.
///
/// Returns `None` when there is no anchor line, `Some(None)` when the blank
/// run after the anchor is not followed by a directive, and `Some(Some(i))`
/// with the index of the blank line to drop otherwise.
fn find_separator(body: &str, is_anchor: impl Fn(&str) -> bool) -> Option<Option<usize>> {
    let lines: Vec<&str> = body.split('\n').collect();
    let anchor = lines.iter().position(|line| is_anchor(*line))?;

    let mut next = anchor + 1;
    while next < lines.len() && lines[next].trim().is_empty() {
        next += 1;
    }

    let follows_blank = next > anchor + 1;
    let starts_block = lines.get(next).is_some_and(|line| is_directive(line));

    Some((follows_blank && starts_block).then(|| next - 1))
}
