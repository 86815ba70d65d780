//! Line-oriented index file format.
//!
//! Each line describes one package:
//!
//! ```text
//! <package-name>[(<version>)]:<space-separated binary names>
//! ```
//!
//! The version is optional (older files never had one). Binary names can't
//! contain spaces; there is no escaping. Lines that don't match the grammar
//! are skipped, never rejected, so older and newer readers can share a file.

use crate::index::{Index, IndexEntry};
use regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;

static LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<name>[^\s:()]+)(?:\((?<version>[^()]*)\))?:(?<binaries>.*)$")
        .unwrap_or_else(|e| unreachable!("static index line pattern is valid: {e}"))
});

/// Parse a single line. Returns `None` for blank or malformed lines.
pub fn parse_line(line: &str) -> Option<(String, IndexEntry)> {
    let captures = LINE.captures(line.trim_end_matches(['\r', '\n']))?;
    let name = captures.name("name")?.as_str().to_string();
    let version = captures.name("version").map(|v| v.as_str().to_string());
    let binaries = captures.name("binaries").map(|b| b.as_str()).unwrap_or_default().split_whitespace();
    Some((name, IndexEntry::new(version, binaries)))
}

/// Strip the `(version)` suffix from the package part of a line.
pub fn package_name(field: &str) -> &str {
    match field.find('(') {
        Some(open) if field.ends_with(')') => &field[..open],
        _ => field,
    }
}

/// Render a single entry as a line, without the trailing newline.
pub fn render_line(name: &str, entry: &IndexEntry) -> String {
    let mut line = String::with_capacity(name.len() + entry.binaries.iter().map(|b| b.len() + 1).sum::<usize>() + 16);
    line.push_str(name);
    if let Some(version) = &entry.version {
        // Infallible: writing to a String.
        _ = write!(line, "({version})");
    }
    line.push(':');
    let mut binaries = entry.binaries.iter();
    if let Some(first) = binaries.next() {
        line.push_str(first);
        for binary in binaries {
            line.push(' ');
            line.push_str(binary);
        }
    }
    line
}

/// Parse a whole index document, skipping malformed lines.
pub fn parse(text: &str) -> Index {
    let mut index = Index::new();
    let mut skipped = 0usize;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Some((name, entry)) => index.merge(name, entry),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, "Skipped malformed index lines");
    }
    index
}

/// Render a whole index document: one line per entry, sorted by name, each
/// terminated by a newline.
pub fn render(index: &Index) -> String {
    index.iter().fold(String::new(), |mut document, (name, entry)| {
        document.push_str(&render_line(name, entry));
        document.push('\n');
        document
    })
}
