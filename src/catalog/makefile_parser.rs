//! # Makefile Target Scanner
//!
//! Extracts `target: documentation` pairs from a Makefile with a plain line
//! scan. No `make` process is involved; the descriptor is read as text.
//!
//! ## Grammar
//!
//! A line is a target line when all of the following hold:
//!
//! - it contains a `:`
//! - it does not start with a tab (recipe lines)
//! - it does not start with `.` (special targets such as `.PHONY`)
//! - it does not contain the `PHONY` marker anywhere
//! - the text before the first `:` is an identifier made of letters, digits,
//!   `_` and `-`
//!
//! The documentation is whatever follows the first colon, trimmed:
//!
//! ```makefile
//! build: compile the project
//! test: run unit tests
//! ```

use anyhow::{Context, Result};
use regex::Regex;

/// Marker token that excludes a line from the catalog wherever it appears.
const PHONY_MARKER: &str = "PHONY";

/// A single target line found in the descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLine {
    pub name: String,
    pub doc: String,
}

/// Scan Makefile content and return every target line in file order.
///
/// Duplicates are returned as they appear; [`Catalog`](super::Catalog)
/// collapses them so the last definition wins.
pub fn scan_targets(content: &str) -> Result<Vec<TargetLine>> {
    let target_re =
        Regex::new(r"^[a-zA-Z0-9_-]+:").context("Failed to compile target line regex")?;

    let targets = content
        .lines()
        .filter(|line| is_target_line(line, &target_re))
        .filter_map(|line| {
            let (name, doc) = line.split_once(':')?;
            Some(TargetLine {
                name: name.to_string(),
                doc: doc.trim().to_string(),
            })
        })
        .collect();

    Ok(targets)
}

fn is_target_line(line: &str, target_re: &Regex) -> bool {
    line.contains(':')
        && !line.starts_with('\t')
        && !line.starts_with('.')
        && !line.contains(PHONY_MARKER)
        && target_re.is_match(line)
}
