//! # Catalog Module
//!
//! The target catalog: a mapping from Makefile target name to its one-line
//! documentation. The catalog is loaded once at startup and never changes for
//! the rest of the session.
//!
//! Keys are kept in a [`BTreeMap`], so [`Catalog::names`] always yields target
//! names in lexicographic order. The selection list is populated from that
//! order, which keeps rendering and tests reproducible.

pub mod makefile_parser;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

pub use makefile_parser::{scan_targets, TargetLine};

/// Immutable name -> documentation mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: BTreeMap<String, String>,
}

impl Catalog {
    /// Parse descriptor content into a catalog. Later definitions of the same
    /// target replace earlier ones.
    pub fn parse(content: &str) -> Result<Self> {
        let entries = scan_targets(content)?
            .into_iter()
            .map(|t| (t.name, t.doc))
            .collect();
        Ok(Self { entries })
    }

    /// Target names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Documentation for `name`, if the target exists.
    pub fn doc(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Catalog
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Read and parse the descriptor at `path`.
///
/// A missing or unreadable descriptor is an error; the caller treats it as
/// fatal.
pub fn load(path: &Path) -> Result<Catalog> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read build descriptor: {}", path.display()))?;
    Catalog::parse(&content)
        .with_context(|| format!("Failed to parse build descriptor: {}", path.display()))
}
