//! Identifier list loading.
//!
//! The input is a tab-delimited file with no header; only the first column
//! is consumed. Duplicates are dropped while preserving first-seen order so
//! the submitted list matches the file. An empty result is not an error
//! here; the caller decides how to report it.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierList {
    ids: Vec<String>,
}

impl IdentifierList {
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for line in lines {
            let first = line.split('\t').next().unwrap_or("").trim();
            if first.is_empty() {
                continue;
            }
            if seen.insert(first.to_string()) {
                ids.push(first.to_string());
            }
        }
        IdentifierList { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Comma-joined transport form expected by `addList`.
    pub fn joined(&self) -> String {
        self.ids.join(",")
    }
}

pub fn load(path: &Path) -> Result<IdentifierList> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read identifier list {}", path.display()))?;
    Ok(IdentifierList::from_lines(text.lines()))
}
