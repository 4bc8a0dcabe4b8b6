use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::keyinfo::CollectedKey;

/// Process-wide set of known-bad keys in canonical authorized_keys form.
///
/// Matching is exact string equality after trimming, so an entry that carries a
/// comment only matches a key rendered with the same comment.
#[derive(Debug, Default, Clone)]
pub struct BlacklistSet {
    entries: HashSet<String>,
}

impl BlacklistSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = lines
            .into_iter()
            .map(|line| line.as_ref().trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        Self { entries }
    }

    /// Load every flat file in `dir`, one key per line.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("reading blacklist directory: {}", dir.display()))?;

        let mut set = Self::empty();
        for entry in entries {
            let entry = entry
                .with_context(|| format!("listing blacklist directory: {}", dir.display()))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .with_context(|| format!("inspecting blacklist entry: {}", path.display()))?;
            if file_type.is_dir() {
                anyhow::bail!(
                    "subdirectories not supported in blacklist directory {}: {}",
                    dir.display(),
                    path.display()
                );
            }

            let file = std::fs::File::open(&path)
                .with_context(|| format!("opening blacklist file: {}", path.display()))?;
            let before = set.entries.len();
            for line in BufReader::new(file).lines() {
                let line =
                    line.with_context(|| format!("reading blacklist file: {}", path.display()))?;
                let line = line.trim();
                if !line.is_empty() {
                    set.entries.insert(line.to_string());
                }
            }
            debug!(
                path = %path.display(),
                added = set.entries.len() - before,
                "Blacklist file loaded"
            );
        }
        Ok(set)
    }

    /// Exact match of a trimmed canonical line.
    pub fn contains_line(&self, line: &str) -> bool {
        self.entries.contains(line.trim())
    }

    pub fn is_blacklisted(&self, key: &CollectedKey) -> bool {
        self.contains_line(&key.canonical())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
