//! Ledger of already processed Drive file IDs.
//!
//! Stored as plain text, one ID per line, append-only.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// Set of processed file IDs backed by an append-only file.
#[derive(Debug, Clone)]
pub struct KnownFiles {
    path: PathBuf,
    ids: HashSet<String>,
}

impl KnownFiles {
    /// Load all IDs from `path`. A missing file yields an empty set.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let ids = match fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(e.into()),
        };

        debug!("Loaded {} known file IDs from {}", ids.len(), path.display());
        Ok(Self { path, ids })
    }

    /// Whether `id` has already been processed.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record `id` as processed, appending it to the backing file.
    ///
    /// Already known IDs are not written again.
    pub fn append(&mut self, id: &str) -> Result<()> {
        if self.ids.contains(id) {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", id)?;

        self.ids.insert(id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let known = KnownFiles::load(dir.path().join("known_files.txt")).unwrap();
        assert!(known.is_empty());
    }

    #[test]
    fn test_load_collapses_duplicates_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_files.txt");
        fs::write(&path, "abc123\ndef456\n\nabc123\n  ghi789  \n").unwrap();

        let known = KnownFiles::load(&path).unwrap();
        assert_eq!(known.len(), 3);
        assert!(known.contains("abc123"));
        assert!(known.contains("ghi789"));
        assert!(!known.contains(""));
    }

    #[test]
    fn test_append_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("known_files.txt");

        let mut known = KnownFiles::load(&path).unwrap();
        known.append("abc123").unwrap();
        known.append("def456").unwrap();
        assert!(known.contains("abc123"));

        let reloaded = KnownFiles::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("def456"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "abc123\ndef456\n");
    }

    #[test]
    fn test_append_known_id_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_files.txt");

        let mut known = KnownFiles::load(&path).unwrap();
        known.append("abc123").unwrap();
        known.append("abc123").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "abc123\n");
    }
}
