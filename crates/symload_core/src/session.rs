//! Per-debugger-session record of loaded symbol files.
//!
//! # Responsibility
//! - Hold the canonical paths that were registered successfully.
//! - Resolve user paths to the canonical deduplication key.
//!
//! # Invariants
//! - A path is recorded only after the host reported success.
//! - Recorded paths are never removed.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Set of canonical symbol file paths loaded in one debugger session.
#[derive(Debug, Default, Clone)]
pub struct LoadSession {
    loaded: BTreeSet<PathBuf>,
}

impl LoadSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `canonical` was recorded before.
    pub fn is_loaded(&self, canonical: &Path) -> bool {
        self.loaded.contains(canonical)
    }

    /// Records one successfully loaded canonical path.
    ///
    /// Returns `false` when the path was already present.
    pub fn record(&mut self, canonical: PathBuf) -> bool {
        self.loaded.insert(canonical)
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// Loaded paths in sorted order.
    pub fn loaded_paths(&self) -> impl Iterator<Item = &Path> {
        self.loaded.iter().map(PathBuf::as_path)
    }
}

/// Resolves `path` to its canonical absolute form.
///
/// Falls back to the lexically absolute path when the file cannot be
/// canonicalized (for example a dangling symlink).
pub fn canonical_path(path: &Path) -> PathBuf {
    match std::fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(_) => absolute_path(path),
    }
}

/// Joins relative paths onto the current directory without touching links.
pub fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
