//! Directory walker yielding files and recoverable errors.
//!
//! # Responsibility
//! - Enumerate regular files below a root in deterministic order.
//! - Turn listing failures into events instead of aborting the walk.
//!
//! # Invariants
//! - Directory symlinks are not followed.
//! - A symlink is yielded as a file only when it resolves to a regular file.
//! - Entries inside one directory are visited sorted by file name.

use log::warn;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One step of a directory walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEvent {
    /// Regular file (or symlink to one).
    File(PathBuf),
    /// Directory that could not be listed due to missing permission.
    Denied(PathBuf),
    /// Any other listing failure.
    Error { path: PathBuf, reason: String },
}

/// Iterator over [`WalkEvent`]s below one root.
pub struct SymbolWalker {
    inner: walkdir::IntoIter,
    root: PathBuf,
}

impl SymbolWalker {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let inner = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();
        Self { inner, root }
    }
}

impl Iterator for SymbolWalker {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    if file_type.is_file() {
                        return Some(WalkEvent::File(entry.into_path()));
                    }
                    if file_type.is_symlink() && entry.path().is_file() {
                        return Some(WalkEvent::File(entry.into_path()));
                    }
                }
                Err(err) => return Some(map_walk_error(err, &self.root)),
            }
        }
    }
}

fn map_walk_error(err: walkdir::Error, root: &Path) -> WalkEvent {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    match err.io_error().map(std::io::Error::kind) {
        Some(ErrorKind::PermissionDenied) => {
            warn!(
                "event=walk_denied module=walk status=error path={}",
                path.display()
            );
            WalkEvent::Denied(path)
        }
        _ => {
            warn!(
                "event=walk_error module=walk status=error path={} error={}",
                path.display(),
                err
            );
            WalkEvent::Error {
                path,
                reason: err.to_string(),
            }
        }
    }
}
