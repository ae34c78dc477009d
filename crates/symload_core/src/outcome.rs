//! Result types for load, scan and command invocations.
//!
//! # Responsibility
//! - Describe what happened to each attempted file.
//! - Aggregate per-scan counters and bounded diagnostics input.

use std::path::{Path, PathBuf};

/// Tagged result of one attempted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { path: PathBuf },
    AlreadyLoaded { path: PathBuf },
    UnsupportedExtension { path: PathBuf },
    PermissionDenied { path: PathBuf, reason: String },
    Failed { path: PathBuf, reason: String },
}

impl LoadOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Loaded { path }
            | Self::AlreadyLoaded { path }
            | Self::UnsupportedExtension { path }
            | Self::PermissionDenied { path, .. }
            | Self::Failed { path, .. } => path,
        }
    }

    /// Failure text for host-side failures.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::PermissionDenied { reason, .. } | Self::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. } | Self::Failed { .. })
    }
}

/// Aggregated result of walking one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub root: PathBuf,
    pub loaded: usize,
    pub skipped: usize,
    /// `(path, reason)` for every host-side failure.
    pub failures: Vec<(PathBuf, String)>,
    pub unsupported: Vec<PathBuf>,
    pub denied: Vec<PathBuf>,
    /// Walk failures other than permission denial.
    pub walk_errors: Vec<(PathBuf, String)>,
    pub interrupted: bool,
}

impl ScanReport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Folds one file outcome into the counters.
    pub fn record(&mut self, outcome: &LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded { .. } => self.loaded += 1,
            LoadOutcome::AlreadyLoaded { .. } => self.skipped += 1,
            LoadOutcome::UnsupportedExtension { path } => self.unsupported.push(path.clone()),
            failure => {
                if let Some(reason) = failure.reason() {
                    self.failures
                        .push((failure.path().to_path_buf(), reason.to_string()));
                }
            }
        }
    }
}

/// Result of one `load-symbols` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Root path does not exist.
    NotFound(PathBuf),
    /// Root directory exists but cannot be listed.
    RootPermissionDenied(PathBuf),
    /// Root is a single matching file.
    File(LoadOutcome),
    /// Root is a single file with an unknown extension.
    UnsupportedFile(PathBuf),
    Directory(ScanReport),
}

impl Invocation {
    /// Number of files newly loaded by this invocation.
    pub fn loaded_count(&self) -> usize {
        match self {
            Self::File(outcome) if outcome.is_loaded() => 1,
            Self::Directory(report) => report.loaded,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Invocation, LoadOutcome, ScanReport};
    use std::path::PathBuf;

    #[test]
    fn record_routes_outcomes_to_counters() {
        let mut report = ScanReport::new("/syms");
        report.record(&LoadOutcome::Loaded {
            path: PathBuf::from("/syms/a.debug"),
        });
        report.record(&LoadOutcome::AlreadyLoaded {
            path: PathBuf::from("/syms/b.debug"),
        });
        report.record(&LoadOutcome::UnsupportedExtension {
            path: PathBuf::from("/syms/c.txt"),
        });
        report.record(&LoadOutcome::PermissionDenied {
            path: PathBuf::from("/syms/d.sym"),
            reason: "Permission denied: '/syms/d.sym'".to_string(),
        });
        report.record(&LoadOutcome::Failed {
            path: PathBuf::from("/syms/e.so"),
            reason: "not in executable format".to_string(),
        });

        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.unsupported, vec![PathBuf::from("/syms/c.txt")]);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(Invocation::Directory(report).loaded_count(), 1);
    }

    #[test]
    fn outcome_accessors() {
        let failed = LoadOutcome::Failed {
            path: PathBuf::from("x.so"),
            reason: "boom".to_string(),
        };
        assert!(failed.is_failure());
        assert_eq!(failed.reason(), Some("boom"));
        assert_eq!(failed.path(), PathBuf::from("x.so"));

        let loaded = LoadOutcome::Loaded {
            path: PathBuf::from("x.so"),
        };
        assert!(loaded.is_loaded());
        assert_eq!(loaded.reason(), None);
        assert_eq!(Invocation::File(loaded).loaded_count(), 1);
    }
}
