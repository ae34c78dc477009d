//! Symbol loading use-case service.
//!
//! # Responsibility
//! - Deduplicate load requests against a [`LoadSession`].
//! - Walk directory trees and classify files by extension.
//! - Delegate registration to a [`SymbolLoader`] and classify its failures.
//!
//! # Invariants
//! - The session is only mutated after the loader reported success.
//! - A failing file never aborts a scan.
//! - Cancellation returns the partial report instead of an error.

use crate::cancel::CancelToken;
use crate::extension::ExtensionSet;
use crate::loader::SymbolLoader;
use crate::logging::one_line;
use crate::outcome::{Invocation, LoadOutcome, ScanReport};
use crate::session::{absolute_path, canonical_path, LoadSession};
use crate::walk::{SymbolWalker, WalkEvent};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

const HOST_REASON_LOG_LIMIT: usize = 240;

static PERMISSION_DENIED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)permission\s+denied").expect("valid permission regex"));

/// Request model for one `load-symbols` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// File or directory as given by the user.
    pub path: PathBuf,
    pub extensions: ExtensionSet,
}

impl LoadRequest {
    pub fn new(path: impl Into<PathBuf>, extensions: ExtensionSet) -> Self {
        Self {
            path: path.into(),
            extensions,
        }
    }
}

/// Use-case service wrapping one host loader.
pub struct SymbolService<L: SymbolLoader> {
    loader: L,
}

impl<L: SymbolLoader> SymbolService<L> {
    /// Creates a service using the provided host loader.
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    pub fn into_loader(self) -> L {
        self.loader
    }

    /// Loads one file unless its canonical path is already recorded.
    ///
    /// # Contract
    /// - Already recorded: returns `AlreadyLoaded`, loader is not called.
    /// - Loader success: records canonical path, returns `Loaded`.
    /// - Loader failure: returns `PermissionDenied` or `Failed`.
    pub fn load(&mut self, session: &mut LoadSession, path: &Path) -> LoadOutcome {
        let canonical = canonical_path(path);
        if session.is_loaded(&canonical) {
            debug!(
                "event=symbol_load module=service status=skipped path={}",
                path.display()
            );
            return LoadOutcome::AlreadyLoaded {
                path: path.to_path_buf(),
            };
        }

        match self.loader.add_symbol_file(path) {
            Ok(()) => {
                session.record(canonical);
                info!(
                    "event=symbol_load module=service status=ok path={}",
                    path.display()
                );
                LoadOutcome::Loaded {
                    path: path.to_path_buf(),
                }
            }
            Err(reason) => {
                warn!(
                    "event=symbol_load module=service status=error path={} error={}",
                    path.display(),
                    one_line(&reason, HOST_REASON_LOG_LIMIT)
                );
                classify_failure(path, &reason)
            }
        }
    }

    /// Walks `root` and loads every file matching `extensions`.
    ///
    /// `on_outcome` observes each file outcome as it happens.
    pub fn scan<F>(
        &mut self,
        session: &mut LoadSession,
        root: &Path,
        extensions: &ExtensionSet,
        cancel: &CancelToken,
        on_outcome: F,
    ) -> ScanReport
    where
        F: FnMut(&LoadOutcome),
    {
        self.scan_events(
            session,
            root,
            SymbolWalker::new(root),
            extensions,
            cancel,
            on_outcome,
        )
    }

    /// Same as [`SymbolService::scan`] over an arbitrary walk event stream.
    pub fn scan_events<I, F>(
        &mut self,
        session: &mut LoadSession,
        root: &Path,
        events: I,
        extensions: &ExtensionSet,
        cancel: &CancelToken,
        mut on_outcome: F,
    ) -> ScanReport
    where
        I: IntoIterator<Item = WalkEvent>,
        F: FnMut(&LoadOutcome),
    {
        let started_at = Instant::now();
        info!(
            "event=scan module=service status=start root={}",
            root.display()
        );

        let mut report = ScanReport::new(root);
        for event in events {
            if cancel.is_cancelled() {
                report.interrupted = true;
                break;
            }

            match event {
                WalkEvent::File(path) => {
                    let outcome = if extensions.matches(&path) {
                        self.load(session, &path)
                    } else {
                        LoadOutcome::UnsupportedExtension { path }
                    };
                    report.record(&outcome);
                    on_outcome(&outcome);
                }
                WalkEvent::Denied(path) => report.denied.push(path),
                WalkEvent::Error { path, reason } => report.walk_errors.push((path, reason)),
            }
        }

        info!(
            "event=scan module=service status={} root={} duration_ms={} loaded={} skipped={} failed={} unsupported={} denied={}",
            if report.interrupted { "interrupted" } else { "ok" },
            root.display(),
            started_at.elapsed().as_millis(),
            report.loaded,
            report.skipped,
            report.failures.len(),
            report.unsupported.len(),
            report.denied.len()
        );
        report
    }

    /// Runs one full invocation: resolves the root, then loads or scans.
    pub fn invoke<F>(
        &mut self,
        session: &mut LoadSession,
        request: &LoadRequest,
        cancel: &CancelToken,
        mut on_outcome: F,
    ) -> Invocation
    where
        F: FnMut(&LoadOutcome),
    {
        let root = absolute_path(&request.path);
        let metadata = match std::fs::metadata(&root) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::PermissionDenied => {
                warn!(
                    "event=invoke module=service status=error error_code=root_denied path={}",
                    root.display()
                );
                return Invocation::RootPermissionDenied(root);
            }
            Err(err) => {
                warn!(
                    "event=invoke module=service status=error error_code=not_found path={} error={}",
                    root.display(),
                    err
                );
                return Invocation::NotFound(root);
            }
        };

        if metadata.is_file() {
            if !request.extensions.matches(&root) {
                return Invocation::UnsupportedFile(root);
            }
            let outcome = self.load(session, &root);
            on_outcome(&outcome);
            return Invocation::File(outcome);
        }

        if !metadata.is_dir() {
            return Invocation::UnsupportedFile(root);
        }

        if let Err(err) = check_directory_access(&root) {
            if err.kind() == ErrorKind::PermissionDenied {
                warn!(
                    "event=invoke module=service status=error error_code=root_denied path={} error={}",
                    root.display(),
                    err
                );
                return Invocation::RootPermissionDenied(root);
            }
        }

        Invocation::Directory(self.scan(
            session,
            &root,
            &request.extensions,
            cancel,
            &mut on_outcome,
        ))
    }
}

/// Requires both read and search permission on a directory.
///
/// Listing only needs `r`; resolving `dir/.` fails without `x`.
fn check_directory_access(dir: &Path) -> std::io::Result<()> {
    std::fs::read_dir(dir)?;
    std::fs::metadata(dir.join("."))?;
    Ok(())
}

/// Maps a host failure reason onto a file outcome.
///
/// Back-ticks in host messages are rewritten to single quotes; any
/// "permission denied" text collapses into a terse message.
pub fn classify_failure(path: &Path, reason: &str) -> LoadOutcome {
    if PERMISSION_DENIED_RE.is_match(reason) {
        return LoadOutcome::PermissionDenied {
            path: path.to_path_buf(),
            reason: format!("Permission denied: '{}'", path.display()),
        };
    }
    LoadOutcome::Failed {
        path: path.to_path_buf(),
        reason: reason.trim().replace('`', "'"),
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_failure, SymbolService};
    use crate::cancel::CancelToken;
    use crate::extension::ExtensionSet;
    use crate::loader::{LoaderResult, SymbolLoader};
    use crate::outcome::LoadOutcome;
    use crate::session::LoadSession;
    use crate::walk::WalkEvent;
    use std::path::{Path, PathBuf};

    #[derive(Default)]
    struct CountingLoader {
        calls: Vec<PathBuf>,
    }

    impl SymbolLoader for CountingLoader {
        fn add_symbol_file(&mut self, path: &Path) -> LoaderResult {
            self.calls.push(path.to_path_buf());
            if path.to_string_lossy().contains("broken") {
                return Err("`broken.so': not in executable format".to_string());
            }
            Ok(())
        }
    }

    #[test]
    fn classify_failure_rewrites_backticks() {
        let outcome = classify_failure(
            Path::new("/x/a.so"),
            "`/x/a.so': file format not recognized\n",
        );
        assert_eq!(
            outcome,
            LoadOutcome::Failed {
                path: PathBuf::from("/x/a.so"),
                reason: "'/x/a.so': file format not recognized".to_string(),
            }
        );
    }

    #[test]
    fn classify_failure_detects_permission_denied() {
        let outcome = classify_failure(Path::new("/x/a.so"), "/x/a.so: Permission denied.");
        assert_eq!(
            outcome,
            LoadOutcome::PermissionDenied {
                path: PathBuf::from("/x/a.so"),
                reason: "Permission denied: '/x/a.so'".to_string(),
            }
        );
    }

    #[test]
    fn scan_events_collects_denied_and_errors_without_aborting() {
        let mut service = SymbolService::new(CountingLoader::default());
        let mut session = LoadSession::new();
        let events = vec![
            WalkEvent::File(PathBuf::from("/virtual/a.debug")),
            WalkEvent::Denied(PathBuf::from("/virtual/locked")),
            WalkEvent::Error {
                path: PathBuf::from("/virtual/gone"),
                reason: "vanished".to_string(),
            },
            WalkEvent::File(PathBuf::from("/virtual/broken.so")),
            WalkEvent::File(PathBuf::from("/virtual/readme.md")),
        ];

        let mut seen = Vec::new();
        let report = service.scan_events(
            &mut session,
            Path::new("/virtual"),
            events,
            &ExtensionSet::default(),
            &CancelToken::new(),
            |outcome| seen.push(outcome.clone()),
        );

        assert_eq!(report.loaded, 1);
        assert_eq!(report.denied, vec![PathBuf::from("/virtual/locked")]);
        assert_eq!(report.walk_errors.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].1, "'broken.so': not in executable format");
        assert_eq!(report.unsupported, vec![PathBuf::from("/virtual/readme.md")]);
        assert_eq!(seen.len(), 3);
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn scan_events_stops_when_cancelled() {
        let mut service = SymbolService::new(CountingLoader::default());
        let mut session = LoadSession::new();
        let cancel = CancelToken::new();
        let events = (0..10).map(|i| WalkEvent::File(PathBuf::from(format!("/v/{i}.sym"))));

        let report = service.scan_events(
            &mut session,
            Path::new("/v"),
            events,
            &ExtensionSet::default(),
            &cancel,
            |outcome| {
                if outcome.path() == Path::new("/v/2.sym") {
                    cancel.cancel();
                }
            },
        );

        assert!(report.interrupted);
        assert_eq!(report.loaded, 3);
        assert_eq!(service.loader().calls.len(), 3);
    }
}
