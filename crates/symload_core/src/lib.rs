//! Core logic for symload.
//! Discovers symbol files below a path and registers them with a debugger
//! session exactly once per session.

pub mod cancel;
pub mod extension;
pub mod host;
pub mod loader;
pub mod logging;
pub mod outcome;
pub mod report;
pub mod service;
pub mod session;
pub mod walk;

pub use cancel::CancelToken;
pub use extension::{ExtensionError, ExtensionSet, DEFAULT_EXTENSIONS};
pub use host::gdb::{GdbConfig, GdbError, GdbProcess, GdbResult, MiChannel, MiResponse};
pub use loader::{LoaderResult, ScriptLoader, SymbolLoader};
pub use logging::{default_log_dir, default_log_level, init_logging, logging_status, LogConfig};
pub use outcome::{Invocation, LoadOutcome, ScanReport};
pub use report::{render_invocation, render_progress, render_scan, SUMMARY_LIMIT};
pub use service::symbol_service::{classify_failure, LoadRequest, SymbolService};
pub use session::{canonical_path, LoadSession};
pub use walk::{SymbolWalker, WalkEvent};

/// Name of the command users type inside a session.
pub const COMMAND_NAME: &str = "load-symbols";

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, COMMAND_NAME};

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn command_name_is_stable() {
        assert_eq!(COMMAND_NAME, "load-symbols");
    }
}
