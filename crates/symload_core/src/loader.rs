//! Host capability for registering one symbol file.
//!
//! # Responsibility
//! - Define the single operation core needs from a debugger host.
//! - Provide a script-emitting implementation for dry runs.
//!
//! # Invariants
//! - Implementations receive the path as the user spelled it, not the
//!   canonical dedup key.
//! - Failure reasons are human-readable host messages.

use std::io::Write;
use std::path::Path;

/// Result of one host load call; `Err` carries the host's reason text.
pub type LoaderResult = Result<(), String>;

/// Debugger-side "register symbol file at path" primitive.
pub trait SymbolLoader {
    fn add_symbol_file(&mut self, path: &Path) -> LoaderResult;
}

/// Writes one gdb `add-symbol-file` command per load request.
///
/// The output can be fed to `gdb -x`. Every write that succeeds counts as
/// a successful load.
pub struct ScriptLoader<W: Write> {
    out: W,
}

impl<W: Write> ScriptLoader<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SymbolLoader for ScriptLoader<W> {
    fn add_symbol_file(&mut self, path: &Path) -> LoaderResult {
        writeln!(
            self.out,
            "add-symbol-file {}",
            quote_gdb_argument(&path.to_string_lossy())
        )
        .map_err(|err| format!("failed to write script line: {err}"))
    }
}

/// Quotes one argument for gdb's argv-style command parser.
pub fn quote_gdb_argument(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}
