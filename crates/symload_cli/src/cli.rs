//! Command-line surface.
//!
//! # Responsibility
//! - Define process-level flags and subcommands.
//! - Parse `load-symbols` lines typed inside the interactive shell.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use symload_core::{ExtensionError, ExtensionSet, LoadRequest, COMMAND_NAME};

#[derive(Debug, Parser)]
#[command(
    name = "symload",
    about = "Recursively load symbol files into a gdb session",
    version
)]
pub struct Cli {
    /// Disable ANSI colors in console output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// trace|debug|info|warn|error|off
    #[arg(long, global = true, env = "SYMLOAD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files.
    #[arg(long, global = true, env = "SYMLOAD_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start gdb and read commands interactively.
    Shell {
        #[command(flatten)]
        gdb: GdbArgs,
        /// Program to debug.
        program: Option<PathBuf>,
    },
    /// Load symbol files into a fresh gdb session and exit.
    Load {
        #[command(flatten)]
        target: LoadSymbolsArgs,
        #[command(flatten)]
        gdb: GdbArgs,
        /// Program to debug.
        #[arg(long)]
        program: Option<PathBuf>,
    },
    /// Print a gdb script with one add-symbol-file line per match.
    Script {
        #[command(flatten)]
        target: LoadSymbolsArgs,
    },
}

impl Command {
    /// Subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Shell { .. } => "shell",
            Self::Load { .. } => "load",
            Self::Script { .. } => "script",
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct GdbArgs {
    /// gdb executable.
    #[arg(long, default_value = "gdb", env = "SYMLOAD_GDB")]
    pub gdb: PathBuf,
}

/// Arguments of one `load-symbols` invocation.
#[derive(Debug, Clone, Args, PartialEq, Eq)]
pub struct LoadSymbolsArgs {
    /// Path to a symbol file or directory.
    pub path: PathBuf,

    /// Extra extensions, comma-separated (e.g. --ext=.dbg,.elf)
    #[arg(long)]
    pub ext: Option<String>,
}

impl LoadSymbolsArgs {
    pub fn to_request(&self) -> Result<LoadRequest, ExtensionError> {
        let extensions = ExtensionSet::from_option(self.ext.as_deref())?;
        Ok(LoadRequest::new(self.path.clone(), extensions))
    }
}

/// Standalone parser for shell lines starting with `load-symbols`.
#[derive(Debug, Parser)]
#[command(
    name = "load-symbols",
    about = "Recursively load all symbol files from a directory or load a single symbol file.",
    disable_version_flag = true
)]
pub struct LoadSymbolsCommand {
    #[command(flatten)]
    pub args: LoadSymbolsArgs,
}

/// Parses the words after the command name.
pub fn parse_load_symbols(words: &[String]) -> Result<LoadSymbolsArgs, clap::Error> {
    let argv = std::iter::once(COMMAND_NAME.to_string()).chain(words.iter().cloned());
    LoadSymbolsCommand::try_parse_from(argv).map(|command| command.args)
}
