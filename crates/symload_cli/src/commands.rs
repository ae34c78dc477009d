//! Subcommand runners.
//!
//! # Responsibility
//! - Wire parsed arguments to the load service and a concrete host.
//! - Print progress and summary lines for every invocation.

use crate::cli::LoadSymbolsArgs;
use crate::shell::Shell;
use colored::Colorize;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, Write};
use std::path::PathBuf;
use symload_core::{
    core_version, render_invocation, render_progress, CancelToken, GdbConfig, GdbError,
    GdbProcess, LoadSession, ScriptLoader, SymbolLoader, SymbolService, COMMAND_NAME,
};

/// Process-level failures; per-file problems never end up here.
#[derive(Debug)]
pub enum CliError {
    Io(io::Error),
    Gdb(GdbError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Gdb(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Gdb(err) => Some(err),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<GdbError> for CliError {
    fn from(value: GdbError) -> Self {
        Self::Gdb(value)
    }
}

/// Runs one `load-symbols` invocation and prints its report to `out`.
///
/// Malformed extension lists are reported and abort only this invocation.
pub fn run_load_symbols<L: SymbolLoader, W: Write>(
    service: &mut SymbolService<L>,
    session: &mut LoadSession,
    args: &LoadSymbolsArgs,
    cancel: &CancelToken,
    out: &mut W,
) -> io::Result<()> {
    let request = match args.to_request() {
        Ok(request) => request,
        Err(err) => {
            writeln!(out, "{}", format!("{COMMAND_NAME}: {err}").red())?;
            return Ok(());
        }
    };

    cancel.reset();
    let mut write_error = None;
    let mut failed = 0usize;
    let invocation = service.invoke(session, &request, cancel, |outcome| {
        if outcome.is_failure() {
            failed += 1;
        }
        if write_error.is_some() {
            return;
        }
        if let Some(line) = render_progress(outcome) {
            if let Err(err) = writeln!(out, "{line}") {
                write_error = Some(err);
            }
        }
    });
    if let Some(err) = write_error {
        return Err(err);
    }

    for line in render_invocation(&invocation) {
        writeln!(out, "{line}")?;
    }
    info!(
        "event=invoke module=cli status=ok loaded={} failed={} session_size={}",
        invocation.loaded_count(),
        failed,
        session.len()
    );
    Ok(())
}

/// `symload script`: gdb commands on stdout, report on stderr.
pub fn run_script(args: &LoadSymbolsArgs, cancel: &CancelToken) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut service = SymbolService::new(ScriptLoader::new(stdout.lock()));
    let mut session = LoadSession::new();
    let mut stderr = io::stderr();
    run_load_symbols(&mut service, &mut session, args, cancel, &mut stderr)?;
    service.into_loader().into_inner().flush()?;
    Ok(())
}

/// `symload load`: one invocation against a fresh gdb session.
pub fn run_load(
    args: &LoadSymbolsArgs,
    gdb: PathBuf,
    program: Option<PathBuf>,
    cancel: &CancelToken,
) -> Result<(), CliError> {
    let process = GdbProcess::spawn(&GdbConfig {
        program: gdb,
        target: program,
    })?;
    let mut service = SymbolService::new(process);
    let mut session = LoadSession::new();
    let mut stdout = io::stdout();
    run_load_symbols(&mut service, &mut session, args, cancel, &mut stdout)?;
    service.into_loader().shutdown()?;
    Ok(())
}

/// `symload shell`: interactive loop sharing one session.
pub fn run_shell(
    gdb: PathBuf,
    program: Option<PathBuf>,
    cancel: CancelToken,
) -> Result<(), CliError> {
    let process = GdbProcess::spawn(&GdbConfig {
        program: gdb,
        target: program,
    })?;
    println!(
        "{} {} {}",
        "symload".green(),
        core_version().cyan(),
        "ready; type `help` for commands, `quit` to leave.".yellow()
    );

    let mut shell = Shell::new(process, cancel);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    shell.run(stdin.lock(), &mut stdout)?;
    info!(
        "event=shell_exit module=cli status=ok session_size={}",
        shell.session().len()
    );
    shell.into_host().shutdown()?;
    Ok(())
}
