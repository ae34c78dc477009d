//! `symload` entry point.
//!
//! # Responsibility
//! - Parse process arguments and configure colors and logging.
//! - Dispatch to the subcommand runners.

mod cli;
mod commands;
mod shell;
mod signal;

use clap::Parser;
use cli::{Cli, Command};
use colored::Colorize;
use log::{error, info};
use std::io::IsTerminal;
use std::process::ExitCode;
use symload_core::{init_logging, LogConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color || !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let logging = LogConfig::resolve(cli.log_level.as_deref(), cli.log_dir.as_deref())
        .and_then(|config| init_logging(&config));
    if let Err(message) = logging {
        eprintln!("{} {message}", "warning: logging disabled:".yellow());
    }
    info!("event=app_command module=cli command={}", cli.command.name());

    let cancel = signal::install_interrupt_handler();
    let result = match cli.command {
        Command::Shell { gdb, program } => commands::run_shell(gdb.gdb, program, cancel),
        Command::Load {
            target,
            gdb,
            program,
        } => commands::run_load(&target, gdb.gdb, program, &cancel),
        Command::Script { target } => commands::run_script(&target, &cancel),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=app_exit module=cli status=error error={err}");
            eprintln!("{} {err}", "symload:".red());
            ExitCode::FAILURE
        }
    }
}
