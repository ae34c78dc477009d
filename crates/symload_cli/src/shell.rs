//! Interactive command loop on top of a debugger host.
//!
//! # Responsibility
//! - Dispatch `load-symbols` lines to the load service.
//! - Forward every other line to the debugger console.
//!
//! # Invariants
//! - One `LoadSession` lives for the whole shell.
//! - A malformed command line aborts only that line.

use crate::cli::parse_load_symbols;
use crate::commands::run_load_symbols;
use crate::signal::forward_interrupts_to;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use symload_core::{
    logging_status, CancelToken, GdbProcess, LoadSession, SymbolLoader, SymbolService,
    COMMAND_NAME,
};

const PROMPT: &str = "(symload) ";

/// Debugger console access beyond symbol loading.
pub trait DebuggerConsole {
    /// Runs one CLI command and returns its console output.
    fn run_console(&mut self, command: &str) -> Result<String, String>;

    /// Process group that should see Ctrl-C while a command runs.
    fn process_group(&self) -> Option<u32> {
        None
    }
}

impl DebuggerConsole for GdbProcess {
    fn run_console(&mut self, command: &str) -> Result<String, String> {
        match self.console(command) {
            Ok(response) if response.is_error() => Err(response.error_text()),
            Ok(response) => Ok(response.console),
            Err(err) => Err(err.to_string()),
        }
    }

    fn process_group(&self) -> Option<u32> {
        Some(self.pid())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellAction {
    Continue,
    Quit,
}

pub struct Shell<H: SymbolLoader + DebuggerConsole> {
    service: SymbolService<H>,
    session: LoadSession,
    cancel: CancelToken,
}

impl<H: SymbolLoader + DebuggerConsole> Shell<H> {
    pub fn new(host: H, cancel: CancelToken) -> Self {
        Self {
            service: SymbolService::new(host),
            session: LoadSession::new(),
            cancel,
        }
    }

    pub fn session(&self) -> &LoadSession {
        &self.session
    }

    pub fn into_host(self) -> H {
        self.service.into_loader()
    }

    /// Reads lines until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, out: &mut W) -> io::Result<()> {
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                return Ok(());
            }
            if self.handle_line(&line, out)? == ShellAction::Quit {
                return Ok(());
            }
        }
    }

    /// Executes one command line.
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<ShellAction> {
        let words = match split_words(line) {
            Ok(words) => words,
            Err(message) => {
                writeln!(out, "{}", message.red())?;
                return Ok(ShellAction::Continue);
            }
        };
        let Some(command) = words.first() else {
            return Ok(ShellAction::Continue);
        };

        match command.as_str() {
            "quit" | "exit" | "q" => return Ok(ShellAction::Quit),
            "help" => print_help(out)?,
            "loaded" => {
                for path in self.session.loaded_paths() {
                    writeln!(out, "{}", format!("'{}'", path.display()).purple())?;
                }
                writeln!(
                    out,
                    "{} {} {}",
                    "Session has".yellow(),
                    self.session.len().to_string().cyan(),
                    "loaded symbol files.".yellow()
                )?;
            }
            name if name == COMMAND_NAME => match parse_load_symbols(&words[1..]) {
                Ok(args) => {
                    run_load_symbols(
                        &mut self.service,
                        &mut self.session,
                        &args,
                        &self.cancel,
                        out,
                    )?;
                }
                Err(err) => write!(out, "{err}")?,
            },
            _ => {
                let _forward = forward_interrupts_to(self.service.loader().process_group());
                match self.service.loader_mut().run_console(line.trim()) {
                    Ok(text) => write!(out, "{text}")?,
                    Err(message) => writeln!(out, "{}", message.red())?,
                }
            }
        }
        Ok(ShellAction::Continue)
    }
}

fn print_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{COMMAND_NAME} PATH [--ext=.dbg,.elf]")?;
    writeln!(
        out,
        "    Recursively load all symbol files from a directory or load a single symbol file."
    )?;
    writeln!(out, "loaded")?;
    writeln!(out, "    List symbol files loaded in this session.")?;
    writeln!(out, "quit")?;
    writeln!(out, "    Leave the shell.")?;
    writeln!(out, "Anything else is passed to gdb.")?;
    if let Some(config) = logging_status() {
        writeln!(out, "Logs: '{}'", config.dir.display())?;
    }
    Ok(())
}

/// Splits a command line into words honoring quotes and backslashes.
pub fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some('"'), '\\') | (None, '\\') => match chars.next() {
                Some(escaped) => {
                    current.push(escaped);
                    in_word = true;
                }
                None => return Err("trailing backslash".to_string()),
            },
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(open) = quote {
        return Err(format!("unterminated {open} quote"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::{split_words, DebuggerConsole, Shell, ShellAction};
    use crate::signal::forward_target;
    use std::fs;
    use std::io::Cursor;
    use std::path::{Path, PathBuf};
    use symload_core::{CancelToken, LoaderResult, SymbolLoader};

    #[derive(Default)]
    struct FakeHost {
        loaded: Vec<PathBuf>,
        console: Vec<String>,
        group: Option<u32>,
        relayed_to: Vec<Option<i32>>,
    }

    impl SymbolLoader for FakeHost {
        fn add_symbol_file(&mut self, path: &Path) -> LoaderResult {
            self.loaded.push(path.to_path_buf());
            Ok(())
        }
    }

    impl DebuggerConsole for FakeHost {
        fn run_console(&mut self, command: &str) -> Result<String, String> {
            self.console.push(command.to_string());
            self.relayed_to.push(forward_target());
            if command == "bogus" {
                return Err("Undefined command: \"bogus\".".to_string());
            }
            Ok(format!("ran {command}\n"))
        }

        fn process_group(&self) -> Option<u32> {
            self.group
        }
    }

    fn run(shell: &mut Shell<FakeHost>, line: &str) -> (ShellAction, String) {
        colored::control::set_override(false);
        let mut out = Vec::new();
        let action = shell.handle_line(line, &mut out).unwrap();
        (action, String::from_utf8(out).unwrap())
    }

    #[test]
    fn split_words_handles_quotes_and_escapes() {
        assert_eq!(
            split_words(r#"load-symbols "/a b/c" --ext='.x y' d\ e"#).unwrap(),
            vec!["load-symbols", "/a b/c", "--ext=.x y", "d e"]
        );
        assert_eq!(split_words("   ").unwrap(), Vec::<String>::new());
        assert_eq!(split_words("''").unwrap(), vec![String::new()]);
        assert!(split_words("\"open").is_err());
    }

    #[test]
    fn load_symbols_line_uses_session_across_commands() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.debug"), b"").unwrap();
        let mut shell = Shell::new(FakeHost::default(), CancelToken::new());

        let line = format!("load-symbols {}", dir.path().display());
        let (_, first) = run(&mut shell, &line);
        assert!(first.contains("Loaded"));
        assert!(first.contains("Total loaded 1 symbol file."));

        let (_, second) = run(&mut shell, &line);
        assert!(second.contains("have already been loaded."));
        assert_eq!(shell.session().len(), 1);

        let (_, listing) = run(&mut shell, "loaded");
        assert!(listing.contains("Session has 1 loaded symbol files."));
        assert_eq!(shell.into_host().loaded.len(), 1);
    }

    #[test]
    fn malformed_load_symbols_line_has_no_side_effects() {
        let mut shell = Shell::new(FakeHost::default(), CancelToken::new());
        let (action, out) = run(&mut shell, "load-symbols");
        assert_eq!(action, ShellAction::Continue);
        assert!(out.contains("Usage"));

        let (_, out) = run(&mut shell, "load-symbols /tmp --ext=.");
        assert!(out.contains("bare"));
        assert!(shell.session().is_empty());
        assert!(shell.into_host().loaded.is_empty());
    }

    #[test]
    fn other_lines_are_forwarded_to_the_debugger() {
        let mut shell = Shell::new(FakeHost::default(), CancelToken::new());
        let (_, out) = run(&mut shell, "info sharedlibrary\n");
        assert_eq!(out, "ran info sharedlibrary\n");

        let (_, out) = run(&mut shell, "bogus");
        assert_eq!(out, "Undefined command: \"bogus\".\n");
        assert_eq!(
            shell.into_host().console,
            vec!["info sharedlibrary".to_string(), "bogus".to_string()]
        );
    }

    #[test]
    fn ctrl_c_is_relayed_to_the_debugger_only_while_a_command_runs() {
        let host = FakeHost {
            group: Some(4242),
            ..FakeHost::default()
        };
        let mut shell = Shell::new(host, CancelToken::new());
        assert_eq!(forward_target(), None);

        run(&mut shell, "continue");
        assert_eq!(forward_target(), None);
        run(&mut shell, "help");
        assert_eq!(shell.into_host().relayed_to, vec![Some(4242)]);
    }

    #[test]
    fn run_stops_on_quit_or_eof() {
        colored::control::set_override(false);
        let mut shell = Shell::new(FakeHost::default(), CancelToken::new());
        let mut out = Vec::new();
        shell
            .run(Cursor::new("help\nquit\nbacktrace\n"), &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("load-symbols PATH"));
        assert!(shell.into_host().console.is_empty());

        let mut shell = Shell::new(FakeHost::default(), CancelToken::new());
        let mut out = Vec::new();
        shell.run(Cursor::new(""), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "(symload) \n");
    }
}
