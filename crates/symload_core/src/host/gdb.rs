//! gdb session driven over the MI protocol.
//!
//! # Responsibility
//! - Spawn a gdb child process in MI mode and keep it alive for a session.
//! - Run console commands and collect their output and result class.
//! - Expose `add-symbol-file` as a [`SymbolLoader`].
//!
//! # Invariants
//! - Every command carries a fresh numeric token; responses are matched by it.
//! - A response is complete only once the `(gdb)` prompt line was read.

use super::mi::{encode_c_string, parse_record, MiRecord, ResultClass, StreamKind};
use crate::loader::{quote_gdb_argument, LoaderResult, SymbolLoader};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Instant;

pub type GdbResult<T> = Result<T, GdbError>;

/// Failures talking to the gdb child.
#[derive(Debug)]
pub enum GdbError {
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },
    Io(std::io::Error),
    /// gdb closed its output before answering.
    Closed,
    /// A command answered with `^error`.
    Command(String),
}

impl Display for GdbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn { program, source } => {
                write!(f, "failed to start `{}`: {source}", program.display())
            }
            Self::Io(err) => write!(f, "gdb I/O error: {err}"),
            Self::Closed => write!(f, "gdb session closed"),
            Self::Command(message) => write!(f, "{message}"),
        }
    }
}

impl Error for GdbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::Io(err) => Some(err),
            Self::Closed | Self::Command(_) => None,
        }
    }
}

impl From<std::io::Error> for GdbError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Collected answer to one MI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiResponse {
    pub class: ResultClass,
    pub message: Option<String>,
    /// Concatenated `~` and `@` stream text plus raw inferior output.
    pub console: String,
    /// Concatenated `&` stream text.
    pub log: String,
}

impl MiResponse {
    pub fn is_error(&self) -> bool {
        self.class == ResultClass::Error
    }

    /// Best available failure text for `^error` answers.
    pub fn error_text(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => self.log.trim().to_string(),
        }
    }
}

/// Token-matched MI command channel over any reader/writer pair.
pub struct MiChannel<R: BufRead, W: Write> {
    reader: R,
    writer: W,
    next_token: u64,
}

impl<R: BufRead, W: Write> MiChannel<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            next_token: 1,
        }
    }

    /// Consumes startup output up to and including the first prompt.
    pub fn wait_ready(&mut self) -> GdbResult<()> {
        loop {
            match self.read_record()? {
                MiRecord::Prompt => return Ok(()),
                other => debug!("event=gdb_banner module=host record={other:?}"),
            }
        }
    }

    /// Sends one raw MI command and waits for its result record and prompt.
    pub fn execute(&mut self, command: &str) -> GdbResult<MiResponse> {
        let token = self.next_token;
        self.next_token += 1;

        writeln!(self.writer, "{token}{command}")?;
        self.writer.flush()?;

        let mut console = String::new();
        let mut log = String::new();
        let mut result = None;
        loop {
            match self.read_record()? {
                MiRecord::Stream { kind, text } => match kind {
                    StreamKind::Console | StreamKind::Target => console.push_str(&text),
                    StreamKind::Log => log.push_str(&text),
                },
                MiRecord::Result {
                    token: Some(answered),
                    class,
                    message,
                    ..
                } if answered == token => result = Some((class, message)),
                MiRecord::Result { token, .. } => {
                    warn!("event=gdb_command module=host status=stale_result token={token:?}")
                }
                MiRecord::Async(_) => {}
                MiRecord::Prompt => {
                    if let Some((class, message)) = result.take() {
                        return Ok(MiResponse {
                            class,
                            message,
                            console,
                            log,
                        });
                    }
                }
            }
        }
    }

    /// Runs a CLI command through `-interpreter-exec console`.
    pub fn console(&mut self, command: &str) -> GdbResult<MiResponse> {
        self.execute(&format!(
            "-interpreter-exec console {}",
            encode_c_string(command)
        ))
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    fn read_record(&mut self) -> GdbResult<MiRecord> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(GdbError::Closed);
            }
            if line.trim().is_empty() {
                continue;
            }
            // The inferior shares gdb's stdout, so unframed lines are its output.
            return Ok(match parse_record(&line) {
                Ok(record) => record,
                Err(err) => {
                    debug!("event=gdb_output module=host status=raw error={err}");
                    MiRecord::Stream {
                        kind: StreamKind::Target,
                        text: line,
                    }
                }
            });
        }
    }
}

impl<R: BufRead, W: Write> SymbolLoader for MiChannel<R, W> {
    fn add_symbol_file(&mut self, path: &Path) -> LoaderResult {
        let command = format!(
            "add-symbol-file {}",
            quote_gdb_argument(&path.to_string_lossy())
        );
        match self.console(&command) {
            Ok(response) if response.is_error() => Err(response.error_text()),
            Ok(_) => Ok(()),
            Err(err) => Err(err.to_string()),
        }
    }
}

/// Launch options for a gdb child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GdbConfig {
    /// gdb executable name or path.
    pub program: PathBuf,
    /// Optional program to debug.
    pub target: Option<PathBuf>,
}

impl Default for GdbConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("gdb"),
            target: None,
        }
    }
}

/// Live gdb child process speaking MI on its stdio.
pub struct GdbProcess {
    child: Child,
    channel: MiChannel<BufReader<ChildStdout>, ChildStdin>,
    exited: bool,
}

impl GdbProcess {
    /// Starts gdb and waits until it is ready for commands.
    ///
    /// # Side effects
    /// - Spawns `gdb --interpreter=mi3 --quiet --nx [target]`.
    /// - Disables confirmation queries for the session.
    pub fn spawn(config: &GdbConfig) -> GdbResult<Self> {
        let started_at = Instant::now();
        info!(
            "event=gdb_spawn module=host status=start program={}",
            config.program.display()
        );

        let mut command = Command::new(&config.program);
        command
            .args(["--interpreter=mi3", "--quiet", "--nx"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(target) = &config.target {
            command.arg(target);
        }
        // Terminal Ctrl-C reaches gdb only when the caller relays it.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(|source| {
            error!(
                "event=gdb_spawn module=host status=error program={} error={}",
                config.program.display(),
                source
            );
            GdbError::Spawn {
                program: config.program.clone(),
                source,
            }
        })?;

        let (Some(stdout), Some(stdin)) = (child.stdout.take(), child.stdin.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(GdbError::Closed);
        };

        let mut process = Self {
            child,
            channel: MiChannel::new(BufReader::new(stdout), stdin),
            exited: false,
        };
        process.channel.wait_ready()?;
        let response = process.channel.execute("-gdb-set confirm off")?;
        if response.is_error() {
            return Err(GdbError::Command(response.error_text()));
        }

        info!(
            "event=gdb_spawn module=host status=ok pid={} duration_ms={}",
            process.child.id(),
            started_at.elapsed().as_millis()
        );
        Ok(process)
    }

    /// Child pid; gdb leads its own process group, so this is also the pgid.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Runs one gdb CLI command and returns its response.
    pub fn console(&mut self, command: &str) -> GdbResult<MiResponse> {
        debug!("event=gdb_command module=host status=start");
        self.channel.console(command)
    }

    /// Asks gdb to exit and reaps the child.
    pub fn shutdown(mut self) -> GdbResult<()> {
        self.exit()
    }

    fn exit(&mut self) -> GdbResult<()> {
        if self.exited {
            return Ok(());
        }
        self.exited = true;
        writeln!(self.channel.writer_mut(), "-gdb-exit")?;
        self.channel.writer_mut().flush()?;
        let status = self.child.wait()?;
        info!("event=gdb_exit module=host status=ok exit_status={status}");
        Ok(())
    }
}

impl SymbolLoader for GdbProcess {
    fn add_symbol_file(&mut self, path: &Path) -> LoaderResult {
        self.channel.add_symbol_file(path)
    }
}

impl Drop for GdbProcess {
    fn drop(&mut self) {
        if !self.exited {
            self.exited = true;
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GdbError, MiChannel};
    use crate::host::mi::ResultClass;
    use crate::loader::SymbolLoader;
    use std::io::Cursor;
    use std::path::Path;

    fn channel(transcript: &str) -> MiChannel<Cursor<Vec<u8>>, Vec<u8>> {
        MiChannel::new(Cursor::new(transcript.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn wait_ready_skips_banner() {
        let mut mi = channel("=thread-group-added,id=\"i1\"\n~\"hello\\n\"\n(gdb) \n");
        mi.wait_ready().expect("prompt should be found");
    }

    #[test]
    fn execute_matches_token_and_collects_streams() {
        let mut mi = channel(concat!(
            "&\"info line\\n\"\n",
            "~\"first\\n\"\n",
            "1^done\n",
            "(gdb) \n",
        ));
        let response = mi.execute("-gdb-version").expect("response");
        assert_eq!(response.class, ResultClass::Done);
        assert_eq!(response.console, "first\n");
        assert_eq!(response.log, "info line\n");
        assert_eq!(
            String::from_utf8(mi.writer_mut().clone()).unwrap(),
            "1-gdb-version\n"
        );
    }

    #[test]
    fn execute_ignores_stale_results() {
        let mut mi = channel(concat!("9^done\n", "(gdb) \n", "1^done\n", "(gdb) \n"));
        let response = mi.execute("-list-features").expect("response");
        assert_eq!(response.class, ResultClass::Done);
    }

    #[test]
    fn execute_reports_closed_stream() {
        let mut mi = channel("~\"partial\"\n");
        assert!(matches!(mi.execute("-gdb-version"), Err(GdbError::Closed)));
    }

    #[test]
    fn raw_inferior_output_is_echoed_with_the_next_answer() {
        let mut mi = channel(concat!(
            "1^running\n",
            "*running,thread-id=\"all\"\n",
            "(gdb) \n",
            "Hello from inferior\n",
            "~oops no quote\n",
            "*stopped,reason=\"exited-normally\"\n",
            "(gdb) \n",
            "2^done\n",
            "(gdb) \n",
        ));
        let first = mi.console("run").expect("run answers");
        assert_eq!(first.class, ResultClass::Running);

        let second = mi.console("info inferiors").expect("raw lines are not errors");
        assert_eq!(second.class, ResultClass::Done);
        assert_eq!(second.console, "Hello from inferior\n~oops no quote\n");
    }

    #[test]
    fn add_symbol_file_sends_quoted_console_command() {
        let mut mi = channel(concat!(
            "~\"add symbol table from file \\\"/s/a b.so\\\"\\n\"\n",
            "1^done\n",
            "(gdb) \n",
        ));
        mi.add_symbol_file(Path::new("/s/a b.so"))
            .expect("load should succeed");
        let sent = String::from_utf8(mi.writer_mut().clone()).unwrap();
        assert_eq!(
            sent,
            "1-interpreter-exec console \"add-symbol-file '/s/a b.so'\"\n"
        );
    }

    #[test]
    fn add_symbol_file_returns_error_message() {
        let mut mi = channel(concat!(
            "&\"add-symbol-file '/s/x.so'\\n\"\n",
            "1^error,msg=\"/s/x.so: No such file or directory.\"\n",
            "(gdb) \n",
        ));
        let reason = mi
            .add_symbol_file(Path::new("/s/x.so"))
            .expect_err("load should fail");
        assert_eq!(reason, "/s/x.so: No such file or directory.");
    }

    #[test]
    fn add_symbol_file_falls_back_to_log_text() {
        let mut mi = channel(concat!(
            "&\"`/s/y.so': can't read symbols: file format not recognized.\\n\"\n",
            "1^error\n",
            "(gdb) \n",
        ));
        let reason = mi
            .add_symbol_file(Path::new("/s/y.so"))
            .expect_err("load should fail");
        assert_eq!(
            reason,
            "`/s/y.so': can't read symbols: file format not recognized."
        );
    }
}
