//! File logging for symload runs.
//!
//! Console output is reserved for load reports, so diagnostics go to rolling
//! files in one directory per process. `init_logging` may be repeated with
//! the same [`LogConfig`]; any other configuration is refused.

use crate::session::absolute_path;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const LOG_FILE_BASENAME: &str = "symload";
const LOG_DIR_NAME: &str = "symload-logs";
const ROTATE_AT_BYTES: u64 = 4 * 1024 * 1024;
const KEEP_LOG_FILES: usize = 5;
const PANIC_TEXT_LIMIT: usize = 160;

static ACTIVE: OnceCell<(LogConfig, LoggerHandle)> = OnceCell::new();
static PANIC_LOGGING: OnceCell<()> = OnceCell::new();

/// Where and how verbosely a run logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LevelFilter,
    pub dir: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
        }
    }
}

impl LogConfig {
    /// Fills unset `--log-level` / `--log-dir` values with defaults.
    ///
    /// Relative directories are resolved against the working directory.
    ///
    /// # Errors
    /// - Unknown level names.
    /// - An empty directory value.
    pub fn resolve(level: Option<&str>, dir: Option<&Path>) -> Result<Self, String> {
        let level = match level.map(str::trim) {
            None | Some("") => default_log_level(),
            Some(value) => LevelFilter::from_str(value).map_err(|_| {
                format!("unsupported log level `{value}`; expected trace|debug|info|warn|error|off")
            })?,
        };
        let dir = match dir {
            None => default_log_dir(),
            Some(path) if path.as_os_str().is_empty() => {
                return Err("log directory cannot be empty".to_string())
            }
            Some(path) => absolute_path(path),
        };
        Ok(Self { level, dir })
    }
}

/// Starts the rolling file logger, or confirms it already runs with `config`.
pub fn init_logging(config: &LogConfig) -> Result<(), String> {
    let (active, _) = ACTIVE.get_or_try_init(|| {
        start_logger(config).map(|handle| (config.clone(), handle))
    })?;

    if active != config {
        return Err(format!(
            "logging already writes `{}` logs to `{}`; refusing to switch to `{}` in `{}`",
            active.level,
            active.dir.display(),
            config.level,
            config.dir.display()
        ));
    }
    Ok(())
}

/// Configuration of the running logger, if any.
pub fn logging_status() -> Option<LogConfig> {
    ACTIVE.get().map(|(config, _)| config.clone())
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

pub fn default_log_dir() -> PathBuf {
    std::env::temp_dir().join(LOG_DIR_NAME)
}

fn start_logger(config: &LogConfig) -> Result<LoggerHandle, String> {
    std::fs::create_dir_all(&config.dir).map_err(|err| {
        format!(
            "failed to create log directory `{}`: {err}",
            config.dir.display()
        )
    })?;

    let spec = config.level.to_string().to_ascii_lowercase();
    let handle = Logger::try_with_str(&spec)
        .map_err(|err| format!("invalid log level `{spec}`: {err}"))?
        .log_to_file(
            FileSpec::default()
                .directory(config.dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    PANIC_LOGGING.get_or_init(log_panics);
    info!(
        "event=app_start module=core status=ok version={} os={} level={} log_dir={}",
        crate::core_version(),
        std::env::consts::OS,
        config.level,
        config.dir.display()
    );
    Ok(handle)
}

/// Chains a hook that records panics before the default report.
fn log_panics() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info.location().map_or_else(
            || "unknown".to_string(),
            |at| format!("{}:{}", at.file(), at.line()),
        );
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        error!(
            "event=panic module=core status=error location={location} payload={}",
            one_line(payload, PANIC_TEXT_LIMIT)
        );
        previous(info);
    }));
}

/// Collapses multi-line host text into one bounded log field.
pub(crate) fn one_line(text: &str, limit: usize) -> String {
    let mut line: String = text
        .trim()
        .chars()
        .take(limit)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if text.trim().chars().count() > limit {
        line.push_str("...");
    }
    line
}
