//! Rolling file logs for normalization runs.
//!
//! # Responsibility
//! - Start the `flexi_logger` backend once per process from a [`LogSetup`].
//! - Log panics raised inside long passes before the default hook runs.
//!
//! # Invariants
//! - A second start with an equal setup is a no-op, any other setup is
//!   rejected.
//! - Starting never panics.

use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "taxotree";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
/// Panic messages often quote scientific names or citations from raw records.
const MAX_PANIC_PAYLOAD_CHARS: usize = 120;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    setup: LogSetup,
    _handle: LoggerHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parses a level name, case-insensitive. `warning` is accepted for `warn`.
    pub fn parse(value: &str) -> Result<Self, LoggingError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(LoggingError::UnsupportedLevel(value.trim().to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// `debug` for debug builds, `info` otherwise.
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Info
        }
    }
}

/// Where and how verbosely a process logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSetup {
    pub level: LogLevel,
    pub dir: PathBuf,
    /// Copy warnings and errors to stderr as well.
    pub stderr: bool,
}

impl LogSetup {
    /// # Errors
    /// - `InvalidDir` when `dir` is empty or relative.
    pub fn new(level: LogLevel, dir: impl AsRef<Path>) -> Result<Self, LoggingError> {
        let dir = dir.as_ref();
        if dir.as_os_str().is_empty() || !dir.is_absolute() {
            return Err(LoggingError::InvalidDir(dir.to_path_buf()));
        }
        Ok(Self {
            level,
            dir: dir.to_path_buf(),
            stderr: false,
        })
    }

    pub fn with_stderr(mut self, stderr: bool) -> Self {
        self.stderr = stderr;
        self
    }
}

#[derive(Debug)]
pub enum LoggingError {
    UnsupportedLevel(String),
    /// Log directories must be absolute.
    InvalidDir(PathBuf),
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(flexi_logger::FlexiLoggerError),
    /// Logging already runs with a different setup.
    Conflict { active: LogSetup },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::InvalidDir(dir) => {
                write!(f, "log directory must be an absolute path, got `{}`", dir.display())
            }
            Self::CreateDir { dir, source } => {
                write!(f, "cannot create log directory `{}`: {source}", dir.display())
            }
            Self::Backend(err) => write!(f, "cannot start logger: {err}"),
            Self::Conflict { active } => write!(
                f,
                "logging already runs at `{}` with level `{}`",
                active.dir.display(),
                active.level.as_str()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

/// Starts file logging, or checks that the running logger matches `setup`.
///
/// # Errors
/// - `Conflict` when another setup is already active.
/// - `CreateDir` or `Backend` when the logger cannot start.
pub fn init_logging(setup: &LogSetup) -> Result<(), LoggingError> {
    let active = ACTIVE.get_or_try_init(|| start(setup))?;
    if active.setup != *setup {
        return Err(LoggingError::Conflict {
            active: active.setup.clone(),
        });
    }
    Ok(())
}

/// Setup of the running logger, if any.
pub fn active_logging() -> Option<LogSetup> {
    ACTIVE.get().map(|active| active.setup.clone())
}

fn start(setup: &LogSetup) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&setup.dir).map_err(|source| LoggingError::CreateDir {
        dir: setup.dir.clone(),
        source,
    })?;
    let duplicate = if setup.stderr {
        Duplicate::Warn
    } else {
        Duplicate::None
    };
    let handle = Logger::try_with_str(setup.level.as_str())
        .map_err(LoggingError::Backend)?
        .log_to_file(
            FileSpec::default()
                .directory(setup.dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .duplicate_to_stderr(duplicate)
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(LoggingError::Backend)?;

    PANIC_HOOK.get_or_init(install_panic_hook);
    info!(
        "event=logging_init module=logging status=ok version={} level={} log_dir={} stderr={}",
        env!("CARGO_PKG_VERSION"),
        setup.level.as_str(),
        setup.dir.display(),
        setup.stderr
    );
    Ok(ActiveLogger {
        setup: setup.clone(),
        _handle: handle,
    })
}

fn install_panic_hook() {
    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let thread = std::thread::current();
        error!(
            "event=panic_captured module=logging status=error thread={} location={} payload=\"{}\"",
            thread.name().unwrap_or("unnamed"),
            location,
            payload_summary(panic_info.payload())
        );
        previous_hook(panic_info);
    }));
}

/// Single-line, quote-free and truncated form of a panic payload.
fn payload_summary(payload: &(dyn std::any::Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    let mut summary: String = message
        .chars()
        .map(|c| if c.is_control() || c == '"' { ' ' } else { c })
        .take(MAX_PANIC_PAYLOAD_CHARS)
        .collect();
    if message.chars().count() > MAX_PANIC_PAYLOAD_CHARS {
        summary.push_str("...");
    }
    summary
}
