#![deny(missing_docs)]
//! Shared logging utilities for the url2md workspace.
//!
//! The `engine_*` macros forward to the `log` facade. [`initialize`] installs a
//! `simplelog` logger for the terminal, a log file, or both.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Default log file name, relative to the working directory.
pub const LOG_FILE_NAME: &str = "url2md.log";

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Where log records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    /// The terminal only; warnings and errors go to stderr.
    Terminal,
    /// A log file only, truncated at startup.
    File(PathBuf),
    /// The terminal and a log file.
    Both(PathBuf),
}

impl LogDestination {
    /// The log file this destination writes, if any.
    pub fn log_file(&self) -> Option<&Path> {
        match self {
            LogDestination::Terminal => None,
            LogDestination::File(path) | LogDestination::Both(path) => Some(path),
        }
    }

    fn includes_terminal(&self) -> bool {
        !matches!(self, LogDestination::File(_))
    }
}

/// Installs the global logger. Calling this twice keeps the first logger.
///
/// A log file that cannot be created is reported on stderr and skipped, so the
/// run still logs to the terminal when that was requested.
pub fn initialize(level: LevelFilter, destination: LogDestination) {
    let config = build_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    if destination.includes_terminal() {
        loggers.push(terminal_logger(level, config.clone()));
    }
    if let Some(path) = destination.log_file() {
        if let Some(file_logger) = file_logger(level, config, path) {
            loggers.push(file_logger);
        }
    }
    if loggers.is_empty() {
        return;
    }

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn terminal_logger(level: LevelFilter, config: Config) -> Box<TermLogger> {
    TermLogger::new(level, config, TerminalMode::Mixed, ColorChoice::Auto)
}

fn file_logger(level: LevelFilter, config: Config, path: &Path) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: could not create log file {}: {}", path.display(), err);
            None
        }
    }
}

/// Terminal logger for tests; a no-op once any logger is installed.
pub fn initialize_for_tests() {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = CombinedLogger::init(vec![terminal_logger(level, Config::default())]);
}
