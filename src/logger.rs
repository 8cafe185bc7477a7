//! Leveled, append-only file logging for deployment scripts.
//!
//! Every leveled method funnels through the single [`MdmLogger::update_log`]
//! primitive, and each one forwards its exit code into the written record —
//! this is contract-tested, because an earlier revision of this library
//! silently dropped the exit code for every non-startup call.
//!
//! [`MdmLogger::error_with_code`] is the only place the library terminates
//! the process, and only with the caller-supplied code.

use crate::error::Result;
use crate::platform::{Platform, platform_info};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Debug,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        write!(f, "{tag}")
    }
}

/// Append-only log file with optional stdout echo.
///
/// The file handle opens lazily on the first write and is held for the rest
/// of the process (or until [`MdmLogger::close`]). The file is never
/// truncated; successive runs of a script accumulate in the same log.
pub struct MdmLogger {
    path: PathBuf,
    platform: Platform,
    echo_stdout: bool,
    file: Mutex<Option<File>>,
}

impl MdmLogger {
    pub fn new(path: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            path: path.into(),
            platform,
            echo_stdout: false,
            file: Mutex::new(None),
        }
    }

    /// Also echo every record to stdout (useful under Jamf, which captures
    /// script stdout into the policy log).
    pub fn with_stdout(mut self, echo: bool) -> Self {
        self.echo_stdout = echo;
        self
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Write the startup banner: script name, version, and the OS version
    /// label resolved from the platform descriptor.
    ///
    /// Returns an error if the log file cannot be opened or written, so a
    /// script learns about an unwritable log path before doing real work.
    pub fn log_startup(&self, name: &str, version: &str) -> Result<()> {
        self.try_update_log(LogLevel::Info, &format!("==== {name} v{version} ===="), None)?;
        let os_label = platform_info(self.platform).os_version_label();
        self.try_update_log(LogLevel::Info, &os_label, None)?;
        Ok(())
    }

    pub fn info(&self, message: &str) {
        self.update_log(LogLevel::Info, message, None);
    }

    pub fn debug(&self, message: &str) {
        self.update_log(LogLevel::Debug, message, None);
    }

    pub fn warn(&self, message: &str) {
        self.update_log(LogLevel::Warn, message, None);
    }

    pub fn error(&self, message: &str) {
        self.update_log(LogLevel::Error, message, None);
    }

    /// Info record annotated with an exit code. Never terminates.
    pub fn info_with_code(&self, message: &str, exit_code: i32) {
        self.update_log(LogLevel::Info, message, Some(exit_code));
    }

    /// Debug record annotated with an exit code. Never terminates.
    pub fn debug_with_code(&self, message: &str, exit_code: i32) {
        self.update_log(LogLevel::Debug, message, Some(exit_code));
    }

    /// Warning record annotated with an exit code. Never terminates,
    /// whatever the code says.
    pub fn warn_with_code(&self, message: &str, exit_code: i32) {
        self.update_log(LogLevel::Warn, message, Some(exit_code));
    }

    /// Write an error record carrying `exit_code`, then terminate the
    /// process with that code. The sole process-exit in this library.
    pub fn error_with_code(&self, message: &str, exit_code: i32) -> ! {
        self.update_log(LogLevel::Error, message, Some(exit_code));
        self.close();
        std::process::exit(exit_code);
    }

    /// Record an error and its full `source()` chain, one record per link.
    pub fn log_error_chain(&self, context: &str, error: &(dyn std::error::Error + 'static)) {
        self.update_log(LogLevel::Error, &format!("{context}: {error}"), None);
        let mut source = error.source();
        while let Some(cause) = source {
            self.update_log(LogLevel::Error, &format!("  caused by: {cause}"), None);
            source = cause.source();
        }
    }

    /// The single low-level write primitive all leveled methods route
    /// through. A failed write degrades to stderr; logging never aborts the
    /// script it serves.
    pub fn update_log(&self, level: LogLevel, message: &str, exit_code: Option<i32>) {
        if let Err(err) = self.try_update_log(level, message, exit_code) {
            eprintln!("mdm-utils: failed to write log record to {}: {err}", self.path.display());
        }
    }

    fn try_update_log(
        &self,
        level: LogLevel,
        message: &str,
        exit_code: Option<i32>,
    ) -> std::io::Result<()> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        let line = match exit_code {
            Some(code) => format!("{timestamp} [{level}] {message} (exit code: {code})"),
            None => format!("{timestamp} [{level}] {message}"),
        };

        let mut guard = self.file.lock().unwrap_or_else(|e| e.into_inner());
        let file = match guard.as_mut() {
            Some(file) => file,
            None => {
                if let Some(parent) = self.path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)?;
                    }
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)?;
                guard.insert(file)
            }
        };
        writeln!(file, "{line}")?;
        file.flush()?;

        if self.echo_stdout {
            println!("{line}");
        }
        Ok(())
    }

    /// Release the file handle. Subsequent writes reopen lazily.
    pub fn close(&self) {
        let mut guard = self.file.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}
