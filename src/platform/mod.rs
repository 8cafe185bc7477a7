mod detector;
mod linux;
mod macos;
mod windows;

pub use detector::{resolve_platform, resolved_platform};

use crate::error::Result;
use std::path::PathBuf;
use std::process::Command;

/// Operating systems this crate knows how to drive.
///
/// Resolved once per process from the `PYMDM_PLATFORM` override or OS
/// detection; see [`resolve_platform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    /// The override-variable spelling of this platform (`darwin`, `win32`, `linux`).
    pub fn key(&self) -> &'static str {
        match self {
            Platform::MacOs => "darwin",
            Platform::Windows => "win32",
            Platform::Linux => "linux",
        }
    }

    /// Resolve from environment override or host OS. See [`resolve_platform`].
    pub fn resolve() -> Result<Platform> {
        resolve_platform()
    }

    /// Process-wide cached resolution. See [`resolved_platform`].
    pub fn resolved() -> Result<Platform> {
        resolved_platform()
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Platform::MacOs => "macOS",
            Platform::Windows => "Windows",
            Platform::Linux => "Linux",
        };
        write!(f, "{name}")
    }
}

/// The interactive console session owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleUser {
    pub username: String,
    pub uid: u32,
    pub home: PathBuf,
}

/// Platform-specific system information primitives.
///
/// Every method fails soft (`None` / empty string): these are best-effort
/// diagnostics and must never abort a deployment script.
pub trait PlatformInfo: Send + Sync {
    /// Usernames that mean "no real user is logged in" on this platform.
    fn invalid_users(&self) -> &'static [&'static str];

    /// Hardware serial number, or `None` if it cannot be determined.
    fn serial_number(&self) -> Option<String>;

    /// The currently logged-in console user, or `None` if there is no
    /// interactive session (or only a pseudo-user owns it).
    fn console_user(&self) -> Option<ConsoleUser>;

    /// System hostname. Empty string if unavailable.
    fn hostname(&self) -> String {
        default_hostname()
    }

    /// Full display name for a username, or `None` if unavailable.
    fn user_full_name(&self, username: &str) -> Option<String>;

    /// Human-readable OS version line for the log banner,
    /// e.g. `"macOS Version: 14.5"`.
    fn os_version_label(&self) -> String;
}

/// Platform-specific command execution rules: run-as-user wrapping,
/// user validation thresholds, and shell invocation.
pub trait CommandSupport: Send + Sync {
    /// Lowest uid a real (human) account can have on this platform.
    fn min_user_uid(&self) -> u32;

    /// Check that a username/uid pair names a real human account.
    ///
    /// Returns [`crate::MdmError::InvalidUser`] when the username contains
    /// characters this platform forbids or the uid is below
    /// [`Self::min_user_uid`].
    fn validate_user(&self, username: &str, uid: u32) -> Result<()>;

    /// Wrap `command` so it executes in the given user's session.
    fn run_as_user_command(&self, command: &[String], username: &str, uid: u32) -> Vec<String>;

    /// Argv for running a single shell string on this platform.
    fn shell_invocation(&self, script: &str) -> Vec<String>;
}

/// Platform-specific GUI dialog support.
pub trait DialogSupport: Send + Sync {
    /// Whether GUI dialogs can be shown on this platform at all.
    fn dialog_available(&self) -> bool;

    /// Temp directory for dialog command files, resolved from the
    /// environment rather than hardcoded.
    fn shared_temp_dir(&self) -> PathBuf;

    /// Path to the dialog helper binary, if one can be found.
    fn dialog_binary(&self) -> Option<PathBuf>;

    /// Why dialogs are unavailable here (used in the returned error).
    fn unavailable_reason(&self) -> &'static str;
}

pub fn platform_info(platform: Platform) -> &'static dyn PlatformInfo {
    match platform {
        Platform::MacOs => &macos::MacOsPlatform,
        Platform::Windows => &windows::WindowsPlatform,
        Platform::Linux => &linux::LinuxPlatform,
    }
}

pub fn command_support(platform: Platform) -> &'static dyn CommandSupport {
    match platform {
        Platform::MacOs => &macos::MacOsPlatform,
        Platform::Windows => &windows::WindowsPlatform,
        Platform::Linux => &linux::LinuxPlatform,
    }
}

pub fn dialog_support(platform: Platform) -> &'static dyn DialogSupport {
    match platform {
        Platform::MacOs => &macos::MacOsPlatform,
        Platform::Windows => &windows::WindowsPlatform,
        Platform::Linux => &linux::LinuxPlatform,
    }
}

/// Run a short diagnostic command and capture trimmed stdout.
///
/// Fail-soft by design: any spawn failure or non-zero exit yields `None`.
pub(crate) fn run_capture(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}

/// Cross-platform hostname lookup.
pub(crate) fn default_hostname() -> String {
    #[cfg(unix)]
    {
        if let Ok(name) = nix::unistd::gethostname() {
            return name.to_string_lossy().into_owned();
        }
    }
    #[cfg(not(unix))]
    {
        if let Ok(name) = std::env::var("COMPUTERNAME") {
            return name;
        }
    }
    std::env::var("HOSTNAME").unwrap_or_default()
}

/// Serial values vendors ship as placeholders; treated as "no serial".
pub(crate) fn is_placeholder_serial(serial: &str) -> bool {
    matches!(
        serial.to_ascii_lowercase().as_str(),
        "" | "none" | "to be filled by o.e.m." | "default string"
    )
}
