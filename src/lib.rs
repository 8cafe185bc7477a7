//! Cross-platform helpers for MDM deployment scripts.
//!
//! Supplies the boilerplate every Jamf Pro / Intune script reimplements:
//! leveled file logging, safe parameter extraction, subprocess execution
//! (including run-as-the-logged-in-user), system information queries,
//! webhook notification, and swiftDialog integration on macOS.
//!
//! The platform (`PYMDM_PLATFORM`) and MDM provider (`PYMDM_MDM_PROVIDER`)
//! are resolved once per process from environment overrides or OS
//! detection; everything else takes the resolved descriptors explicitly,
//! so tests can inject any platform without mutating process state.

pub mod command;
pub mod dialog;
pub mod error;
pub mod logger;
pub mod mdm;
pub mod platform;
pub mod system_info;
pub mod webhook;

pub use command::{CommandLine, CommandRunner, RunOptions, sanitize_command_line};
pub use dialog::{Dialog, DialogExitCode, DialogOptions, DialogResult};
pub use error::{MdmError, Result};
pub use logger::{LogLevel, MdmLogger};
pub use mdm::{IntuneParams, JamfParams, MdmProvider, ParamKey, ParamProvider, params_for};
pub use platform::{
    CommandSupport, ConsoleUser, DialogSupport, Platform, PlatformInfo, command_support,
    dialog_support, platform_info, resolve_platform, resolved_platform,
};
pub use system_info::SystemInfo;
pub use webhook::{WebhookPayload, WebhookSender};
