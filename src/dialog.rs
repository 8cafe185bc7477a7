//! swiftDialog integration (macOS-only).
//!
//! Spawns the external [swiftDialog](https://github.com/swiftDialog/swiftDialog)
//! helper with dialog configuration passed as command-line flags, and maps
//! its exit status into [`DialogExitCode`]. On any platform without dialog
//! support, [`Dialog::show`] returns an unsupported-platform error without
//! ever attempting to spawn a process.

use crate::error::{MdmError, Result};
use crate::platform::{DialogSupport, Platform, dialog_support};
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Dialog configuration, rendered into swiftDialog flags by
/// [`Dialog::show`].
#[derive(Debug, Clone, Default)]
pub struct DialogOptions {
    pub title: String,
    pub message: String,
    pub button1_text: Option<String>,
    pub button2_text: Option<String>,
    /// Icon path, SF Symbol name, or URL (swiftDialog `--icon` syntax).
    pub icon: Option<String>,
    /// Auto-dismiss after this many seconds.
    pub timer: Option<u32>,
    pub small: bool,
    pub ontop: bool,
    /// Passed through verbatim after the generated flags.
    pub extra_args: Vec<String>,
}

/// swiftDialog exit statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogExitCode {
    Button1,
    Button2,
    Button3,
    TimerExpired,
    UserQuit,
    DoNotDisturb,
    Timeout,
    Other(i32),
}

impl From<i32> for DialogExitCode {
    fn from(code: i32) -> Self {
        match code {
            0 => DialogExitCode::Button1,
            2 => DialogExitCode::Button2,
            3 => DialogExitCode::Button3,
            4 => DialogExitCode::TimerExpired,
            10 => DialogExitCode::UserQuit,
            20 => DialogExitCode::DoNotDisturb,
            30 => DialogExitCode::Timeout,
            other => DialogExitCode::Other(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DialogResult {
    pub exit: DialogExitCode,
    /// Captured stdout (swiftDialog reports selections and text-field
    /// contents here).
    pub output: String,
}

pub struct Dialog {
    platform: Platform,
    support: &'static dyn DialogSupport,
}

impl Dialog {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            support: dialog_support(platform),
        }
    }

    /// Show a dialog and block until it is dismissed.
    pub fn show(&self, options: &DialogOptions) -> Result<DialogResult> {
        let binary = self.require_binary()?;
        let mut args = build_args(options);
        args.push("--commandfile".to_string());
        args.push(self.command_file_path().to_string_lossy().into_owned());

        debug!(binary = %binary.display(), "launching swiftDialog");
        let output = Command::new(&binary).args(&args).output()?;
        Ok(DialogResult {
            exit: DialogExitCode::from(output.status.code().unwrap_or(-1)),
            output: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        })
    }

    /// Post a system notification through swiftDialog's `--notification`
    /// mode.
    pub fn notify(&self, title: &str, message: &str) -> Result<()> {
        let binary = self.require_binary()?;
        Command::new(&binary)
            .args([
                "--notification",
                "--title",
                title,
                "--message",
                message,
            ])
            .output()?;
        Ok(())
    }

    fn require_binary(&self) -> Result<PathBuf> {
        if !self.support.dialog_available() {
            return Err(MdmError::UnsupportedPlatform {
                platform: format!("{} ({})", self.platform, self.support.unavailable_reason()),
            });
        }
        self.support.dialog_binary().ok_or_else(|| {
            MdmError::Other(anyhow::anyhow!(
                "swiftDialog binary not found; install it from https://github.com/swiftDialog/swiftDialog/releases"
            ))
        })
    }

    /// Where swiftDialog's command file lives: under the platform-resolved
    /// temp directory, unique per process so concurrent policies do not
    /// clobber each other.
    fn command_file_path(&self) -> PathBuf {
        self.support
            .shared_temp_dir()
            .join(format!("mdm-dialog-{}.log", std::process::id()))
    }
}

fn build_args(options: &DialogOptions) -> Vec<String> {
    let mut args = vec![
        "--title".to_string(),
        options.title.clone(),
        "--message".to_string(),
        options.message.clone(),
    ];
    if let Some(text) = &options.button1_text {
        args.push("--button1text".to_string());
        args.push(text.clone());
    }
    if let Some(text) = &options.button2_text {
        args.push("--button2text".to_string());
        args.push(text.clone());
    }
    if let Some(icon) = &options.icon {
        args.push("--icon".to_string());
        args.push(icon.clone());
    }
    if let Some(timer) = options.timer {
        args.push("--timer".to_string());
        args.push(timer.to_string());
    }
    if options.small {
        args.push("--small".to_string());
    }
    if options.ontop {
        args.push("--ontop".to_string());
    }
    args.extend(options.extra_args.iter().cloned());
    args
}
