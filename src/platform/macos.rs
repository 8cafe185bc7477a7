//! macOS (Darwin) platform implementation.
//!
//! Drives macOS command-line tools: `system_profiler` for serial numbers,
//! `stat`/`id` for console user details, `launchctl asuser` for run-as-user,
//! and swiftDialog for GUI dialogs.

use super::{
    CommandSupport, ConsoleUser, DialogSupport, PlatformInfo, is_placeholder_serial, run_capture,
};
use crate::error::{MdmError, Result};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

/// macOS allows `.` and `@` in account names (mobile/AD accounts use both).
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._@-]+$").expect("static regex"));

const MIN_USER_UID: u32 = 500;

/// Standard swiftDialog install location.
const DIALOG_BINARY: &str = "/usr/local/bin/dialog";

pub(super) struct MacOsPlatform;

impl PlatformInfo for MacOsPlatform {
    fn invalid_users(&self) -> &'static [&'static str] {
        &["root", "", "loginwindow", "_mbsetupuser"]
    }

    fn serial_number(&self) -> Option<String> {
        let raw = run_capture(
            "/usr/sbin/system_profiler",
            &["SPHardwareDataType", "-json"],
        )?;
        let data: serde_json::Value = serde_json::from_str(&raw).ok()?;
        let serial = data
            .get("SPHardwareDataType")?
            .get(0)?
            .get("serial_number")?
            .as_str()?
            .to_string();
        (!is_placeholder_serial(&serial)).then_some(serial)
    }

    fn console_user(&self) -> Option<ConsoleUser> {
        // The owner of /dev/console is the active GUI session user.
        let username = run_capture("/usr/bin/stat", &["-f%Su", "/dev/console"])?;
        if self.invalid_users().contains(&username.as_str()) {
            return None;
        }
        let uid: u32 = run_capture("/usr/bin/id", &["-u", &username])?.parse().ok()?;
        let home = PathBuf::from(format!("/Users/{username}"));
        home.exists().then(|| ConsoleUser {
            username,
            uid,
            home,
        })
    }

    fn user_full_name(&self, username: &str) -> Option<String> {
        run_capture("/usr/bin/id", &["-F", username])
    }

    fn os_version_label(&self) -> String {
        let version =
            run_capture("/usr/bin/sw_vers", &["-productVersion"]).unwrap_or_else(|| "Unknown".into());
        format!("macOS Version: {version}")
    }
}

impl CommandSupport for MacOsPlatform {
    fn min_user_uid(&self) -> u32 {
        MIN_USER_UID
    }

    fn validate_user(&self, username: &str, uid: u32) -> Result<()> {
        if !USERNAME_RE.is_match(username) || uid < self.min_user_uid() {
            return Err(MdmError::InvalidUser {
                username: username.to_string(),
                uid,
                min_uid: self.min_user_uid(),
            });
        }
        Ok(())
    }

    fn run_as_user_command(&self, command: &[String], username: &str, uid: u32) -> Vec<String> {
        let mut wrapped = vec![
            "/bin/launchctl".to_string(),
            "asuser".to_string(),
            uid.to_string(),
            "sudo".to_string(),
            "-u".to_string(),
            username.to_string(),
        ];
        wrapped.extend(command.iter().cloned());
        wrapped
    }

    fn shell_invocation(&self, script: &str) -> Vec<String> {
        vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()]
    }
}

impl DialogSupport for MacOsPlatform {
    fn dialog_available(&self) -> bool {
        true
    }

    fn shared_temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    fn dialog_binary(&self) -> Option<PathBuf> {
        let standard = PathBuf::from(DIALOG_BINARY);
        if standard.exists() {
            return Some(standard);
        }
        which::which("dialog").ok()
    }

    fn unavailable_reason(&self) -> &'static str {
        ""
    }
}
