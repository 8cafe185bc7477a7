//! Windows platform implementation.
//!
//! Serial numbers via PowerShell `Get-CimInstance` (with a `wmic` fallback
//! for old images), console user from the `USERNAME` environment, and
//! run-as-user via PowerShell `Start-Process -Credential`.
//!
//! Windows has no Unix-style uids; the console user carries a `0`
//! placeholder, and [`CommandSupport::min_user_uid`] is `1` so that the
//! placeholder can never be mistaken for a validated account.

use super::{
    CommandSupport, ConsoleUser, DialogSupport, PlatformInfo, is_placeholder_serial, run_capture,
};
use crate::error::{MdmError, Result};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Windows account names may contain spaces ("John Smith").
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._@\- ]+$").expect("static regex"));

const MIN_USER_UID: u32 = 1;

pub(super) struct WindowsPlatform;

impl PlatformInfo for WindowsPlatform {
    fn invalid_users(&self) -> &'static [&'static str] {
        &["", "SYSTEM", "LOCAL SERVICE", "NETWORK SERVICE"]
    }

    fn serial_number(&self) -> Option<String> {
        // wmic is deprecated; prefer CIM.
        if let Some(serial) = run_capture(
            "powershell",
            &[
                "-NoProfile",
                "-Command",
                "(Get-CimInstance -ClassName Win32_BIOS).SerialNumber",
            ],
        ) {
            if !is_placeholder_serial(&serial) {
                return Some(serial);
            }
        }

        let raw = run_capture("wmic", &["bios", "get", "serialnumber"])?;
        // First non-empty line is the "SerialNumber" header, second the value.
        let serial = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .nth(1)?
            .to_string();
        (!is_placeholder_serial(&serial)).then_some(serial)
    }

    fn console_user(&self) -> Option<ConsoleUser> {
        let username = std::env::var("USERNAME").unwrap_or_default();
        if self.invalid_users().contains(&username.as_str()) {
            return None;
        }
        let home = dirs::home_dir()?;
        home.exists().then(|| ConsoleUser {
            username,
            // Placeholder: Windows accounts have SIDs, not uids.
            uid: 0,
            home,
        })
    }

    fn user_full_name(&self, username: &str) -> Option<String> {
        if let Some(full_name) = run_capture(
            "powershell",
            &[
                "-NoProfile",
                "-Command",
                &format!("(Get-LocalUser -Name '{username}').FullName"),
            ],
        ) {
            return Some(full_name);
        }

        // Fallback for domain accounts where Get-LocalUser comes up empty.
        let raw = run_capture("net", &["user", username])?;
        raw.lines()
            .find(|line| line.trim_start().starts_with("Full Name"))
            .and_then(|line| line.splitn(3, char::is_whitespace).nth(2))
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }

    fn os_version_label(&self) -> String {
        let version = run_capture(
            "powershell",
            &[
                "-NoProfile",
                "-Command",
                "[System.Environment]::OSVersion.Version.ToString()",
            ],
        )
        .unwrap_or_else(|| "Unknown".into());
        format!("Windows Version: {version}")
    }
}

impl CommandSupport for WindowsPlatform {
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

    fn run_as_user_command(&self, command: &[String], username: &str, _uid: u32) -> Vec<String> {
        let program = command.first().map(String::as_str).unwrap_or_default();
        let arguments = command.iter().skip(1).cloned().collect::<Vec<_>>().join(" ");
        vec![
            "powershell".to_string(),
            "-NoProfile".to_string(),
            "-Command".to_string(),
            format!(
                "Start-Process -FilePath '{program}' -ArgumentList '{arguments}' \
                 -Credential (Get-Credential -UserName '{username}' -Message 'Enter password') \
                 -Wait -NoNewWindow"
            ),
        ]
    }

    fn shell_invocation(&self, script: &str) -> Vec<String> {
        vec!["cmd".to_string(), "/C".to_string(), script.to_string()]
    }
}

impl DialogSupport for WindowsPlatform {
    fn dialog_available(&self) -> bool {
        false
    }

    fn shared_temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    fn dialog_binary(&self) -> Option<PathBuf> {
        None
    }

    fn unavailable_reason(&self) -> &'static str {
        "swiftDialog is macOS-only; Intune scripts should use toast notifications instead"
    }
}
