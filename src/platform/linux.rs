//! Linux platform implementation.
//!
//! Serial numbers come from DMI data (`/sys/class/dmi` first, `dmidecode`
//! as a root-only fallback), console users from `SUDO_USER`/`logname` plus
//! the passwd database, and run-as-user wrapping goes through `sudo -u`.

use super::{
    CommandSupport, ConsoleUser, DialogSupport, PlatformInfo, is_placeholder_serial, run_capture,
};
use crate::error::{MdmError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("static regex"));

const MIN_USER_UID: u32 = 1000;

const DMI_SERIAL_PATH: &str = "/sys/class/dmi/id/product_serial";

pub(super) struct LinuxPlatform;

impl PlatformInfo for LinuxPlatform {
    fn invalid_users(&self) -> &'static [&'static str] {
        &["root", "", "gdm", "lightdm", "sddm", "nobody"]
    }

    fn serial_number(&self) -> Option<String> {
        // sysfs needs no privileges; dmidecode needs root.
        if let Ok(serial) = std::fs::read_to_string(DMI_SERIAL_PATH) {
            let serial = serial.trim().to_string();
            if !is_placeholder_serial(&serial) {
                return Some(serial);
            }
        }

        if which::which("dmidecode").is_ok() {
            if let Some(serial) = run_capture("dmidecode", &["-s", "system-serial-number"]) {
                if !is_placeholder_serial(&serial) {
                    return Some(serial);
                }
            }
        }

        None
    }

    fn console_user(&self) -> Option<ConsoleUser> {
        let username = self.login_name()?;
        let (uid, home) = passwd_entry(&username)?;
        home.exists().then(|| ConsoleUser {
            username,
            uid,
            home,
        })
    }

    fn user_full_name(&self, username: &str) -> Option<String> {
        // GECOS format: "Full Name,Room,Work Phone,Home Phone,Other"
        let gecos = gecos_field(username)?;
        let full_name = gecos.split(',').next()?.trim();
        (!full_name.is_empty()).then(|| full_name.to_string())
    }

    fn os_version_label(&self) -> String {
        let release = run_capture("uname", &["-r"]).unwrap_or_else(|| "Unknown".into());
        format!("Linux Version: {release}")
    }
}

impl LinuxPlatform {
    /// Best-effort login-name lookup for scripts that usually run as root.
    fn login_name(&self) -> Option<String> {
        // Scripts typically run via sudo; the invoking user is the console user.
        if let Ok(sudo_user) = std::env::var("SUDO_USER") {
            if !self.invalid_users().contains(&sudo_user.as_str()) {
                return Some(sudo_user);
            }
        }

        if let Some(name) = run_capture("logname", &[]) {
            if !self.invalid_users().contains(&name.as_str()) {
                return Some(name);
            }
        }

        None
    }
}

#[cfg(unix)]
fn passwd_entry(username: &str) -> Option<(u32, PathBuf)> {
    let user = nix::unistd::User::from_name(username).ok()??;
    Some((user.uid.as_raw(), user.dir))
}

#[cfg(not(unix))]
fn passwd_entry(_username: &str) -> Option<(u32, PathBuf)> {
    None
}

#[cfg(unix)]
fn gecos_field(username: &str) -> Option<String> {
    let user = nix::unistd::User::from_name(username).ok()??;
    Some(user.gecos.to_string_lossy().into_owned())
}

#[cfg(not(unix))]
fn gecos_field(username: &str) -> Option<String> {
    // No passwd database off-unix; fall back to getent if present.
    let line = run_capture("getent", &["passwd", username])?;
    line.split(':').nth(4).map(|s| s.to_string())
}

impl CommandSupport for LinuxPlatform {
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
        let mut wrapped = vec!["sudo".to_string(), "-u".to_string(), username.to_string()];
        wrapped.extend(command.iter().cloned());
        wrapped
    }

    fn shell_invocation(&self, script: &str) -> Vec<String> {
        vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()]
    }
}

impl DialogSupport for LinuxPlatform {
    fn dialog_available(&self) -> bool {
        false
    }

    fn shared_temp_dir(&self) -> PathBuf {
        Path::new("/tmp").to_path_buf()
    }

    fn dialog_binary(&self) -> Option<PathBuf> {
        None
    }

    fn unavailable_reason(&self) -> &'static str {
        "swiftDialog is macOS-only; consider zenity or kdialog for Linux dialogs"
    }
}
