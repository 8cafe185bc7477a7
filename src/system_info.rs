//! Cross-platform system information facade.
//!
//! A thin stateless delegator over the resolved platform's
//! [`PlatformInfo`](crate::platform::PlatformInfo) primitives. Every query
//! fails soft: these are best-effort diagnostics, and a deployment script
//! should not crash because a serial number could not be read.

use crate::error::Result;
use crate::platform::{ConsoleUser, Platform, PlatformInfo, platform_info};

#[derive(Clone, Copy)]
pub struct SystemInfo {
    info: &'static dyn PlatformInfo,
}

impl SystemInfo {
    /// Facade over an explicitly chosen platform (tests inject descriptors
    /// here instead of mutating process state).
    pub fn new(platform: Platform) -> Self {
        Self {
            info: platform_info(platform),
        }
    }

    /// Facade over the process-wide resolved platform (cached after the
    /// first successful resolution).
    pub fn detect() -> Result<Self> {
        Ok(Self::new(Platform::resolved()?))
    }

    /// Hardware serial number, or `None` if unavailable.
    pub fn serial_number(&self) -> Option<String> {
        self.info.serial_number()
    }

    /// The logged-in console user (username, uid, home), or `None` if no
    /// interactive session exists.
    pub fn console_user(&self) -> Option<ConsoleUser> {
        self.info.console_user()
    }

    /// System hostname; empty string if it cannot be determined.
    pub fn hostname(&self) -> String {
        self.info.hostname()
    }

    /// Full display name for a username, or `None` if unavailable.
    pub fn user_full_name(&self, username: &str) -> Option<String> {
        self.info.user_full_name(username)
    }

    /// Human-readable OS version line, e.g. for log banners.
    pub fn os_version_label(&self) -> String {
        self.info.os_version_label()
    }
}
