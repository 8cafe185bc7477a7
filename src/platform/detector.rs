use super::Platform;
use crate::error::{MdmError, Result};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Environment variable that overrides platform detection.
pub(crate) const PLATFORM_OVERRIDE_VAR: &str = "PYMDM_PLATFORM";

/// Resolve the platform this process should behave as.
///
/// Detection order:
/// 1. `PYMDM_PLATFORM` environment variable (`darwin`, `win32`, `linux`,
///    with `macos`/`windows` accepted as aliases)
/// 2. `std::env::consts::OS`
///
/// An unrecognized override value is ignored (with a warning) and detection
/// falls through to the host OS. A pure function of environment state; call
/// [`resolved_platform`] for the process-lifetime cached variant.
pub fn resolve_platform() -> Result<Platform> {
    if let Ok(value) = std::env::var(PLATFORM_OVERRIDE_VAR) {
        match parse_platform_key(&value) {
            Some(platform) => {
                debug!(%platform, override_value = %value, "Platform resolved from override");
                return Ok(platform);
            }
            None => {
                warn!(
                    override_value = %value,
                    "Ignoring unrecognized {PLATFORM_OVERRIDE_VAR} value; falling back to OS detection"
                );
            }
        }
    }

    let os = std::env::consts::OS;
    parse_platform_key(os).ok_or_else(|| MdmError::UnsupportedPlatform {
        platform: os.to_string(),
    })
}

/// Resolve once and cache for the remainder of the process.
///
/// Resolution failures are not cached, so a script can set the override
/// and retry before anything has resolved successfully.
pub fn resolved_platform() -> Result<Platform> {
    static RESOLVED: OnceLock<Platform> = OnceLock::new();
    if let Some(platform) = RESOLVED.get() {
        return Ok(*platform);
    }
    let platform = resolve_platform()?;
    Ok(*RESOLVED.get_or_init(|| platform))
}

fn parse_platform_key(key: &str) -> Option<Platform> {
    match key.trim().to_ascii_lowercase().as_str() {
        "darwin" | "macos" => Some(Platform::MacOs),
        "win32" | "windows" => Some(Platform::Windows),
        "linux" => Some(Platform::Linux),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MdmError;
    use serial_test::serial;

    #[test]
    #[serial]
    fn override_wins_regardless_of_host_os() {
        // SAFETY: serial_test ensures no concurrent env access
        unsafe {
            for (value, expected) in [
                ("darwin", Platform::MacOs),
                ("DARWIN", Platform::MacOs),
                ("macos", Platform::MacOs),
                ("win32", Platform::Windows),
                ("windows", Platform::Windows),
                ("linux", Platform::Linux),
            ] {
                std::env::set_var(PLATFORM_OVERRIDE_VAR, value);
                assert_eq!(resolve_platform().unwrap(), expected, "override {value}");
            }
            std::env::remove_var(PLATFORM_OVERRIDE_VAR);
        }
    }

    #[test]
    #[serial]
    fn unrecognized_override_falls_back_to_host_detection() {
        // SAFETY: serial_test ensures no concurrent env access
        unsafe {
            std::env::set_var(PLATFORM_OVERRIDE_VAR, "beos");
            let result = resolve_platform();
            std::env::remove_var(PLATFORM_OVERRIDE_VAR);

            // The host we test on is one of the supported three, so the
            // bogus override must fall through to real detection.
            match std::env::consts::OS {
                "macos" => assert_eq!(result.unwrap(), Platform::MacOs),
                "windows" => assert_eq!(result.unwrap(), Platform::Windows),
                "linux" => assert_eq!(result.unwrap(), Platform::Linux),
                other => {
                    assert!(matches!(
                        result,
                        Err(MdmError::UnsupportedPlatform { ref platform }) if platform.as_str() == other
                    ));
                }
            }
        }
    }

    #[test]
    #[serial]
    fn detection_without_override_matches_host() {
        // SAFETY: serial_test ensures no concurrent env access
        unsafe {
            std::env::remove_var(PLATFORM_OVERRIDE_VAR);
        }
        if let Ok(platform) = resolve_platform() {
            match platform {
                Platform::MacOs => assert_eq!(std::env::consts::OS, "macos"),
                Platform::Windows => assert_eq!(std::env::consts::OS, "windows"),
                Platform::Linux => assert_eq!(std::env::consts::OS, "linux"),
            }
        }
    }
}
