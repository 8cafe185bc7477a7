//! MDM provider abstraction: uniform script-parameter access over Jamf Pro's
//! positional arguments and Intune's argv/environment conventions.

mod intune;
mod jamf;

pub use intune::IntuneParams;
pub use jamf::JamfParams;

use crate::error::{MdmError, Result};
use crate::platform::Platform;

/// Environment variable that overrides MDM provider detection.
pub(crate) const PROVIDER_OVERRIDE_VAR: &str = "PYMDM_MDM_PROVIDER";

/// MDM systems this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MdmProvider {
    Jamf,
    Intune,
}

impl MdmProvider {
    /// Resolve which MDM provider invoked this script.
    ///
    /// Detection order:
    /// 1. `PYMDM_MDM_PROVIDER` environment variable (`jamf` or `intune`)
    /// 2. Platform default: Jamf on macOS (and Linux), Intune on Windows
    ///
    /// Unlike platform detection, a set-but-unrecognized override is an
    /// error here: guessing the wrong provider silently misreads every
    /// parameter, so the caller must know.
    pub fn resolve(platform: Platform) -> Result<MdmProvider> {
        if let Ok(value) = std::env::var(PROVIDER_OVERRIDE_VAR) {
            return match value.trim().to_ascii_lowercase().as_str() {
                "jamf" => Ok(MdmProvider::Jamf),
                "intune" => Ok(MdmProvider::Intune),
                _ => Err(MdmError::UnsupportedProvider { provider: value }),
            };
        }

        Ok(match platform {
            Platform::Windows => MdmProvider::Intune,
            Platform::MacOs | Platform::Linux => MdmProvider::Jamf,
        })
    }
}

impl std::fmt::Display for MdmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MdmProvider::Jamf => "jamf",
            MdmProvider::Intune => "intune",
        };
        write!(f, "{name}")
    }
}

/// A parameter slot: positional for Jamf, positional or named for Intune.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKey {
    Index(usize),
    Name(String),
}

impl From<usize> for ParamKey {
    fn from(index: usize) -> Self {
        ParamKey::Index(index)
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Name(name.to_string())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        ParamKey::Name(name)
    }
}

/// Provider-specific parameter retrieval.
///
/// Absence never raises: a missing or malformed value degrades to
/// `None` / `false` / the caller's default.
pub trait ParamProvider: Send + Sync {
    /// Raw string value for a key, or `None` if unset.
    fn get(&self, key: &ParamKey) -> Option<String>;

    /// Boolean coercion: case-insensitive `true`, `1`, `yes`, `y` are true;
    /// everything else (including a missing key) is false.
    fn get_bool(&self, key: &ParamKey) -> bool {
        match self.get(key) {
            Some(value) => matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "y"
            ),
            None => false,
        }
    }

    /// Integer coercion; missing or malformed values fall back to `default`.
    fn get_int(&self, key: &ParamKey, default: i64) -> i64 {
        self.get(key)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }
}

/// Build the parameter provider for an MDM system over the real process
/// arguments and environment.
pub fn params_for(provider: MdmProvider) -> Box<dyn ParamProvider> {
    match provider {
        MdmProvider::Jamf => Box::new(JamfParams::from_env()),
        MdmProvider::Intune => Box::new(IntuneParams::from_env()),
    }
}
