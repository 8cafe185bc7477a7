//! Jamf Pro parameter provider.
//!
//! Jamf passes script parameters positionally and reserves the first four:
//! `$0` script path, `$1` mount point, `$2` computer name, `$3` username of
//! the logged-in user. User-defined policy parameters occupy `$4`–`$11`.

use super::{ParamKey, ParamProvider};
use tracing::warn;

const MIN_USABLE_PARAM: usize = 4;
const MAX_USABLE_PARAM: usize = 11;

#[derive(Debug, Clone)]
pub struct JamfParams {
    args: Vec<String>,
}

impl JamfParams {
    /// Provider over the real invocation arguments.
    pub fn from_env() -> Self {
        Self::with_args(std::env::args().collect())
    }

    /// Provider over an explicit argument vector (for tests, or when the
    /// script already consumed `std::env::args`).
    pub fn with_args(args: Vec<String>) -> Self {
        Self { args }
    }

    /// Reserved and out-of-range indices degrade to `None` rather than
    /// failing: parameter access is never fatal. The warning is the
    /// author's hint that the script is misusing a Jamf slot.
    fn usable_index(index: usize) -> bool {
        if index < MIN_USABLE_PARAM {
            warn!(
                index,
                "Parameter ${index} is reserved by Jamf Pro; use ${MIN_USABLE_PARAM}-${MAX_USABLE_PARAM}"
            );
            return false;
        }
        if index > MAX_USABLE_PARAM {
            warn!(
                index,
                "Parameter ${index} is outside Jamf Pro's usable range ${MIN_USABLE_PARAM}-${MAX_USABLE_PARAM}"
            );
            return false;
        }
        true
    }
}

impl ParamProvider for JamfParams {
    fn get(&self, key: &ParamKey) -> Option<String> {
        let index = match key {
            ParamKey::Index(index) => *index,
            ParamKey::Name(name) => {
                warn!(name = %name, "Jamf parameters are positional; named lookup returns None");
                return None;
            }
        };
        if !Self::usable_index(index) {
            return None;
        }
        self.args
            .get(index)
            .filter(|value| !value.is_empty())
            .cloned()
    }
}
