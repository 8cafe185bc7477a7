//! Microsoft Intune parameter provider.
//!
//! Intune scripts receive parameters as plain command-line arguments or as
//! environment variables; both are supported. There are no reserved
//! positional slots. Named keys fall back to an `INTUNE_`-prefixed
//! environment variable, and a name that is itself integer-like is treated
//! as a positional index first.

use super::{ParamKey, ParamProvider};

const ENV_PREFIX: &str = "INTUNE_";

#[derive(Debug, Clone)]
pub struct IntuneParams {
    args: Vec<String>,
}

impl IntuneParams {
    /// Provider over the real invocation arguments and environment.
    pub fn from_env() -> Self {
        Self::with_args(std::env::args().collect())
    }

    /// Provider over an explicit argument vector; named keys still read the
    /// process environment.
    pub fn with_args(args: Vec<String>) -> Self {
        Self { args }
    }

    fn positional(&self, index: usize) -> Option<String> {
        self.args
            .get(index)
            .filter(|value| !value.is_empty())
            .cloned()
    }

    fn environment(name: &str) -> Option<String> {
        std::env::var(name)
            .or_else(|_| std::env::var(format!("{ENV_PREFIX}{name}")))
            .ok()
            .filter(|value| !value.is_empty())
    }
}

impl ParamProvider for IntuneParams {
    fn get(&self, key: &ParamKey) -> Option<String> {
        match key {
            ParamKey::Index(index) => self.positional(*index),
            ParamKey::Name(name) => match name.parse::<usize>() {
                Ok(index) => self.positional(index),
                Err(_) => Self::environment(name),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    fn params() -> IntuneParams {
        IntuneParams::with_args(
            ["install.ps1", "silent", "45"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }

    #[test]
    fn positional_keys_have_no_reserved_slots() {
        let params = params();
        assert_eq!(
            params.get(&ParamKey::Index(0)),
            Some("install.ps1".to_string())
        );
        assert_eq!(params.get(&ParamKey::Index(1)), Some("silent".to_string()));
        assert_eq!(params.get(&ParamKey::Index(3)), None);
    }

    #[test]
    fn integer_like_names_resolve_positionally() {
        let params = params();
        assert_eq!(params.get(&ParamKey::Name("2".into())), Some("45".to_string()));
        assert_eq!(params.get(&ParamKey::Name("9".into())), None);
    }

    #[test]
    #[serial]
    fn named_keys_read_environment_with_prefix_fallback() {
        // SAFETY: serial_test ensures no concurrent env access
        unsafe {
            std::env::set_var("MDMU_TEST_WEBHOOK", "https://example.invalid/hook");
            std::env::set_var("INTUNE_MDMU_TEST_TIMEOUT", "90");

            let params = params();
            assert_eq!(
                params.get(&ParamKey::Name("MDMU_TEST_WEBHOOK".into())),
                Some("https://example.invalid/hook".to_string())
            );
            // Exact name is absent, prefixed variant supplies the value.
            assert_eq!(
                params.get_int(&ParamKey::Name("MDMU_TEST_TIMEOUT".into()), 30),
                90
            );
            assert_eq!(params.get(&ParamKey::Name("MDMU_TEST_ABSENT".into())), None);

            std::env::remove_var("MDMU_TEST_WEBHOOK");
            std::env::remove_var("INTUNE_MDMU_TEST_TIMEOUT");
        }
    }
}
