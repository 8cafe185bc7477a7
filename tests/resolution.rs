//! End-to-end platform and provider resolution under environment overrides.

use mdm_utils::{MdmProvider, ParamKey, ParamProvider, Platform, params_for, resolve_platform};
use serial_test::serial;

const PLATFORM_VAR: &str = "PYMDM_PLATFORM";
const PROVIDER_VAR: &str = "PYMDM_MDM_PROVIDER";

#[test]
#[serial]
fn overridden_platform_drives_the_provider_default() {
    // SAFETY: serial_test ensures no concurrent env access
    unsafe {
        std::env::remove_var(PROVIDER_VAR);

        std::env::set_var(PLATFORM_VAR, "darwin");
        let platform = resolve_platform().unwrap();
        assert_eq!(platform, Platform::MacOs);
        assert_eq!(MdmProvider::resolve(platform).unwrap(), MdmProvider::Jamf);

        std::env::set_var(PLATFORM_VAR, "win32");
        let platform = resolve_platform().unwrap();
        assert_eq!(platform, Platform::Windows);
        assert_eq!(MdmProvider::resolve(platform).unwrap(), MdmProvider::Intune);

        std::env::remove_var(PLATFORM_VAR);
    }
}

#[test]
#[serial]
fn provider_override_beats_the_platform_default() {
    // SAFETY: serial_test ensures no concurrent env access
    unsafe {
        std::env::set_var(PLATFORM_VAR, "darwin");
        std::env::set_var(PROVIDER_VAR, "intune");

        let platform = resolve_platform().unwrap();
        let provider = MdmProvider::resolve(platform).unwrap();
        assert_eq!(provider, MdmProvider::Intune);

        std::env::remove_var(PLATFORM_VAR);
        std::env::remove_var(PROVIDER_VAR);
    }
}

#[test]
#[serial]
fn selected_provider_reads_real_process_state() {
    // SAFETY: serial_test ensures no concurrent env access
    unsafe {
        std::env::remove_var(PROVIDER_VAR);
    }

    // The test binary's argv has no Jamf-style policy parameters, so every
    // usable slot must degrade to None rather than fail.
    let params = params_for(MdmProvider::Jamf);
    for index in 4..=11 {
        assert_eq!(params.get(&ParamKey::Index(index)), None);
    }
    assert!(!params.get_bool(&ParamKey::Index(4)));
    assert_eq!(params.get_int(&ParamKey::Index(4), 30), 30);

    // Intune named keys read the environment.
    // SAFETY: serial_test ensures no concurrent env access
    unsafe {
        std::env::set_var("MDMU_E2E_FLAG", "yes");
    }
    let params = params_for(MdmProvider::Intune);
    assert!(params.get_bool(&ParamKey::Name("MDMU_E2E_FLAG".into())));
    // SAFETY: serial_test ensures no concurrent env access
    unsafe {
        std::env::remove_var("MDMU_E2E_FLAG");
    }
}
