#![cfg(unix)]

use mdm_utils::{CommandLine, CommandRunner, MdmError, Platform, RunOptions};
use std::collections::HashMap;
use std::time::Duration;

fn runner() -> CommandRunner {
    // The Linux rules (sh -c, sudo -u) hold on any unix test host.
    CommandRunner::new(Platform::Linux)
}

#[test]
fn run_returns_trimmed_stdout() {
    let output = runner().run(["echo", "hi"]).unwrap();
    assert_eq!(output, "hi");
}

#[test]
fn shell_form_supports_pipelines() {
    let output = runner().run("echo hi | tr a-z A-Z").unwrap();
    assert_eq!(output, "HI");
}

#[test]
fn nonzero_exit_is_command_failed() {
    let err = runner().run(["false"]).unwrap_err();
    match err {
        MdmError::CommandFailed { code, .. } => assert_eq!(code, Some(1)),
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[test]
fn stderr_is_captured_into_the_error() {
    let err = runner()
        .run("echo broken >&2; exit 3")
        .unwrap_err();
    match err {
        MdmError::CommandFailed { code, stderr } => {
            assert_eq!(code, Some(3));
            assert_eq!(stderr, "broken");
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[test]
fn timeout_kills_the_child() {
    let started = std::time::Instant::now();
    let err = runner()
        .run_with(
            ["sleep", "5"],
            &RunOptions {
                timeout: Some(Duration::from_secs(1)),
                ..RunOptions::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, MdmError::CommandTimeout { .. }));
    // Termination, not a full five-second wait.
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[test]
fn env_option_is_an_overlay_not_a_replacement() {
    let mut env = HashMap::new();
    env.insert("MDMU_TEST_VAR".to_string(), "overlay".to_string());
    let options = RunOptions {
        env: Some(env),
        ..RunOptions::default()
    };

    let output = runner()
        .run_with("echo $MDMU_TEST_VAR:$HOME", &options)
        .unwrap();
    let (overlay, home) = output.split_once(':').unwrap();
    assert_eq!(overlay, "overlay");
    // The parent environment leaks through underneath the overlay.
    assert!(!home.is_empty());
}

#[test]
fn cwd_option_sets_the_working_directory() {
    let dir = tempfile::TempDir::new().unwrap();
    let expected = dir.path().canonicalize().unwrap();
    let options = RunOptions {
        cwd: Some(dir.path().to_path_buf()),
        ..RunOptions::default()
    };
    let output = runner().run_with(["pwd"], &options).unwrap();
    assert_eq!(
        std::path::Path::new(&output).canonicalize().unwrap(),
        expected
    );
}

#[test]
fn missing_binary_surfaces_an_io_error() {
    let err = runner()
        .run(CommandLine::Exec(vec![
            "/no/such/binary-mdmu".to_string(),
        ]))
        .unwrap_err();
    assert!(matches!(err, MdmError::Io(_)));
}
