//! Subprocess execution with timeouts, credential redaction, and
//! platform-aware run-as-user wrapping.

use crate::error::{MdmError, Result};
use crate::logger::MdmLogger;
use crate::platform::{CommandSupport, Platform, command_support};
use regex::Regex;
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{Arc, LazyLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Granularity of the child-exit poll loop.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A command in either exec (argv) or shell form.
///
/// Prefer the exec form; the shell form exists for pipelines and globbing
/// and goes through the platform's shell (`/bin/sh -c`, `cmd /C`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    Exec(Vec<String>),
    Shell(String),
}

impl CommandLine {
    /// Single-string rendering used for log records.
    fn rendered(&self) -> String {
        match self {
            CommandLine::Exec(argv) => argv.join(" "),
            CommandLine::Shell(script) => script.clone(),
        }
    }
}

impl From<Vec<String>> for CommandLine {
    fn from(argv: Vec<String>) -> Self {
        CommandLine::Exec(argv)
    }
}

impl From<&[&str]> for CommandLine {
    fn from(argv: &[&str]) -> Self {
        CommandLine::Exec(argv.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for CommandLine {
    fn from(argv: [&str; N]) -> Self {
        CommandLine::Exec(argv.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&str> for CommandLine {
    fn from(script: &str) -> Self {
        CommandLine::Shell(script.to_string())
    }
}

impl From<String> for CommandLine {
    fn from(script: String) -> Self {
        CommandLine::Shell(script)
    }
}

/// Per-invocation knobs. `env` is an overlay merged over the parent
/// environment, not a replacement.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub timeout: Option<Duration>,
    pub env: Option<HashMap<String, String>>,
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct RunAsUser {
    username: String,
    uid: u32,
}

/// Executes external commands under the resolved platform's rules.
pub struct CommandRunner {
    platform: Platform,
    logger: Option<Arc<MdmLogger>>,
    user: Option<RunAsUser>,
}

impl CommandRunner {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            logger: None,
            user: None,
        }
    }

    /// Log command invocations and failures through this logger.
    pub fn with_logger(mut self, logger: Arc<MdmLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Configure the logged-in user for [`CommandRunner::run_as_user`].
    pub fn with_user(mut self, username: impl Into<String>, uid: u32) -> Self {
        self.user = Some(RunAsUser {
            username: username.into(),
            uid,
        });
        self
    }

    fn support(&self) -> &'static dyn CommandSupport {
        command_support(self.platform)
    }

    /// Run a command with the default 30-second timeout and return trimmed
    /// stdout. Non-zero exit yields [`MdmError::CommandFailed`].
    pub fn run(&self, command: impl Into<CommandLine>) -> Result<String> {
        self.run_with(command, &RunOptions::default())
    }

    /// Run a command with explicit timeout / environment overlay / working
    /// directory.
    pub fn run_with(&self, command: impl Into<CommandLine>, options: &RunOptions) -> Result<String> {
        let command = command.into();
        let sanitized = sanitize_command_line(&command.rendered());
        if let Some(logger) = &self.logger {
            logger.debug(&format!("Running: {sanitized}"));
        }
        debug!(command = %sanitized, "spawning subprocess");

        let argv = match &command {
            CommandLine::Exec(argv) => argv.clone(),
            CommandLine::Shell(script) => self.support().shell_invocation(script),
        };
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| MdmError::Other(anyhow::anyhow!("empty command line")))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(env) = &options.env {
            cmd.envs(env);
        }
        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }

        let timeout = options.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let mut child = cmd.spawn()?;
        let stdout_reader = drain_pipe(child.stdout.take());
        let stderr_reader = drain_pipe(child.stderr.take());

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    // Kill and reap; an abandoned child would outlive the
                    // script and confuse the MDM agent's own timeout.
                    let _ = child.kill();
                    let _ = child.wait();
                    if let Some(logger) = &self.logger {
                        logger.error(&format!("Command timed out after {timeout:?}: {sanitized}"));
                    }
                    return Err(MdmError::CommandTimeout { timeout });
                }
                None => std::thread::sleep(POLL_INTERVAL),
            }
        };

        let stdout = join_pipe(stdout_reader);
        let stderr = join_pipe(stderr_reader);

        if !status.success() {
            let stderr = stderr.trim().to_string();
            if let Some(logger) = &self.logger {
                logger.error(&format!("Command failed: {stderr}"));
            }
            return Err(MdmError::CommandFailed {
                code: status.code(),
                stderr,
            });
        }

        Ok(stdout.trim_end().to_string())
    }

    /// Run a command in the configured logged-in user's session.
    ///
    /// Validates the configured username/uid against the platform's rules
    /// first; [`MdmError::InvalidUser`] names the offending account.
    pub fn run_as_user(&self, command: &[String], timeout: Option<Duration>) -> Result<String> {
        let user = self.user.as_ref().ok_or(MdmError::UserNotConfigured)?;
        let support = self.support();

        if let Err(err) = support.validate_user(&user.username, user.uid) {
            if let Some(logger) = &self.logger {
                logger.error(&format!("User validation failed: {err}"));
            }
            return Err(err);
        }

        if let Some(logger) = &self.logger {
            let sanitized = sanitize_command_line(&command.join(" "));
            logger.debug(&format!(
                "Running: {sanitized} as the logged in user {} (uid {})",
                user.username, user.uid
            ));
        }

        let wrapped = support.run_as_user_command(command, &user.username, user.uid);
        self.run_with(
            CommandLine::Exec(wrapped),
            &RunOptions {
                timeout,
                ..RunOptions::default()
            },
        )
    }
}

fn drain_pipe(pipe: Option<impl Read + Send + 'static>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_pipe(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    let bytes = handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

static AUTHORIZATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Authorization:\s*(\S+)(\s+\S+)?").expect("static regex"));

/// Scheme words that precede a credential token in an Authorization header.
/// Only these license consuming the word after them; anything else following
/// a bare header value is treated as an unrelated argument.
const AUTH_SCHEMES: [&str; 4] = ["basic", "bearer", "digest", "token"];

/// Ordered most-specific-first so replacements do not overlap.
static REDACTIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)Bearer\s+\S+", "Bearer <REDACTED>"),
        (r"(?i)(-p|--password)\s+\S+", "$1 <REDACTED>"),
        (r"(?i)token[=:]\S+", "token=<REDACTED>"),
        (r"(?i)api[_-]?key[=:]\S+", "api_key=<REDACTED>"),
        (r"(?i)password[=:]\S+", "password=<REDACTED>"),
        (r"(?i)client[_-]?secret[=:]\S+", "client_secret=<REDACTED>"),
        (r"(?i)client[_-]?id[=:]\S+", "client_id=<REDACTED>"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("static regex"), replacement))
    .collect()
});

/// Redact recognized credential-bearing patterns before a command line is
/// written to any log.
pub fn sanitize_command_line(command: &str) -> String {
    // Authorization headers: a recognized scheme word stays visible and the
    // token after it is redacted; a scheme-less value is redacted alone,
    // leaving whatever follows it intact.
    let mut sanitized = AUTHORIZATION_RE
        .replace_all(command, |caps: &regex::Captures<'_>| {
            let first = &caps[1];
            let is_scheme = AUTH_SCHEMES.iter().any(|s| first.eq_ignore_ascii_case(s));
            if is_scheme && caps.get(2).is_some() {
                format!("Authorization: {first} <REDACTED>")
            } else {
                let rest = caps.get(2).map_or("", |m| m.as_str());
                format!("Authorization: <REDACTED>{rest}")
            }
        })
        .into_owned();

    for (pattern, replacement) in REDACTIONS.iter() {
        sanitized = pattern.replace_all(&sanitized, *replacement).into_owned();
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bearer_tokens_are_redacted() {
        assert_eq!(
            sanitize_command_line("curl -H Authorization: Bearer abc123 https://x"),
            "curl -H Authorization: Bearer <REDACTED> https://x"
        );
        assert_eq!(
            sanitize_command_line("Authorization: Basic dXNlcjpwYXNz"),
            "Authorization: Basic <REDACTED>"
        );
    }

    #[test]
    fn scheme_less_header_value_leaves_following_arguments_alone() {
        assert_eq!(
            sanitize_command_line("curl -H Authorization: tok123 https://example.com"),
            "curl -H Authorization: <REDACTED> https://example.com"
        );
        // Value at the end of the line, nothing after it to preserve.
        assert_eq!(
            sanitize_command_line("curl -H Authorization: tok123"),
            "curl -H Authorization: <REDACTED>"
        );
    }

    #[test]
    fn key_value_credentials_are_redacted() {
        assert_eq!(
            sanitize_command_line("deploy token=s3cr3t api_key=abc password=hunter2"),
            "deploy token=<REDACTED> api_key=<REDACTED> password=<REDACTED>"
        );
        assert_eq!(
            sanitize_command_line("auth client_secret:xyz client-id:123"),
            "auth client_secret=<REDACTED> client_id=<REDACTED>"
        );
    }

    #[test]
    fn password_flags_are_redacted() {
        assert_eq!(
            sanitize_command_line("installer -p hunter2 --password hunter2"),
            "installer -p <REDACTED> --password <REDACTED>"
        );
    }

    #[test]
    fn innocent_commands_pass_through() {
        let command = "/usr/bin/id -u jdoe";
        assert_eq!(sanitize_command_line(command), command);
    }

    #[test]
    fn empty_command_line_is_an_error() {
        let runner = CommandRunner::new(Platform::Linux);
        assert!(runner.run(CommandLine::Exec(vec![])).is_err());
    }

    #[test]
    fn run_as_user_without_configured_user_fails() {
        let runner = CommandRunner::new(Platform::Linux);
        let result = runner.run_as_user(&["id".to_string()], None);
        assert!(matches!(result, Err(MdmError::UserNotConfigured)));
    }

    #[test]
    fn run_as_user_rejects_system_uid_before_spawning() {
        let runner = CommandRunner::new(Platform::Linux).with_user("root", 0);
        let result = runner.run_as_user(&["id".to_string()], None);
        assert!(matches!(
            result,
            Err(MdmError::InvalidUser { uid: 0, min_uid: 1000, .. })
        ));
    }

    #[test]
    fn string_commands_become_shell_form() {
        assert_eq!(
            CommandLine::from("echo hi | wc -c"),
            CommandLine::Shell("echo hi | wc -c".to_string())
        );
        assert_eq!(
            CommandLine::from(["echo", "hi"]),
            CommandLine::Exec(vec!["echo".to_string(), "hi".to_string()])
        );
    }
}
