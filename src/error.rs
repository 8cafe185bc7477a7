use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MdmError {
    #[error(
        "Platform '{platform}' is not supported. Supported platforms: darwin, win32, linux. \
         Set the PYMDM_PLATFORM environment variable to override detection."
    )]
    UnsupportedPlatform { platform: String },

    #[error(
        "Unknown MDM provider '{provider}'. Supported providers: jamf, intune. \
         Set the PYMDM_MDM_PROVIDER environment variable to override detection."
    )]
    UnsupportedProvider { provider: String },

    #[error("Command failed with exit code {code:?}: {stderr}")]
    CommandFailed { code: Option<i32>, stderr: String },

    #[error("Command timed out after {timeout:?}")]
    CommandTimeout { timeout: Duration },

    #[error("Invalid run-as user '{username}' (uid {uid}, platform minimum {min_uid})")]
    InvalidUser {
        username: String,
        uid: u32,
        min_uid: u32,
    },

    #[error("Run-as user is not configured on this CommandRunner")]
    UserNotConfigured,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MdmError>;
