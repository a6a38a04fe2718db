/// Error types for harness operations
use thiserror::Error;

use crate::wait::NodeState;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("App launch failed: {0}")]
    LaunchFailed(String),

    #[error("App reset failed: {0}")]
    ResetFailed(String),

    #[error("App has not been launched")]
    NotLaunched,

    #[error("\"{locator}\" did not become visible within {timeout_ms}ms (waited {elapsed_ms}ms, last seen: {last_state})")]
    WaitTimeout {
        locator: String,
        timeout_ms: u64,
        elapsed_ms: u64,
        last_state: NodeState,
    },

    #[error("\"{locator}\" is not visible ({state})")]
    NotVisible { locator: String, state: NodeState },

    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("Command timeout: {0}")]
    Timeout(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;
