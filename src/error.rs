use thiserror::Error;

/// Failures raised by the remote browser layer. Transport problems and
/// protocol-level rejections are kept apart so the scan loop can log
/// them with useful detail.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to open WebDriver session at {url}: {reason}")]
    SessionFailed { url: String, reason: String },
    #[error("WebDriver request failed: {reason}")]
    Transport { reason: String },
    #[error("WebDriver command failed ({error}): {message}")]
    Command { error: String, message: String },
    #[error("WebDriver protocol error: {detail}")]
    Protocol { detail: String },
}
