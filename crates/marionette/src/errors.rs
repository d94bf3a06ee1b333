use thiserror::Error;

/// Errors raised by platform adapters and the automation primitives built on
/// top of them. Adapter failures carry the OS error code in the message so it
/// survives the trip through the HTTP error envelope.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AutomationError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Application not found: {0}")]
    AppNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Platform error: {0}")]
    PlatformError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl AutomationError {
    /// Stale-path failures and missing query matches both resolve to this
    /// kind; the agent maps it to a 400-class envelope rather than a 500.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            AutomationError::ElementNotFound(_) | AutomationError::AppNotFound(_)
        )
    }
}

impl From<std::io::Error> for AutomationError {
    fn from(e: std::io::Error) -> Self {
        AutomationError::PlatformError(e.to_string())
    }
}
