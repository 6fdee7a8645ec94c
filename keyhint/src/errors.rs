use thiserror::Error;

/// Failure reading from or acting through the accessibility provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Attribute unavailable: {0}")]
    Unavailable(String),

    #[error("Element is gone")]
    ElementGone,

    #[error("Accessibility permission not granted")]
    PermissionDenied,

    #[error("Platform-specific error: {0}")]
    Platform(String),
}

/// Fatal errors for a single discovery attempt.
///
/// Per-element read failures never surface here; the crawler skips the
/// element and keeps walking.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("No window found: {0}")]
    NoWindow(String),

    #[error("Application not found: {0}")]
    ApplicationNotFound(String),

    #[error("UI thread stopped: {0}")]
    EngineStopped(String),
}

impl DiscoveryError {
    /// Guidance suitable for showing to the user next to the error.
    pub fn guidance(&self) -> &'static str {
        match self {
            DiscoveryError::PermissionDenied(_) => {
                "Grant accessibility access to this application in the system privacy settings, then try again."
            }
            DiscoveryError::NoWindow(_) => {
                "Bring a window of the application to the front and try again."
            }
            DiscoveryError::ApplicationNotFound(_) => {
                "The application quit or is not exposing an accessibility tree."
            }
            DiscoveryError::EngineStopped(_) => "Restart the hint engine.",
        }
    }
}

impl From<ProviderError> for DiscoveryError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::PermissionDenied => {
                DiscoveryError::PermissionDenied("accessibility API refused access".to_string())
            }
            ProviderError::ElementGone => {
                DiscoveryError::ApplicationNotFound("application element is gone".to_string())
            }
            other => DiscoveryError::ApplicationNotFound(other.to_string()),
        }
    }
}

/// Typed outcome of a failed execution. Executors never panic or bubble
/// provider faults; every failure lands in one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Target is disabled: {0}")]
    TargetDisabled(String),

    #[error("Element is no longer valid: {0}")]
    ElementInvalid(String),

    #[error("Action failed: {0}")]
    ActionFailed(String),
}
