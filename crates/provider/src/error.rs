use mailwire_core::{BackendKind, UnknownDriver, ValidationIssue};
use thiserror::Error;

/// Errors that can occur while sending mail.
#[derive(Debug, Error)]
pub enum MailError {
    /// The envelope failed schema validation.
    #[error("Validation Error")]
    Validation(Vec<ValidationIssue>),

    /// The configured driver has no implementation.
    #[error("driver '{0}' is not implemented or supported")]
    UnsupportedDriver(String),

    /// A backend was invoked in a runtime that cannot run it.
    #[error("{backend} is not supported in this environment: {reason}")]
    UnsupportedEnvironment {
        backend: BackendKind,
        reason: String,
    },

    /// The underlying transport failed.
    #[error("{backend}: {message}")]
    Transport {
        backend: BackendKind,
        message: String,
    },

    /// Captcha parameters were invalid or verification failed.
    #[error("{0}")]
    Captcha(String),

    /// A pre- or post-send hook failed.
    #[error("{stage} hook failed: {message}")]
    Hook { stage: &'static str, message: String },

    /// The mailer configuration is unusable.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl MailError {
    /// Build a transport failure for `backend` from any displayable error.
    pub fn transport(backend: BackendKind, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            backend,
            message: err.to_string(),
        }
    }

    /// HTTP status this error maps to at the request boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Captcha(_) => 400,
            _ => 500,
        }
    }

    /// Returns `true` if a caller could reasonably try again.
    ///
    /// Nothing in this workspace retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Itemized issues for validation failures, if any.
    pub fn issues(&self) -> Option<&[ValidationIssue]> {
        match self {
            Self::Validation(issues) => Some(issues),
            _ => None,
        }
    }
}

impl From<UnknownDriver> for MailError {
    fn from(err: UnknownDriver) -> Self {
        Self::UnsupportedDriver(err.0)
    }
}
