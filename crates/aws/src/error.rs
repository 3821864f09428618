use mailwire_core::BackendKind;
use mailwire_provider::MailError;
use thiserror::Error;

/// Errors specific to SES operations.
#[derive(Debug, Error)]
pub enum AwsProviderError {
    /// The AWS SDK returned an error from the service.
    #[error("AWS service error: {0}")]
    ServiceError(String),

    /// The request was throttled by the AWS service.
    #[error("AWS request throttled")]
    Throttled,

    /// A network or connection error occurred communicating with AWS.
    #[error("AWS connection error: {0}")]
    Connection(String),

    /// The request timed out.
    #[error("AWS request timed out")]
    Timeout,

    /// The SES HTTP API answered with a non-success status.
    #[error("{status} {reason}: {details}")]
    Http {
        status: u16,
        reason: String,
        details: String,
    },

    /// The request or response body was invalid.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// AWS credential resolution failed.
    #[error("credential error: {0}")]
    CredentialError(String),

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl AwsProviderError {
    /// Convert into the mail error taxonomy, tagged with `backend`.
    pub fn into_mail_error(self, backend: BackendKind) -> MailError {
        match self {
            Self::CredentialError(msg) | Self::Configuration(msg) => MailError::Configuration(msg),
            other => MailError::transport(backend, other),
        }
    }
}

/// Classify an AWS SDK error string into the appropriate [`AwsProviderError`].
///
/// This helper inspects the error message for common patterns (throttling,
/// timeout, connection) and maps them to the correct variant.
pub fn classify_sdk_error(error_str: &str) -> AwsProviderError {
    let lower = error_str.to_lowercase();
    if lower.contains("throttl") || lower.contains("rate exceed") || lower.contains("too many") {
        AwsProviderError::Throttled
    } else if lower.contains("timeout") || lower.contains("timed out") {
        AwsProviderError::Timeout
    } else if lower.contains("connection")
        || lower.contains("connect")
        || lower.contains("dns")
        || lower.contains("network")
    {
        AwsProviderError::Connection(error_str.to_owned())
    } else {
        AwsProviderError::ServiceError(error_str.to_owned())
    }
}

/// Classify a `reqwest` failure from the raw HTTP path.
pub fn classify_http_error(err: &reqwest::Error) -> AwsProviderError {
    if err.is_timeout() {
        AwsProviderError::Timeout
    } else if err.is_connect() {
        AwsProviderError::Connection(err.to_string())
    } else {
        classify_sdk_error(&err.to_string())
    }
}
