use serde_json::Value;
use thiserror::Error;

/// Errors returned by [`MailerClient`](crate::MailerClient).
#[derive(Debug, Error)]
pub enum Error {
    /// The client could not be constructed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request never produced a response.
    #[error("connection error: {0}")]
    Connection(String),

    /// The response body did not have the expected shape.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// The server answered with an error status.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        /// Validation issues, when the server reported any.
        data: Option<Value>,
    },
}

impl Error {
    /// Returns `true` for statuses a caller could reasonably retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
