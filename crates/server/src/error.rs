use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mailwire_provider::MailError;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::captcha::CaptchaError;

/// Errors returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A send failure surfaced through the API.
    #[error(transparent)]
    Mail(#[from] MailError),

    /// Captcha verification rejected or could not run.
    #[error(transparent)]
    Captcha(#[from] CaptchaError),

    /// An error that already carries its status. Passed through unchanged.
    #[error("{message}")]
    Status {
        status: StatusCode,
        message: String,
        data: Option<Value>,
    },

    /// Rate limit exceeded.
    #[error("Too Many Requests")]
    RateLimited {
        /// Seconds until the caller can retry.
        retry_after: u64,
    },
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Mail(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::Captcha(e) => e.status(),
            Self::Status { status, .. } => *status,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn body(&self) -> ErrorBody {
        let data = match self {
            Self::Mail(MailError::Validation(issues)) => serde_json::to_value(issues).ok(),
            Self::Status { data, .. } => data.clone(),
            _ => None,
        };
        let message = match self.to_string() {
            m if m.is_empty() => "Failed to send email".to_owned(),
            m => m,
        };
        ErrorBody {
            status_code: self.status().as_u16(),
            message,
            data,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = self.body();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), message = %body.message, "request failed");
        }

        let mut response = (status, Json(body)).into_response();

        if let Self::RateLimited { retry_after } = self {
            response
                .headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry_after.into());
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use mailwire_core::{BackendKind, ValidationIssue};

    use super::*;

    async fn render(err: ServerError) -> (StatusCode, Value, Option<String>) {
        let response = err.into_response();
        let status = response.status();
        let retry = response
            .headers()
            .get(axum::http::header::RETRY_AFTER)
            .map(|v| v.to_str().unwrap().to_owned());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap(), retry)
    }

    #[tokio::test]
    async fn validation_error_carries_issues() {
        let issue = ValidationIssue::new("custom", "At least one recipient", &[]);
        let (status, body, _) = render(MailError::Validation(vec![issue]).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["message"], "Validation Error");
        assert_eq!(body["data"][0]["message"], "At least one recipient");
    }

    #[tokio::test]
    async fn transport_error_is_500_with_text() {
        let err = MailError::transport(BackendKind::SmtpNative, "connection refused");
        let (status, body, _) = render(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "smtp-native: connection refused");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn status_errors_pass_through() {
        let err = ServerError::Status {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "bad body".into(),
            data: Some(serde_json::json!({"field": "to"})),
        };
        let (status, body, _) = render(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["statusCode"], 422);
        assert_eq!(body["data"]["field"], "to");
    }

    #[tokio::test]
    async fn empty_message_falls_back() {
        let (_, body, _) = render(ServerError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: String::new(),
            data: None,
        })
        .await;
        assert_eq!(body["message"], "Failed to send email");
    }

    #[tokio::test]
    async fn rate_limited_sets_retry_after() {
        let (status, body, retry) = render(ServerError::RateLimited { retry_after: 42 }).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["message"], "Too Many Requests");
        assert_eq!(retry.as_deref(), Some("42"));
    }
}
