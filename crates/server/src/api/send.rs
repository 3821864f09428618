use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use mailwire_core::{EnvelopeSchema, SendResult, decode_envelope, validate_envelope};
use mailwire_provider::MailError;

use crate::error::ServerError;

use super::{AppState, ClientIp};

/// Body of a successful send response.
#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SendResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `POST /api/mail/send` -- validate, check anti-abuse fields and send.
///
/// A filled honeypot answers success without sending. Otherwise the body
/// is decoded and validated, the captcha (if enabled) is verified, and the
/// envelope goes to the mailer. Malformed JSON keeps axum's own status;
/// well-formed JSON of the wrong shape is a validation error.
#[instrument(name = "api.send", skip_all, fields(client = ?ip))]
pub async fn send(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SendResponse>, ServerError> {
    let Json(body) = payload.map_err(|rejection| ServerError::Status {
        status: rejection.status(),
        message: rejection.body_text(),
        data: None,
    })?;

    if honeypot_tripped(&body) {
        info!("honeypot field filled, skipping send");
        return Ok(Json(SendResponse {
            success: true,
            result: None,
            message: Some("Sent".to_owned()),
        }));
    }

    let mut envelope = decode_envelope(&body).map_err(MailError::Validation)?;
    validate_envelope(&envelope, EnvelopeSchema::Body).map_err(MailError::Validation)?;

    if let Some(captcha) = &state.captcha {
        captcha
            .verify(envelope.captcha_token.as_deref(), ip.as_deref())
            .await?;
    }
    envelope.strip_anti_abuse();

    let result = state.mailer.send_mail(envelope).await?;

    Ok(Json(SendResponse {
        success: true,
        result: Some(result),
        message: None,
    }))
}

/// Any non-empty `_gotcha` value, whatever its type.
fn honeypot_tripped(body: &Value) -> bool {
    match body.get("_gotcha") {
        None | Some(Value::Null | Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}
