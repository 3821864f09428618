use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::CaptchaConfig;

pub const TOKEN_REQUIRED: &str = "Captcha token is required";
pub const PROVIDER_INVALID: &str = "Captcha provider not valid";
pub const SECRET_REQUIRED: &str = "Captcha secretKey is required";
pub const INVALID_CAPTCHA: &str = "Invalid captcha";

/// Supported verification services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptchaProvider {
    Turnstile,
    Recaptcha,
    Hcaptcha,
}

impl CaptchaProvider {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "turnstile" => Some(Self::Turnstile),
            "recaptcha" => Some(Self::Recaptcha),
            "hcaptcha" => Some(Self::Hcaptcha),
            _ => None,
        }
    }

    pub fn verify_url(self) -> &'static str {
        match self {
            Self::Turnstile => "https://challenges.cloudflare.com/turnstile/v0/siteverify",
            Self::Recaptcha => "https://www.google.com/recaptcha/api/siteverify",
            Self::Hcaptcha => "https://api.hcaptcha.com/siteverify",
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptchaError {
    /// Missing parameters or a token the provider refused.
    #[error("{0}")]
    Rejected(String),

    /// The provider could not be reached or answered garbage.
    #[error("captcha verification failed: {0}")]
    Unavailable(String),
}

impl CaptchaError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Rejected(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    secret: &'a str,
    response: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    remoteip: Option<&'a str>,
}

#[derive(Deserialize)]
struct VerifyResponse {
    success: bool,
}

/// Checks captcha tokens with the configured provider.
///
/// One POST per request. A failed verification fails the request; there
/// is no retry.
#[derive(Debug)]
pub struct CaptchaVerifier {
    config: CaptchaConfig,
    client: reqwest::Client,
}

impl CaptchaVerifier {
    pub fn new(config: CaptchaConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create a verifier with a custom HTTP client.
    pub fn with_client(config: CaptchaConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Verify `token`, forwarding the caller's address when known.
    ///
    /// Does nothing when captcha is disabled.
    #[instrument(skip(self, token), fields(provider = ?self.config.provider))]
    pub async fn verify(&self, token: Option<&str>, remote_ip: Option<&str>) -> Result<(), CaptchaError> {
        if !self.config.enabled {
            return Ok(());
        }

        let (provider, secret, token) = self.check_parameters(token)?;
        let url = self
            .config
            .verify_url
            .as_deref()
            .unwrap_or_else(|| provider.verify_url());

        debug!(url, "verifying captcha token");
        let response = self
            .client
            .post(url)
            .form(&VerifyRequest {
                secret,
                response: token,
                remoteip: remote_ip,
            })
            .send()
            .await
            .map_err(|e| CaptchaError::Unavailable(e.to_string()))?;

        let outcome: VerifyResponse = response
            .json()
            .await
            .map_err(|e| CaptchaError::Unavailable(e.to_string()))?;

        if outcome.success {
            Ok(())
        } else {
            warn!("captcha token rejected by provider");
            Err(CaptchaError::Rejected(INVALID_CAPTCHA.to_owned()))
        }
    }

    /// Every problem is reported at once, in token, provider, secret order.
    fn check_parameters<'a>(
        &'a self,
        token: Option<&'a str>,
    ) -> Result<(CaptchaProvider, &'a str, &'a str), CaptchaError> {
        let token = token.filter(|t| !t.is_empty());
        let provider = self
            .config
            .provider
            .as_deref()
            .and_then(CaptchaProvider::from_name);
        let secret = self.config.secret_key.as_deref().filter(|s| !s.is_empty());

        match (token, provider, secret) {
            (Some(token), Some(provider), Some(secret)) => Ok((provider, secret, token)),
            _ => {
                let messages: Vec<&str> = [
                    token.is_none().then_some(TOKEN_REQUIRED),
                    provider.is_none().then_some(PROVIDER_INVALID),
                    secret.is_none().then_some(SECRET_REQUIRED),
                ]
                .into_iter()
                .flatten()
                .collect();
                Err(CaptchaError::Rejected(messages.join("; ")))
            }
        }
    }
}
