use chrono::Utc;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::config::SesConfig;
use crate::error::{AwsProviderError, classify_http_error};
use crate::sigv4::{self, SigningParams};

/// Successful answer from the `outbound-emails` resource.
#[derive(Debug, Clone, PartialEq)]
pub struct SesHttpResponse {
    pub message_id: String,
    /// The response body as returned by SES.
    pub body: Value,
}

/// `SESv2` client that talks to the HTTP API directly with SigV4 signing.
///
/// Used where the SDK cannot run. The request body is the PascalCase
/// `SendEmail` JSON shape and is forwarded verbatim.
pub struct SesHttpClient {
    config: SesConfig,
    client: Client,
}

impl std::fmt::Debug for SesHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SesHttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SesHttpClient {
    pub fn new(config: SesConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Create a client with a custom HTTP client.
    pub fn with_client(config: SesConfig, client: Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &SesConfig {
        &self.config
    }

    /// POST a signed `SendEmail` request.
    #[instrument(skip(self, request), fields(region = %self.config.client.region))]
    pub async fn send_email(&self, request: &Value) -> Result<SesHttpResponse, AwsProviderError> {
        let credentials = self.config.client.signing_credentials()?;
        let endpoint = self.config.outbound_emails_url();
        let url = Url::parse(&endpoint).map_err(|e| {
            AwsProviderError::Configuration(format!("invalid SES endpoint '{endpoint}': {e}"))
        })?;
        let body = serde_json::to_vec(request)
            .map_err(|e| AwsProviderError::InvalidPayload(e.to_string()))?;

        let params = SigningParams {
            credentials: &credentials,
            region: &self.config.client.region,
            service: "ses",
            time: Utc::now(),
        };
        let content_type = ("content-type", "application/json");
        let signed = sigv4::sign(&params, "POST", &url, &[content_type], &body);

        debug!(url = %url, "posting SES request");

        let mut builder = self
            .client
            .post(url)
            .header(content_type.0, content_type.1)
            .body(body);
        for (name, value) in signed {
            builder = builder.header(name, value);
        }

        let response = builder.send().await.map_err(|e| {
            error!(error = %e, "SES HTTP request failed");
            classify_http_error(&e)
        })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            // Prefer the compact JSON form of the error body, else the raw text.
            let details = serde_json::from_str::<Value>(&text).map_or(text, |v| v.to_string());
            error!(status = status.as_u16(), details = %details, "SES rejected request");
            return Err(AwsProviderError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_owned(),
                details,
            });
        }

        let body: Value = serde_json::from_str(&text)
            .map_err(|e| AwsProviderError::InvalidPayload(format!("invalid SES response: {e}")))?;
        let message_id = body
            .get("MessageId")
            .and_then(Value::as_str)
            .ok_or_else(|| AwsProviderError::InvalidPayload("SES response has no MessageId".into()))?
            .to_owned();

        info!(message_id = %message_id, "SES email sent");
        Ok(SesHttpResponse { message_id, body })
    }
}
