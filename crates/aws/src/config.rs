use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AwsProviderError;

/// Static AWS credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsCredentials {
    #[serde(alias = "accessKeyId")]
    pub access_key_id: String,
    #[serde(alias = "secretAccessKey")]
    pub secret_access_key: String,
    #[serde(default, alias = "sessionToken", skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &self.session_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AwsCredentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}

/// Client settings shared by both SES paths.
///
/// Credentials may be given flat (`access_key_id`, `secret_access_key`,
/// `session_token`) or nested under `credentials`. When neither is present
/// the SDK path falls back to the default AWS credential chain.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsBaseConfig {
    /// AWS region (e.g. `"us-east-1"`).
    pub region: String,

    /// Optional endpoint URL override for the SDK client (e.g. `LocalStack`).
    #[serde(alias = "endpoint", skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,

    #[serde(alias = "accessKeyId", skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    #[serde(alias = "secretAccessKey", skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,

    #[serde(alias = "sessionToken", skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<AwsCredentials>,
}

impl std::fmt::Debug for AwsBaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsBaseConfig")
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("session_token", &self.session_token.as_ref().map(|_| "[REDACTED]"))
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl Default for AwsBaseConfig {
    fn default() -> Self {
        Self::new("us-east-1")
    }
}

impl AwsBaseConfig {
    /// Create a new `AwsBaseConfig` with the given region.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            credentials: None,
        }
    }

    /// Set an endpoint URL override for local development.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Set flat static credentials.
    #[must_use]
    pub fn with_access_keys(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Set nested static credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: AwsCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Credentials for the SDK client.
    ///
    /// Nested credentials win. Flat keys are lifted into the nested shape only
    /// when both the key id and the secret are present. `None` means "use the
    /// default credential chain".
    pub fn sdk_credentials(&self) -> Option<AwsCredentials> {
        if let Some(nested) = &self.credentials {
            return Some(nested.clone());
        }
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => Some(AwsCredentials {
                access_key_id: id.clone(),
                secret_access_key: secret.clone(),
                session_token: self.session_token.clone(),
            }),
            _ => None,
        }
    }

    /// Credentials for request signing.
    ///
    /// Each field is resolved on its own, flat value first, nested value
    /// second. Signing has no credential chain to fall back on, so a missing
    /// key id or secret is an error.
    pub fn signing_credentials(&self) -> Result<AwsCredentials, AwsProviderError> {
        let nested = self.credentials.as_ref();
        let access_key_id = non_empty(self.access_key_id.as_deref())
            .or_else(|| non_empty(nested.map(|c| c.access_key_id.as_str())))
            .ok_or_else(|| AwsProviderError::CredentialError("missing access key id".into()))?;
        let secret_access_key = non_empty(self.secret_access_key.as_deref())
            .or_else(|| non_empty(nested.map(|c| c.secret_access_key.as_str())))
            .ok_or_else(|| {
                AwsProviderError::CredentialError("missing secret access key".into())
            })?;
        let session_token = non_empty(self.session_token.as_deref())
            .or_else(|| non_empty(nested.and_then(|c| c.session_token.as_deref())));

        Ok(AwsCredentials {
            access_key_id: access_key_id.to_owned(),
            secret_access_key: secret_access_key.to_owned(),
            session_token: session_token.map(str::to_owned),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Configuration for the SES driver.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SesConfig {
    /// Client settings (region, credentials, SDK endpoint).
    #[serde(alias = "client_config", alias = "clientConfig")]
    pub client: AwsBaseConfig,

    /// Provider options merged into every send request.
    #[serde(alias = "commandInput")]
    pub command_input: Map<String, Value>,

    /// Full URL for the raw HTTP path, replacing the regional default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for SesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SesConfig")
            .field("client", &self.client)
            .field("command_input", &self.command_input)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl SesConfig {
    /// Create a new `SesConfig` with the given AWS region.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            client: AwsBaseConfig::new(region),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_client(mut self, client: AwsBaseConfig) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn with_command_input(mut self, command_input: Map<String, Value>) -> Self {
        self.command_input = command_input;
        self
    }

    /// Override the raw HTTP endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// URL of the `SESv2` `outbound-emails` resource.
    pub fn outbound_emails_url(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| {
            format!(
                "https://email.{}.amazonaws.com/v2/email/outbound-emails",
                self.client.region
            )
        })
    }
}
