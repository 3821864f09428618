use aws_sdk_sesv2::operation::send_email::builders::SendEmailFluentBuilder;
use aws_sdk_sesv2::primitives::Blob;
use aws_sdk_sesv2::types::{Destination, EmailContent, MessageTag, RawMessage};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::auth::build_sdk_config;
use crate::config::SesConfig;
use crate::error::{AwsProviderError, classify_sdk_error};

/// A fully rendered message ready for `SendEmail` with raw content.
#[derive(Debug)]
pub struct RawEmail<'a> {
    pub from: &'a str,
    /// Every envelope recipient, including blind copies.
    pub recipients: &'a [String],
    /// RFC 5322 bytes.
    pub data: Vec<u8>,
    /// Merged command input for this send.
    pub command_input: &'a Map<String, Value>,
}

/// Command-input keys the SDK path understands.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SendOptions {
    pub configuration_set_name: Option<String>,
    pub email_tags: Vec<(String, String)>,
    pub feedback_forwarding_email_address: Option<String>,
    pub feedback_forwarding_email_address_identity_arn: Option<String>,
    pub from_email_address_identity_arn: Option<String>,
    /// Keys present in the input but not applied.
    pub ignored: Vec<String>,
}

impl SendOptions {
    /// Pick the supported keys out of a PascalCase command-input map.
    pub fn from_command_input(input: &Map<String, Value>) -> Self {
        let mut options = Self::default();
        for (key, value) in input {
            match key.as_str() {
                "ConfigurationSetName" => {
                    options.configuration_set_name = value.as_str().map(str::to_owned);
                }
                "FeedbackForwardingEmailAddress" => {
                    options.feedback_forwarding_email_address = value.as_str().map(str::to_owned);
                }
                "FeedbackForwardingEmailAddressIdentityArn" => {
                    options.feedback_forwarding_email_address_identity_arn =
                        value.as_str().map(str::to_owned);
                }
                "FromEmailAddressIdentityArn" => {
                    options.from_email_address_identity_arn = value.as_str().map(str::to_owned);
                }
                "EmailTags" => {
                    options.email_tags = value
                        .as_array()
                        .into_iter()
                        .flatten()
                        .filter_map(|tag| {
                            Some((
                                tag.get("Name")?.as_str()?.to_owned(),
                                tag.get("Value")?.as_str()?.to_owned(),
                            ))
                        })
                        .collect();
                }
                // Set by the caller from the rendered message.
                "FromEmailAddress" | "Destination" | "ReplyToAddresses" | "Content" => {}
                other => options.ignored.push(other.to_owned()),
            }
        }
        options
    }

    fn apply(self, mut request: SendEmailFluentBuilder) -> Result<SendEmailFluentBuilder, AwsProviderError> {
        if let Some(name) = self.configuration_set_name {
            request = request.configuration_set_name(name);
        }
        for (name, value) in self.email_tags {
            let tag = MessageTag::builder()
                .name(name)
                .value(value)
                .build()
                .map_err(|e| AwsProviderError::InvalidPayload(e.to_string()))?;
            request = request.email_tags(tag);
        }
        if let Some(address) = self.feedback_forwarding_email_address {
            request = request.feedback_forwarding_email_address(address);
        }
        if let Some(arn) = self.feedback_forwarding_email_address_identity_arn {
            request = request.feedback_forwarding_email_address_identity_arn(arn);
        }
        if let Some(arn) = self.from_email_address_identity_arn {
            request = request.from_email_address_identity_arn(arn);
        }
        Ok(request)
    }
}

/// AWS `SESv2` client wrapper used by the native SES backend.
pub struct SesClient {
    config: SesConfig,
    client: aws_sdk_sesv2::Client,
}

impl std::fmt::Debug for SesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SesClient")
            .field("config", &self.config)
            .field("client", &"<SesV2Client>")
            .finish()
    }
}

impl SesClient {
    /// Create a new `SesClient` by building an AWS SDK client.
    pub async fn new(config: SesConfig) -> Self {
        let sdk_config = build_sdk_config(&config.client).await;
        let client = aws_sdk_sesv2::Client::new(&sdk_config);
        Self { config, client }
    }

    /// Send a raw MIME message and return the SES message id.
    pub async fn send_raw(&self, email: RawEmail<'_>) -> Result<String, AwsProviderError> {
        debug!(from = %email.from, recipients = ?email.recipients, "sending raw email via SES");

        // Raw content carries To/Cc in its headers; the destination decides
        // who actually receives it, which is how blind copies get delivered.
        let destination = Destination::builder()
            .set_to_addresses(non_empty(email.recipients))
            .build();

        let raw = RawMessage::builder()
            .data(Blob::new(email.data))
            .build()
            .map_err(|e| AwsProviderError::InvalidPayload(e.to_string()))?;

        let request = self
            .client
            .send_email()
            .from_email_address(email.from)
            .destination(destination)
            .content(EmailContent::builder().raw(raw).build());

        let options = SendOptions::from_command_input(email.command_input);
        if !options.ignored.is_empty() {
            warn!(keys = ?options.ignored, "command input keys not supported by the SDK path");
        }
        let request = options.apply(request)?;

        let result = request.send().await.map_err(|e| {
            let err_str = aws_sdk_sesv2::error::DisplayErrorContext(&e).to_string();
            error!(error = %err_str, "SES send_email failed");
            classify_sdk_error(&err_str)
        })?;

        let message_id = result.message_id().unwrap_or("unknown").to_owned();
        info!(message_id = %message_id, "SES email sent");

        Ok(message_id)
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &SesConfig {
        &self.config
    }
}

fn non_empty(addresses: &[String]) -> Option<Vec<String>> {
    (!addresses.is_empty()).then(|| addresses.to_vec())
}
