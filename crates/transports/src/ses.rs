use mailwire_aws::{RawEmail, SesClient, SesConfig};
use mailwire_core::{BackendKind, EmailEnvelope, SendResult};
use mailwire_provider::{MailError, MailTransport};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::mime;
use crate::translate::to_native_mail_options;

const BACKEND: BackendKind = BackendKind::SesNative;

/// SES delivery through the AWS SDK.
///
/// The message is rendered to MIME locally and sent as raw content, so
/// headers and attachments survive. The SDK client is built on first use.
pub struct SesTransport {
    config: SesConfig,
    client: OnceCell<SesClient>,
}

impl std::fmt::Debug for SesTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SesTransport")
            .field("config", &self.config)
            .field("client_ready", &self.client.initialized())
            .finish()
    }
}

impl SesTransport {
    pub fn new(config: SesConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> &SesClient {
        self.client
            .get_or_init(|| SesClient::new(self.config.clone()))
            .await
    }
}

impl MailTransport for SesTransport {
    fn backend(&self) -> BackendKind {
        BACKEND
    }

    #[instrument(skip(self, envelope), fields(backend = %BACKEND, region = %self.config.client.region))]
    async fn send(&self, envelope: &EmailEnvelope) -> Result<SendResult, MailError> {
        let options = to_native_mail_options(envelope, Some(&self.config));
        let rendered = mime::render(&options).map_err(|e| MailError::transport(BACKEND, e))?;
        let command_input = options.ses.unwrap_or_default();

        debug!(to = ?rendered.recipients, "sending email via SES SDK");
        let message_id = self
            .client()
            .await
            .send_raw(RawEmail {
                from: &options.from,
                recipients: &rendered.recipients,
                data: rendered.formatted(),
                command_input: &command_input,
            })
            .await
            .map_err(|e| e.into_mail_error(BACKEND))?;

        info!(message_id = %message_id, "email sent via SES SDK");

        let mut result = rendered.accepted(message_id.clone());
        result.message_id = message_id;
        Ok(result)
    }
}
