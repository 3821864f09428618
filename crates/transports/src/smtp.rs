use std::time::Duration;

use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use mailwire_core::{BackendKind, EmailEnvelope, SendResult};
use mailwire_provider::{MailError, MailTransport};
use tracing::{debug, error, info, instrument};

use crate::config::SmtpConfig;
use crate::mime;
use crate::translate::{NativeSmtpConfig, to_native_mail_options, to_native_smtp_config};

const BACKEND: BackendKind = BackendKind::SmtpNative;

/// SMTP delivery over native sockets using `lettre`.
pub struct SmtpTransport {
    config: NativeSmtpConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl std::fmt::Debug for SmtpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpTransport")
            .field("config", &self.config)
            .field("transport", &"<AsyncSmtpTransport>")
            .finish()
    }
}

impl SmtpTransport {
    /// Create a transport from configured SMTP settings.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let config = to_native_smtp_config(config);
        let transport = build_transport(&config)?;
        Ok(Self { config, transport })
    }

    /// Create a `SmtpTransport` with a pre-built transport (for testing).
    pub fn with_transport(config: &SmtpConfig, transport: AsyncSmtpTransport<Tokio1Executor>) -> Self {
        Self {
            config: to_native_smtp_config(config),
            transport,
        }
    }
}

impl MailTransport for SmtpTransport {
    fn backend(&self) -> BackendKind {
        BACKEND
    }

    #[instrument(skip(self, envelope), fields(backend = %BACKEND, host = %self.config.host))]
    async fn send(&self, envelope: &EmailEnvelope) -> Result<SendResult, MailError> {
        let options = to_native_mail_options(envelope, None);
        let rendered = mime::render(&options).map_err(|e| MailError::transport(BACKEND, e))?;

        debug!(to = ?rendered.recipients, "sending email via SMTP");
        let response = self
            .transport
            .send(rendered.message.clone())
            .await
            .map_err(|e| {
                error!(error = %e, "SMTP send failed");
                MailError::transport(BACKEND, describe_smtp_error(&e))
            })?;

        let text = format!(
            "{} {}",
            response.code(),
            response.message().collect::<Vec<_>>().join(" ")
        );
        info!(message_id = %rendered.message_id, response = %text, "email sent via SMTP");

        // lettre fails the whole send if any RCPT is refused, so success
        // means every recipient was accepted.
        Ok(rendered.accepted(text))
    }
}

/// Build an async SMTP transport from the native settings.
fn build_transport(
    config: &NativeSmtpConfig,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
    let tls_error = |e: lettre::transport::smtp::Error| {
        MailError::Configuration(format!("SMTP TLS setup failed: {e}"))
    };

    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        .port(config.port);

    if config.secure {
        let params = TlsParameters::new(config.host.clone()).map_err(tls_error)?;
        builder = builder.tls(Tls::Wrapper(params));
    } else if !config.ignore_tls {
        let params = TlsParameters::new(config.host.clone()).map_err(tls_error)?;
        builder = builder.tls(Tls::Opportunistic(params));
    }

    if let Some(ms) = config.timeout_ms {
        builder = builder.timeout(Some(Duration::from_millis(ms)));
    }

    if let Some(auth) = &config.auth {
        builder = builder.credentials(Credentials::new(auth.user.clone(), auth.pass.clone()));
    }

    Ok(builder.build())
}

fn describe_smtp_error(error: &lettre::transport::smtp::Error) -> String {
    if error.is_transient() {
        format!("transient SMTP error: {error}")
    } else if error.is_permanent() {
        format!("permanent SMTP error: {error}")
    } else {
        format!("SMTP error: {error}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_smtp_config() -> SmtpConfig {
        SmtpConfig::new("localhost", 2525)
    }

    #[tokio::test]
    async fn build_transport_plain() {
        let mut config = test_smtp_config();
        config.ignore_tls = true;
        assert!(build_transport(&to_native_smtp_config(&config)).is_ok());
    }

    #[tokio::test]
    async fn build_transport_implicit_tls_with_auth() {
        let config = test_smtp_config().with_secure(true).with_credentials("u", "p");
        let native = to_native_smtp_config(&config);
        assert!(native.auth.is_some());
        assert!(build_transport(&native).is_ok());
    }

    #[tokio::test]
    async fn transport_reports_backend() {
        let transport = SmtpTransport::new(&test_smtp_config()).unwrap();
        assert_eq!(MailTransport::backend(&transport), BackendKind::SmtpNative);
        assert!(format!("{transport:?}").contains("<AsyncSmtpTransport>"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let mut config = SmtpConfig::new("127.0.0.1", 1);
        config.ignore_tls = true;
        config.timeout_ms = Some(500);
        let transport = SmtpTransport::new(&config).unwrap();
        let envelope = EmailEnvelope::new("b@example.com").with_from("a@example.com");

        let err = MailTransport::send(&transport, &envelope).await.unwrap_err();
        assert!(matches!(
            err,
            MailError::Transport {
                backend: BackendKind::SmtpNative,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn prebuilt_transport_is_used_for_delivery() {
        let lettre_transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous("127.0.0.1")
            .port(1)
            .timeout(Some(Duration::from_millis(500)))
            .build();
        let transport = SmtpTransport::with_transport(&test_smtp_config(), lettre_transport);
        assert_eq!(MailTransport::backend(&transport), BackendKind::SmtpNative);

        // Configured host is localhost:2525; the failure comes from the prebuilt 127.0.0.1:1.
        let envelope = EmailEnvelope::new("b@example.com").with_from("a@example.com");
        let err = MailTransport::send(&transport, &envelope).await.unwrap_err();
        assert!(matches!(
            err,
            MailError::Transport {
                backend: BackendKind::SmtpNative,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn invalid_address_is_a_transport_error() {
        let transport = SmtpTransport::new(&test_smtp_config()).unwrap();
        let envelope = EmailEnvelope::new("not an address").with_from("a@example.com");
        let err = MailTransport::send(&transport, &envelope).await.unwrap_err();
        assert!(err.to_string().contains("invalid to address"));
    }
}
