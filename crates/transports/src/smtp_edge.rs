use std::sync::Arc;

use async_trait::async_trait;
use mailwire_core::{BackendKind, EmailEnvelope, SendEnvelope, SendResult};
use mailwire_provider::{MailError, MailTransport};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::SmtpConfig;
use crate::translate::{EdgeMailOptions, EdgeSmtpConfig, to_edge_mail_options, to_edge_smtp_config};

const BACKEND: BackendKind = BackendKind::SmtpEdge;

/// Socket primitive of an edge runtime that can speak SMTP.
///
/// Edge isolates do not expose general TCP. Runtimes that do offer an
/// outbound socket API (Cloudflare `connect()`) provide it through this trait.
#[async_trait]
pub trait EdgeSmtpConnector: Send + Sync {
    /// Connect, deliver one message, and disconnect.
    async fn send(
        &self,
        config: &EdgeSmtpConfig,
        mail: &EdgeMailOptions,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// SMTP delivery through an edge runtime's socket connector.
///
/// Without a connector this backend is unavailable and every send fails
/// with [`MailError::UnsupportedEnvironment`]. Connectors report no
/// per-recipient detail, so results carry a generated message id, no
/// accepted list, and a fixed `250 OK` response.
pub struct SmtpEdgeTransport {
    config: SmtpConfig,
    connector: Option<Arc<dyn EdgeSmtpConnector>>,
}

impl std::fmt::Debug for SmtpEdgeTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpEdgeTransport")
            .field("config", &self.config)
            .field("connector", &self.connector.as_ref().map(|_| "<EdgeSmtpConnector>"))
            .finish()
    }
}

impl SmtpEdgeTransport {
    pub fn new(config: SmtpConfig, connector: Option<Arc<dyn EdgeSmtpConnector>>) -> Self {
        Self { config, connector }
    }
}

impl MailTransport for SmtpEdgeTransport {
    fn backend(&self) -> BackendKind {
        BACKEND
    }

    #[instrument(skip(self, envelope), fields(backend = %BACKEND))]
    async fn send(&self, envelope: &EmailEnvelope) -> Result<SendResult, MailError> {
        let Some(connector) = &self.connector else {
            return Err(MailError::UnsupportedEnvironment {
                backend: BACKEND,
                reason: "SMTP on the edge needs a runtime socket connector, \
                         which only Cloudflare Workers provide"
                    .into(),
            });
        };

        let config = to_edge_smtp_config(&self.config);
        let mail = to_edge_mail_options(envelope);

        debug!(host = %config.host, to = ?mail.to, "sending email via edge SMTP connector");
        connector
            .send(&config, &mail)
            .await
            .map_err(|e| MailError::transport(BACKEND, e))?;

        let message_id = format!("<{}@edge>", Uuid::new_v4());
        info!(message_id = %message_id, "email handed to edge SMTP connector");

        Ok(SendResult {
            message_id,
            envelope: SendEnvelope {
                from: mail.from.email.clone(),
                to: envelope.all_recipients(),
            },
            accepted: Vec::new(),
            rejected: Vec::new(),
            pending: Vec::new(),
            response: "250 OK".to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingConnector {
        calls: Mutex<Vec<(EdgeSmtpConfig, EdgeMailOptions)>>,
        fail: bool,
    }

    #[async_trait]
    impl EdgeSmtpConnector for RecordingConnector {
        async fn send(
            &self,
            config: &EdgeSmtpConfig,
            mail: &EdgeMailOptions,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            if self.fail {
                return Err("socket closed".into());
            }
            self.calls
                .lock()
                .unwrap()
                .push((config.clone(), mail.clone()));
            Ok(())
        }
    }

    fn envelope() -> EmailEnvelope {
        EmailEnvelope::new("B <b@x.com>")
            .with_from("App <app@x.com>")
            .with_subject("s")
    }

    #[tokio::test]
    async fn without_connector_is_unsupported() {
        let transport = SmtpEdgeTransport::new(SmtpConfig::default(), None);
        let err = MailTransport::send(&transport, &envelope()).await.unwrap_err();
        assert!(matches!(
            err,
            MailError::UnsupportedEnvironment {
                backend: BackendKind::SmtpEdge,
                ..
            }
        ));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn connector_receives_translated_shapes() {
        let connector = Arc::new(RecordingConnector::default());
        let transport = SmtpEdgeTransport::new(
            SmtpConfig::default().with_auth("u", "p"),
            Some(connector.clone()),
        );

        let result = MailTransport::send(&transport, &envelope()).await.unwrap();
        assert_eq!(result.response, "250 OK");
        assert!(result.accepted.is_empty());
        assert_eq!(result.envelope.from, "app@x.com");
        assert_eq!(result.envelope.to, vec!["B <b@x.com>"]);

        let calls = connector.calls.lock().unwrap();
        let (config, mail) = &calls[0];
        assert_eq!(config.credentials.as_ref().unwrap().username, "u");
        assert_eq!(mail.to[0].name.as_deref(), Some("B"));
        assert_eq!(mail.from.email, "app@x.com");
    }

    #[tokio::test]
    async fn connector_failure_is_a_transport_error() {
        let connector = Arc::new(RecordingConnector {
            fail: true,
            ..RecordingConnector::default()
        });
        let transport = SmtpEdgeTransport::new(SmtpConfig::default(), Some(connector));
        let err = MailTransport::send(&transport, &envelope()).await.unwrap_err();
        assert_eq!(err.to_string(), "smtp-edge: socket closed");
    }
}
