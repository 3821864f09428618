use mailwire_aws::{SesConfig, SesHttpClient};
use mailwire_core::{BackendKind, EmailEnvelope, SendEnvelope, SendResult};
use mailwire_provider::{MailError, MailTransport};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::translate::{ses_destinations, to_ses_request};

const BACKEND: BackendKind = BackendKind::SesEdge;

/// SES delivery through the signed HTTP API, for runtimes without the SDK.
///
/// SES gives no per-recipient feedback here, so every submitted
/// destination is reported as accepted.
#[derive(Debug)]
pub struct SesEdgeTransport {
    client: SesHttpClient,
}

impl SesEdgeTransport {
    pub fn new(config: SesConfig) -> Self {
        Self {
            client: SesHttpClient::new(config),
        }
    }

    /// Create a `SesEdgeTransport` with a pre-built HTTP client (for testing).
    pub fn with_client(client: SesHttpClient) -> Self {
        Self { client }
    }
}

impl MailTransport for SesEdgeTransport {
    fn backend(&self) -> BackendKind {
        BACKEND
    }

    #[instrument(skip(self, envelope), fields(backend = %BACKEND))]
    async fn send(&self, envelope: &EmailEnvelope) -> Result<SendResult, MailError> {
        let request = to_ses_request(envelope, Some(self.client.config()));
        let destinations = ses_destinations(&request);

        debug!(to = ?destinations, "sending email via SES HTTP API");
        let response = self
            .client
            .send_email(&request)
            .await
            .map_err(|e| e.into_mail_error(BACKEND))?;

        info!(message_id = %response.message_id, "email sent via SES HTTP API");

        let from = request
            .get("FromEmailAddress")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        Ok(SendResult {
            message_id: response.message_id,
            envelope: SendEnvelope {
                from,
                to: destinations.clone(),
            },
            accepted: destinations,
            rejected: Vec::new(),
            pending: Vec::new(),
            response: response.body.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use mailwire_aws::{AwsBaseConfig, AwsCredentials};
    use serde_json::{Map, json};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    /// Read one HTTP request, headers and body.
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Accept one request and answer it, returning the raw request text.
    async fn serve_once(listener: TcpListener, status: u16, body: &'static str) -> String {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_request(&mut stream).await;

        let response = format!(
            "HTTP/1.1 {status} OK\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             \r\n\
             {body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
        request
    }

    async fn transport(command_input: Map<String, Value>) -> (SesEdgeTransport, TcpListener) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = SesConfig::new("eu-west-1")
            .with_client(
                AwsBaseConfig::new("eu-west-1")
                    .with_credentials(AwsCredentials::new("AKIDEXAMPLE", "secret")),
            )
            .with_command_input(command_input)
            .with_endpoint(format!("http://127.0.0.1:{port}/v2/email/outbound-emails"));
        (SesEdgeTransport::new(config), listener)
    }

    fn envelope() -> EmailEnvelope {
        let mut envelope = EmailEnvelope::new("b@x.com")
            .with_from("App <a@x.com>")
            .with_subject("s")
            .with_text("t");
        envelope.bcc = Some("hidden@x.com".into());
        envelope
    }

    #[tokio::test]
    async fn success_reports_all_destinations_as_accepted() {
        let mut input = Map::new();
        input.insert("ConfigurationSetName".into(), json!("tracking"));
        let (transport, listener) = transport(input).await;
        let server = tokio::spawn(serve_once(listener, 200, r#"{"MessageId":"m-1"}"#));

        let result = MailTransport::send(&transport, &envelope()).await.unwrap();
        let raw = server.await.unwrap();

        assert_eq!(result.message_id, "m-1");
        assert_eq!(result.envelope.from, "App <a@x.com>");
        assert_eq!(result.accepted, vec!["b@x.com", "hidden@x.com"]);
        assert!(result.rejected.is_empty());
        assert!(result.response.contains("m-1"));

        assert!(raw.contains("\"ConfigurationSetName\":\"tracking\""));
        assert!(raw.contains("\"FromEmailAddress\":\"App <a@x.com>\""));
    }

    #[tokio::test]
    async fn error_response_becomes_transport_error() {
        let (transport, listener) = transport(Map::new()).await;
        let server = tokio::spawn(serve_once(listener, 400, r#"{"message":"bad request"}"#));

        let err = MailTransport::send(&transport, &envelope()).await.unwrap_err();
        server.await.unwrap();

        assert!(matches!(
            err,
            MailError::Transport {
                backend: BackendKind::SesEdge,
                ..
            }
        ));
        let text = err.to_string();
        assert!(text.contains("400"), "{text}");
        assert!(text.contains("bad request"), "{text}");
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn missing_credentials_is_a_configuration_error() {
        let transport = SesEdgeTransport::new(SesConfig::new("eu-west-1"));
        let err = MailTransport::send(&transport, &envelope()).await.unwrap_err();
        assert!(matches!(err, MailError::Configuration(_)));
    }
}
