use mailwire_core::{BackendKind, EmailEnvelope, Runtime, SendResult};
use mailwire_provider::{MailError, MailTransport};
use tracing::{debug, instrument};

use crate::mime;
use crate::translate::to_native_mail_options;

const BACKEND: BackendKind = BackendKind::Stream;

/// In-memory sink. Renders the message and returns it as the response text.
///
/// No network I/O happens and no state is shared between calls.
#[derive(Debug, Clone, Copy)]
pub struct StreamTransport {
    runtime: Runtime,
}

impl StreamTransport {
    pub fn new(runtime: Runtime) -> Self {
        Self { runtime }
    }
}

impl MailTransport for StreamTransport {
    fn backend(&self) -> BackendKind {
        BACKEND
    }

    #[instrument(skip(self, envelope), fields(backend = %BACKEND))]
    async fn send(&self, envelope: &EmailEnvelope) -> Result<SendResult, MailError> {
        if self.runtime == Runtime::Edge {
            return Err(MailError::UnsupportedEnvironment {
                backend: BACKEND,
                reason: "Stream transport can't be used in edge environments".into(),
            });
        }

        let options = to_native_mail_options(envelope, None);
        let rendered = mime::render(&options).map_err(|e| MailError::transport(BACKEND, e))?;
        let raw = rendered.formatted();

        debug!(message_id = %rendered.message_id, bytes = raw.len(), "email captured in memory");
        Ok(rendered.accepted(String::from_utf8_lossy(&raw)))
    }
}
