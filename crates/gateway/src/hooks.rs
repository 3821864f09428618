use async_trait::async_trait;
use mailwire_core::{EmailEnvelope, SendResult};
use tracing::info;

/// Error type hooks report. Any error aborts the send call.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Extension point around every dispatch.
///
/// `before_send` sees the merged, validated envelope and may change it.
/// `after_send` runs only when the backend succeeded.
#[async_trait]
pub trait MailHook: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    async fn before_send(&self, _envelope: &mut EmailEnvelope) -> Result<(), HookError> {
        Ok(())
    }

    async fn after_send(&self, _result: &SendResult) -> Result<(), HookError> {
        Ok(())
    }
}

/// Logs every successful send at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHook;

#[async_trait]
impl MailHook for LoggingHook {
    fn name(&self) -> &str {
        "logging"
    }

    async fn after_send(&self, result: &SendResult) -> Result<(), HookError> {
        info!(
            message_id = %result.message_id,
            from = %result.envelope.from,
            accepted = result.accepted.len(),
            rejected = result.rejected.len(),
            "mail sent"
        );
        Ok(())
    }
}
