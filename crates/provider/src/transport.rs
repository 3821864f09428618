use async_trait::async_trait;
use mailwire_core::{BackendKind, EmailEnvelope, SendResult};

use crate::error::MailError;

/// Strongly-typed transport trait with native `async fn`.
///
/// This trait is **not** object-safe. Every `MailTransport` automatically
/// implements [`DynMailTransport`], which is what the mailer stores.
pub trait MailTransport: Send + Sync {
    /// The backend this transport implements.
    fn backend(&self) -> BackendKind;

    /// Send one validated envelope.
    fn send(
        &self,
        envelope: &EmailEnvelope,
    ) -> impl std::future::Future<Output = Result<SendResult, MailError>> + Send;
}

/// Object-safe transport trait for use behind `Arc<dyn DynMailTransport>`.
#[async_trait]
pub trait DynMailTransport: Send + Sync {
    fn backend(&self) -> BackendKind;

    async fn send(&self, envelope: &EmailEnvelope) -> Result<SendResult, MailError>;
}

#[async_trait]
impl<T: MailTransport + Sync> DynMailTransport for T {
    fn backend(&self) -> BackendKind {
        MailTransport::backend(self)
    }

    async fn send(&self, envelope: &EmailEnvelope) -> Result<SendResult, MailError> {
        MailTransport::send(self, envelope).await
    }
}
