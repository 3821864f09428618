use std::collections::HashMap;
use std::sync::Arc;

use mailwire_core::{
    BackendKind, Driver, EmailEnvelope, EnvelopeSchema, Runtime, SendResult, validate_envelope,
};
use mailwire_provider::{DynMailTransport, MailError};
use tracing::{debug, error, info, instrument, warn};

use crate::builder::MailerBuilder;
use crate::hooks::{HookError, MailHook};
use crate::metrics::MailerMetrics;
use crate::selection::select_backend;

/// The send entry point.
///
/// Each call merges the caller's envelope over the configured defaults,
/// validates it, runs the before-send hooks, dispatches to the selected
/// backend and runs the after-send hooks. Calls share no mutable state
/// besides the metric counters, so any number may run concurrently.
pub struct Mailer {
    pub(crate) driver: String,
    pub(crate) runtime: Runtime,
    pub(crate) defaults: EmailEnvelope,
    pub(crate) transports: HashMap<BackendKind, Arc<dyn DynMailTransport>>,
    pub(crate) hooks: Vec<Arc<dyn MailHook>>,
    pub(crate) metrics: Arc<MailerMetrics>,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("driver", &self.driver)
            .field("runtime", &self.runtime)
            .field("transports", &self.transports.keys().collect::<Vec<_>>())
            .field("hooks", &self.hooks.iter().map(|h| h.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Mailer {
    pub fn builder() -> MailerBuilder {
        MailerBuilder::new()
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime
    }

    pub fn metrics(&self) -> &Arc<MailerMetrics> {
        &self.metrics
    }

    /// The backend a send would use right now.
    pub fn backend(&self) -> Result<BackendKind, MailError> {
        let driver: Driver = self.driver.parse()?;
        Ok(select_backend(driver, self.runtime))
    }

    /// Send one message.
    #[instrument(
        name = "mailer.send_mail",
        skip(self, envelope),
        fields(driver = %self.driver, runtime = %self.runtime)
    )]
    pub async fn send_mail(&self, envelope: EmailEnvelope) -> Result<SendResult, MailError> {
        self.metrics.increment_dispatched();

        let mut envelope = envelope
            .merge_defaults(&self.defaults)
            .map_err(|e| MailError::Configuration(format!("cannot apply mail defaults: {e}")))?;

        if let Err(issues) = validate_envelope(&envelope, EnvelopeSchema::Configuration) {
            self.metrics.increment_rejected();
            warn!(issues = issues.len(), "envelope failed validation");
            return Err(MailError::Validation(issues));
        }

        for hook in &self.hooks {
            hook.before_send(&mut envelope)
                .await
                .map_err(|e| self.hook_failure("before_send", hook.as_ref(), &e))?;
        }

        let transport = self.transport().inspect_err(|_| self.metrics.increment_failed())?;
        let backend = transport.backend();

        debug!(%backend, to = ?envelope.all_recipients(), "dispatching");
        let result = match transport.send(&envelope).await {
            Ok(result) => result,
            Err(e) => {
                self.metrics.increment_failed();
                error!(%backend, error = %e, "send failed");
                return Err(e);
            }
        };
        self.metrics.increment_sent();
        info!(%backend, message_id = %result.message_id, "send succeeded");

        for hook in &self.hooks {
            hook.after_send(&result)
                .await
                .map_err(|e| self.hook_failure("after_send", hook.as_ref(), &e))?;
        }

        Ok(result)
    }

    fn transport(&self) -> Result<&Arc<dyn DynMailTransport>, MailError> {
        let kind = self.backend()?;
        self.transports
            .get(&kind)
            .ok_or_else(|| MailError::Configuration(format!("no transport registered for {kind}")))
    }

    fn hook_failure(&self, stage: &'static str, hook: &dyn MailHook, e: &HookError) -> MailError {
        self.metrics.increment_hook_failures();
        error!(stage, hook = hook.name(), error = %e, "hook failed");
        MailError::Hook {
            stage,
            message: format!("{}: {e}", hook.name()),
        }
    }
}
