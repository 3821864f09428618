use std::collections::HashMap;
use std::sync::Arc;

use mailwire_core::{BackendKind, Driver, Runtime};
use mailwire_provider::{DynMailTransport, MailError};
use mailwire_transports::{
    EdgeSmtpConnector, SesEdgeTransport, SesTransport, SmtpEdgeTransport, SmtpTransport,
    StreamTransport, detect_runtime,
};
use tracing::{debug, warn};

use crate::config::MailerConfig;
use crate::hooks::MailHook;
use crate::mailer::Mailer;
use crate::metrics::MailerMetrics;
use crate::selection::select_backend;

/// Fluent builder for constructing a [`Mailer`].
///
/// Only the backend the configured driver resolves to is constructed.
/// Transports registered with [`transport`](Self::transport) take the place
/// of the built-in backend of the same kind.
pub struct MailerBuilder {
    config: MailerConfig,
    runtime: Option<Runtime>,
    transports: HashMap<BackendKind, Arc<dyn DynMailTransport>>,
    hooks: Vec<Arc<dyn MailHook>>,
    edge_connector: Option<Arc<dyn EdgeSmtpConnector>>,
}

impl MailerBuilder {
    pub fn new() -> Self {
        Self {
            config: MailerConfig::default(),
            runtime: None,
            transports: HashMap::new(),
            hooks: Vec::new(),
            edge_connector: None,
        }
    }

    #[must_use]
    pub fn config(mut self, config: MailerConfig) -> Self {
        self.config = config;
        self
    }

    /// Fix the runtime class instead of detecting it.
    #[must_use]
    pub fn runtime(mut self, runtime: Runtime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Register a transport for the backend kind it reports.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn DynMailTransport>) -> Self {
        self.transports.insert(transport.backend(), transport);
        self
    }

    /// Append a hook. Hooks run in registration order.
    #[must_use]
    pub fn hook(mut self, hook: Arc<dyn MailHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Socket connector that makes SMTP available on the edge.
    #[must_use]
    pub fn edge_connector(mut self, connector: Arc<dyn EdgeSmtpConnector>) -> Self {
        self.edge_connector = Some(connector);
        self
    }

    /// Consume the builder and produce a [`Mailer`].
    pub fn build(self) -> Result<Mailer, MailError> {
        let runtime = self
            .runtime
            .unwrap_or_else(|| detect_runtime(self.config.edge));
        let mut transports = self.transports;

        match self.config.driver.parse::<Driver>() {
            Ok(driver) => {
                let kind = select_backend(driver, runtime);
                if !transports.contains_key(&kind) {
                    let transport =
                        built_in_transport(kind, &self.config, runtime, self.edge_connector)?;
                    transports.insert(kind, transport);
                }
                debug!(backend = %kind, %runtime, "mailer backend resolved");
            }
            Err(e) => warn!(error = %e, "sends will fail until the driver is fixed"),
        }

        Ok(Mailer {
            driver: self.config.driver,
            runtime,
            defaults: self.config.defaults,
            transports,
            hooks: self.hooks,
            metrics: Arc::new(MailerMetrics::default()),
        })
    }
}

impl Default for MailerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn built_in_transport(
    kind: BackendKind,
    config: &MailerConfig,
    runtime: Runtime,
    edge_connector: Option<Arc<dyn EdgeSmtpConnector>>,
) -> Result<Arc<dyn DynMailTransport>, MailError> {
    let ses = || config.ses.clone().unwrap_or_default();
    Ok(match kind {
        BackendKind::SmtpNative => Arc::new(SmtpTransport::new(&config.smtp)?),
        BackendKind::SmtpEdge => Arc::new(SmtpEdgeTransport::new(config.smtp.clone(), edge_connector)),
        BackendKind::SesNative => Arc::new(SesTransport::new(ses())),
        BackendKind::SesEdge => Arc::new(SesEdgeTransport::new(ses())),
        BackendKind::Stream => Arc::new(StreamTransport::new(runtime)),
    })
}
