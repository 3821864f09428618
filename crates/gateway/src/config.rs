use mailwire_aws::SesConfig;
use mailwire_core::{Address, EmailEnvelope};
use mailwire_transports::SmtpConfig;
use serde::{Deserialize, Serialize};

/// Read-only settings the mailer is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailerConfig {
    /// Transport family: `smtp`, `ses` or `stream`. Checked at send time.
    pub driver: String,

    /// Forces edge (`true`) or native (`false`) backends. Detected when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge: Option<bool>,

    pub smtp: SmtpConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ses: Option<SesConfig>,

    /// Envelope fields applied under every call, typically `from`.
    pub defaults: EmailEnvelope,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            driver: "smtp".to_owned(),
            edge: None,
            smtp: SmtpConfig::default(),
            ses: None,
            defaults: EmailEnvelope::default(),
        }
    }
}

impl MailerConfig {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_default_from(mut self, from: impl Into<Address>) -> Self {
        self.defaults.from = Some(from.into());
        self
    }

    #[must_use]
    pub fn with_edge(mut self, edge: bool) -> Self {
        self.edge = Some(edge);
        self
    }

    #[must_use]
    pub fn with_ses(mut self, ses: SesConfig) -> Self {
        self.ses = Some(ses);
        self
    }

    #[must_use]
    pub fn with_smtp(mut self, smtp: SmtpConfig) -> Self {
        self.smtp = smtp;
        self
    }
}
