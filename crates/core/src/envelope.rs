use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::address::{Address, Recipients};
use crate::merge::deep_merge;

/// The canonical message representation passed between layers.
///
/// Every field is optional on the wire; [`validate_envelope`] decides what is
/// required. Keys this struct does not know about are kept in [`extra`] and
/// forwarded to transports that understand them (the raw SES request in
/// particular).
///
/// [`validate_envelope`]: crate::validate::validate_envelope
/// [`extra`]: EmailEnvelope::extra
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmailEnvelope {
    /// Sender address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Primary recipients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Recipients>,
    /// Carbon-copy recipients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<Recipients>,
    /// Blind carbon-copy recipients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcc: Option<Recipients>,
    /// Reply address (`replyTo` on the wire).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Recipients>,
    /// Alternate spelling of the reply address. Takes precedence over
    /// `reply_to` when both are set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<Recipients>,
    /// Subject line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Plain-text body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// HTML body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// Extra message headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    /// Attachments, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Value>>,
    /// Per-call SES command input, merged over the configured default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ses: Option<Map<String, Value>>,
    /// Honeypot field. A non-empty value marks the request as automated.
    #[serde(rename = "_gotcha", skip_serializing_if = "Option::is_none")]
    pub gotcha: Option<String>,
    /// Captcha response token supplied by the browser.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha_token: Option<String>,
    /// Unrecognised keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EmailEnvelope {
    /// Start an envelope addressed to `to`.
    pub fn new(to: impl Into<Recipients>) -> Self {
        Self {
            to: Some(to.into()),
            ..Self::default()
        }
    }

    /// Set the sender.
    #[must_use]
    pub fn with_from(mut self, from: impl Into<Address>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Set the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the plain-text body.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the HTML body.
    #[must_use]
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Merge this envelope over `defaults`; fields set here win.
    pub fn merge_defaults(&self, defaults: &EmailEnvelope) -> Result<EmailEnvelope, serde_json::Error> {
        let merged = deep_merge(serde_json::to_value(self)?, serde_json::to_value(defaults)?);
        serde_json::from_value(merged)
    }

    /// The reply address, preferring `reply` over `reply_to`.
    pub fn reply_address(&self) -> Option<&Recipients> {
        self.reply
            .as_ref()
            .filter(|r| !r.is_blank())
            .or(self.reply_to.as_ref())
    }

    /// `true` when at least one of `to`, `cc`, `bcc` holds an address.
    pub fn has_recipient(&self) -> bool {
        [&self.to, &self.cc, &self.bcc]
            .into_iter()
            .any(|field| field.as_ref().is_some_and(|r| !r.is_blank()))
    }

    /// Formatted addresses of every recipient across `to`, `cc` and `bcc`.
    pub fn all_recipients(&self) -> Vec<String> {
        [&self.to, &self.cc, &self.bcc]
            .into_iter()
            .flatten()
            .flat_map(|r| r.iter())
            .filter(|a| !a.is_empty())
            .map(Address::to_formatted)
            .collect()
    }

    /// `true` when the honeypot field carries a value.
    pub fn is_honeypot_tripped(&self) -> bool {
        self.gotcha.as_deref().is_some_and(|v| !v.is_empty())
    }

    /// Remove the anti-abuse fields so they never reach a transport.
    pub fn strip_anti_abuse(&mut self) {
        self.gotcha = None;
        self.captcha_token = None;
    }
}
