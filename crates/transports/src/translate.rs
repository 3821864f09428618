//! Per-backend option translators.
//!
//! Every function here is pure. Fields a translator does not transform are
//! carried over untouched, including unknown envelope keys.

use std::collections::BTreeMap;

use mailwire_aws::SesConfig;
use mailwire_core::{
    Address, EmailEnvelope, Mailbox, merge_maps, to_formatted_list, to_single_structured,
    to_structured_list,
};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::config::{SmtpAuth, SmtpConfig, SmtpCredentials};

/// SMTP settings in the shape the edge socket connector expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeSmtpConfig {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub ignore_tls: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<SmtpCredentials>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// SMTP settings in the shape the native client expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeSmtpConfig {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub ignore_tls: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<SmtpAuth>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Edge form: explicit `credentials` win, else they are derived from `auth`.
pub fn to_edge_smtp_config(config: &SmtpConfig) -> EdgeSmtpConfig {
    EdgeSmtpConfig {
        host: config.host.clone(),
        port: config.port,
        secure: config.secure,
        ignore_tls: config.ignore_tls,
        timeout_ms: config.timeout_ms,
        credentials: config
            .credentials
            .clone()
            .or_else(|| config.auth.as_ref().map(SmtpCredentials::from)),
        extra: config.extra.clone(),
    }
}

/// Native form: explicit `auth` wins, else it is derived from `credentials`.
pub fn to_native_smtp_config(config: &SmtpConfig) -> NativeSmtpConfig {
    NativeSmtpConfig {
        host: config.host.clone(),
        port: config.port,
        secure: config.secure,
        ignore_tls: config.ignore_tls,
        timeout_ms: config.timeout_ms,
        auth: config
            .auth
            .clone()
            .or_else(|| config.credentials.as_ref().map(SmtpAuth::from)),
        extra: config.extra.clone(),
    }
}

/// Message options for the edge connector: every address structured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeMailOptions {
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<Mailbox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<Vec<Mailbox>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcc: Option<Vec<Mailbox>>,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub fn to_edge_mail_options(envelope: &EmailEnvelope) -> EdgeMailOptions {
    EdgeMailOptions {
        from: single_from(envelope).map_or_else(|| Mailbox::new(""), Address::to_mailbox),
        to: to_structured_list(envelope.to.as_ref()).unwrap_or_default(),
        reply: to_single_structured(envelope.reply_address()),
        cc: to_structured_list(envelope.cc.as_ref()),
        bcc: to_structured_list(envelope.bcc.as_ref()),
        subject: envelope.subject.clone().unwrap_or_default(),
        text: envelope.text.clone(),
        html: envelope.html.clone(),
        headers: envelope.headers.clone(),
        attachments: envelope.attachments.clone(),
        extra: envelope.extra.clone(),
    }
}

/// Message options for the native clients: every address formatted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeMailOptions {
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcc: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Value>>,
    /// Merged SES command input; only set for the SES driver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ses: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Native form. With `ses`, the per-call `ses` map is merged over the
/// configured command input, per-call keys winning.
pub fn to_native_mail_options(
    envelope: &EmailEnvelope,
    ses: Option<&SesConfig>,
) -> NativeMailOptions {
    NativeMailOptions {
        from: single_from(envelope).map(Address::to_formatted).unwrap_or_default(),
        to: to_formatted_list(envelope.to.as_ref()),
        reply_to: to_formatted_list(envelope.reply_address()),
        cc: to_formatted_list(envelope.cc.as_ref()),
        bcc: to_formatted_list(envelope.bcc.as_ref()),
        subject: envelope.subject.clone(),
        text: envelope.text.clone(),
        html: envelope.html.clone(),
        headers: envelope.headers.clone(),
        attachments: envelope.attachments.clone(),
        ses: ses.map(|config| merged_command_input(envelope, config)),
        extra: envelope.extra.clone(),
    }
}

/// Per-call `ses` keys over the configured command input.
pub fn merged_command_input(envelope: &EmailEnvelope, config: &SesConfig) -> Map<String, Value> {
    merge_maps(
        envelope.ses.clone().unwrap_or_default(),
        config.command_input.clone(),
    )
}

/// The PascalCase `SendEmail` request body for the SES HTTP API.
///
/// Unknown envelope keys and the per-call `ses` map are spread into the
/// request first, the translated fields are laid over them, and the
/// configured command input fills whatever is still missing.
pub fn to_ses_request(envelope: &EmailEnvelope, config: Option<&SesConfig>) -> Value {
    let mut request = envelope.extra.clone();
    if let Some(ses) = &envelope.ses {
        request.extend(ses.clone());
    }

    let from = single_from(envelope).map(Address::to_formatted).unwrap_or_default();
    request.insert("FromEmailAddress".into(), Value::String(from));

    let mut destination = Map::new();
    for (key, field) in [
        ("ToAddresses", &envelope.to),
        ("CcAddresses", &envelope.cc),
        ("BccAddresses", &envelope.bcc),
    ] {
        if let Some(list) = to_formatted_list(field.as_ref()) {
            destination.insert(key.into(), json!(list));
        }
    }
    request.insert("Destination".into(), Value::Object(destination));

    if let Some(reply) = to_formatted_list(envelope.reply_address()) {
        request.insert("ReplyToAddresses".into(), json!(reply));
    }

    let mut body = Map::new();
    if let Some(text) = non_empty(envelope.text.as_deref()) {
        body.insert("Text".into(), json!({ "Data": text }));
    }
    if let Some(html) = non_empty(envelope.html.as_deref()) {
        body.insert("Html".into(), json!({ "Data": html }));
    }
    let mut subject = Map::new();
    if let Some(s) = &envelope.subject {
        subject.insert("Data".into(), Value::String(s.clone()));
    }
    request.insert(
        "Content".into(),
        json!({ "Simple": { "Subject": subject, "Body": body } }),
    );

    let command_input = config.map(|c| c.command_input.clone()).unwrap_or_default();
    Value::Object(merge_maps(request, command_input))
}

/// Destination addresses of an SES request, in To, Cc, Bcc order.
pub fn ses_destinations(request: &Value) -> Vec<String> {
    ["ToAddresses", "CcAddresses", "BccAddresses"]
        .iter()
        .filter_map(|key| request.pointer(&format!("/Destination/{key}"))?.as_array())
        .flatten()
        .filter_map(|v| v.as_str().map(str::to_owned))
        .collect()
}

fn single_from(envelope: &EmailEnvelope) -> Option<&Address> {
    envelope.from.as_ref().filter(|a| !a.is_empty())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn envelope(value: Value) -> EmailEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn auth_becomes_edge_credentials() {
        let config = SmtpConfig::default().with_auth("u", "p");
        let edge = serde_json::to_value(to_edge_smtp_config(&config)).unwrap();
        assert_eq!(edge["credentials"], json!({"username": "u", "password": "p"}));
    }

    #[test]
    fn credentials_become_native_auth() {
        let config = SmtpConfig::default().with_credentials("u", "p");
        let native = serde_json::to_value(to_native_smtp_config(&config)).unwrap();
        assert_eq!(native["auth"], json!({"user": "u", "pass": "p"}));
    }

    #[test]
    fn explicit_credential_shapes_win() {
        let config = SmtpConfig::default()
            .with_auth("auth-user", "auth-pass")
            .with_credentials("cred-user", "cred-pass");
        assert_eq!(
            to_edge_smtp_config(&config).credentials.unwrap().username,
            "cred-user"
        );
        assert_eq!(to_native_smtp_config(&config).auth.unwrap().user, "auth-user");
    }

    #[test]
    fn smtp_translation_keeps_unknown_settings() {
        let mut config = SmtpConfig::new("smtp.x.com", 465).with_secure(true);
        config.extra.insert("pool".into(), json!(true));
        let native = to_native_smtp_config(&config);
        assert_eq!(native.host, "smtp.x.com");
        assert!(native.secure);
        assert_eq!(native.extra["pool"], true);
        assert!(native.auth.is_none());
    }

    #[test]
    fn edge_mail_options_are_structured() {
        let options = to_edge_mail_options(&envelope(json!({
            "from": "App <app@x.com>",
            "to": "b@x.com",
            "cc": ["C <c@x.com>", {"name": "D", "address": "d@x.com"}],
            "replyTo": ["r1@x.com", "r2@x.com"],
            "subject": "s",
            "tracking": "on"
        })));
        assert_eq!(options.from, Mailbox::new("app@x.com").with_name("App"));
        assert_eq!(options.to, vec![Mailbox::new("b@x.com")]);
        assert_eq!(options.cc.as_ref().unwrap()[1].name.as_deref(), Some("D"));
        assert_eq!(options.reply, Some(Mailbox::new("r1@x.com")));
        assert!(options.bcc.is_none());
        assert_eq!(options.extra["tracking"], "on");
    }

    #[test]
    fn native_mail_options_are_formatted() {
        let options = to_native_mail_options(
            &envelope(json!({
                "from": {"name": "App", "email": "app@x.com"},
                "to": [{"email": "b@x.com"}, "C <c@x.com>"],
                "reply": "new@x.com",
                "replyTo": "old@x.com"
            })),
            None,
        );
        assert_eq!(options.from, "App <app@x.com>");
        assert_eq!(options.to.unwrap(), vec!["b@x.com", "C <c@x.com>"]);
        assert_eq!(options.reply_to.unwrap(), vec!["new@x.com"]);
        assert!(options.ses.is_none());
    }

    #[test]
    fn native_options_merge_ses_command_input() {
        let mut config = SesConfig::new("us-east-1");
        config.command_input = json!({
            "ConfigurationSetName": "Default",
            "EmailTags": [{"Name": "app", "Value": "web"}]
        })
        .as_object()
        .cloned()
        .unwrap();
        let options = to_native_mail_options(
            &envelope(json!({
                "to": "b@x.com",
                "ses": {"ConfigurationSetName": "Override"}
            })),
            Some(&config),
        );
        let ses = options.ses.unwrap();
        assert_eq!(ses["ConfigurationSetName"], "Override");
        assert_eq!(ses["EmailTags"], json!([{"Name": "app", "Value": "web"}]));
    }

    #[test]
    fn ses_request_shape() {
        let request = to_ses_request(
            &envelope(json!({
                "from": "App <app@x.com>",
                "to": "b@x.com",
                "bcc": ["h@x.com"],
                "replyTo": "r@x.com",
                "subject": "Hello",
                "text": "plain"
            })),
            None,
        );
        assert_eq!(request["FromEmailAddress"], "App <app@x.com>");
        assert_eq!(
            request["Destination"],
            json!({"ToAddresses": ["b@x.com"], "BccAddresses": ["h@x.com"]})
        );
        assert_eq!(request["ReplyToAddresses"], json!(["r@x.com"]));
        assert_eq!(
            request["Content"],
            json!({"Simple": {"Subject": {"Data": "Hello"}, "Body": {"Text": {"Data": "plain"}}}})
        );
        assert_eq!(ses_destinations(&request), vec!["b@x.com", "h@x.com"]);
    }

    #[test]
    fn two_string_lists_translate_to_two_addresses() {
        let envelope = envelope(json!({
            "from": "app@x.com",
            "to": ["a@x.com", "b@x.com"],
            "cc": ["Ann <ann@x.com>", "Bob <bob@x.com>"]
        }));

        let native = to_native_mail_options(&envelope, None);
        assert_eq!(native.to.unwrap(), vec!["a@x.com", "b@x.com"]);
        assert_eq!(native.cc.unwrap(), vec!["Ann <ann@x.com>", "Bob <bob@x.com>"]);

        let edge = to_edge_mail_options(&envelope);
        assert_eq!(edge.to, vec![Mailbox::new("a@x.com"), Mailbox::new("b@x.com")]);

        let request = to_ses_request(&envelope, None);
        assert_eq!(
            request["Destination"]["ToAddresses"],
            json!(["a@x.com", "b@x.com"])
        );
        assert_eq!(
            ses_destinations(&request),
            vec!["a@x.com", "b@x.com", "Ann <ann@x.com>", "Bob <bob@x.com>"]
        );
    }

    #[test]
    fn ses_request_prefers_reply_over_reply_to() {
        let request = to_ses_request(
            &envelope(json!({"to": "b@x.com", "reply": "new@x.com", "replyTo": "old@x.com"})),
            None,
        );
        assert_eq!(request["ReplyToAddresses"], json!(["new@x.com"]));
    }

    #[test]
    fn ses_request_per_call_override_keeps_default_tags() {
        let mut config = SesConfig::new("us-east-1");
        config.command_input = json!({
            "ConfigurationSetName": "Default",
            "EmailTags": [{"Name": "app", "Value": "web"}]
        })
        .as_object()
        .cloned()
        .unwrap();
        let request = to_ses_request(
            &envelope(json!({
                "from": "a@x.com",
                "to": "b@x.com",
                "ses": {"ConfigurationSetName": "Override"}
            })),
            Some(&config),
        );
        assert_eq!(request["ConfigurationSetName"], "Override");
        assert_eq!(request["EmailTags"], json!([{"Name": "app", "Value": "web"}]));
    }

    #[test]
    fn ses_request_passes_unknown_keys() {
        let request = to_ses_request(
            &envelope(json!({"to": "b@x.com", "ListManagementOptions": {"ContactListName": "n"}})),
            None,
        );
        assert_eq!(request["ListManagementOptions"]["ContactListName"], "n");
        assert!(request.get("ses").is_none());
    }
}
