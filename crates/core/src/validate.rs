use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::address::Address;
use crate::envelope::EmailEnvelope;

/// Wire names of the fields holding one or more addresses.
const RECIPIENT_FIELDS: [&str; 5] = ["to", "cc", "bcc", "replyTo", "reply"];

/// One schema violation, shaped like the issues returned to HTTP clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Machine-readable issue code.
    pub code: String,
    /// Human-readable description.
    pub message: String,
    /// Path of the offending field; empty for object-level issues.
    pub path: Vec<String>,
}

impl ValidationIssue {
    /// Create an issue for the given field path.
    pub fn new(code: &str, message: impl Into<String>, path: &[&str]) -> Self {
        Self {
            code: code.to_owned(),
            message: message.into(),
            path: path.iter().map(|p| (*p).to_owned()).collect(),
        }
    }
}

/// Which rule set to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeSchema {
    /// Request-body rules: at least one recipient. The captcha token is
    /// optional here; the captcha verifier enforces it when enabled.
    Body,
    /// Dispatch rules: the body rules plus a non-empty `from`.
    Configuration,
}

pub const MISSING_RECIPIENT: &str = "At least one recipient (to, cc, or bcc) must be provided";
pub const MISSING_FROM: &str =
    "Missing \"from\" address. Define it in the send options or in the mailer defaults";

/// Check an envelope against `schema`, reporting every violated rule.
pub fn validate_envelope(
    envelope: &EmailEnvelope,
    schema: EnvelopeSchema,
) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if !envelope.has_recipient() {
        issues.push(ValidationIssue::new("custom", MISSING_RECIPIENT, &[]));
    }

    if schema == EnvelopeSchema::Configuration
        && envelope.from.as_ref().is_none_or(crate::Address::is_empty)
    {
        issues.push(ValidationIssue::new("invalid_type", MISSING_FROM, &["from"]));
    }

    if issues.is_empty() { Ok(()) } else { Err(issues) }
}

/// Decode a JSON request body into an envelope.
///
/// A field of the wrong type is reported as one `invalid_type` issue whose
/// path names the field, and the list index for address lists.
pub fn decode_envelope(body: &Value) -> Result<EmailEnvelope, Vec<ValidationIssue>> {
    EmailEnvelope::deserialize(body).map_err(|e| {
        vec![ValidationIssue {
            code: "invalid_type".to_owned(),
            message: format!("Invalid input: {e}"),
            path: type_error_path(body),
        }]
    })
}

fn type_error_path(body: &Value) -> Vec<String> {
    let Some(fields) = body.as_object() else {
        return Vec::new();
    };

    for (key, value) in fields {
        let single = Value::Object(Map::from_iter([(key.clone(), value.clone())]));
        if EmailEnvelope::deserialize(&single).is_ok() {
            continue;
        }

        let mut path = vec![key.clone()];
        if RECIPIENT_FIELDS.contains(&key.as_str())
            && let Some(index) = value
                .as_array()
                .and_then(|items| items.iter().position(|item| Address::deserialize(item).is_err()))
        {
            path.push(index.to_string());
        }
        return path;
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::address::Mailbox;

    #[test]
    fn body_requires_a_recipient() {
        let issues = validate_envelope(&EmailEnvelope::default(), EnvelopeSchema::Body).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, MISSING_RECIPIENT);
        assert!(issues[0].path.is_empty());
    }

    #[test]
    fn any_single_recipient_field_is_enough() {
        for field in ["to", "cc", "bcc"] {
            let envelope: EmailEnvelope =
                serde_json::from_value(serde_json::json!({ field: "x@y.com" })).unwrap();
            assert!(validate_envelope(&envelope, EnvelopeSchema::Body).is_ok(), "{field}");
        }
    }

    #[test]
    fn body_does_not_require_from_or_captcha() {
        let envelope = EmailEnvelope::new("b@x.com");
        assert!(envelope.captcha_token.is_none());
        assert!(validate_envelope(&envelope, EnvelopeSchema::Body).is_ok());
    }

    #[test]
    fn configuration_requires_from() {
        let issues =
            validate_envelope(&EmailEnvelope::new("b@x.com"), EnvelopeSchema::Configuration)
                .unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, vec!["from"]);
    }

    #[test]
    fn configuration_rejects_empty_from() {
        let envelope = EmailEnvelope::new("b@x.com").with_from("");
        assert!(validate_envelope(&envelope, EnvelopeSchema::Configuration).is_err());
        let envelope =
            EmailEnvelope::new("b@x.com").with_from(Address::Structured(Mailbox::new("")));
        assert!(validate_envelope(&envelope, EnvelopeSchema::Configuration).is_err());
    }

    #[test]
    fn configuration_reports_every_missing_field() {
        let issues = validate_envelope(&EmailEnvelope::default(), EnvelopeSchema::Configuration)
            .unwrap_err();
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn configuration_passes_with_from_and_recipient() {
        let envelope = EmailEnvelope::new("b@x.com").with_from("a@x.com");
        assert!(validate_envelope(&envelope, EnvelopeSchema::Configuration).is_ok());
    }

    #[test]
    fn decode_accepts_well_typed_body() {
        let envelope = decode_envelope(&json!({"to": ["a@x.com", "b@x.com"], "subject": "s"})).unwrap();
        assert_eq!(envelope.all_recipients(), vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn decode_reports_mistyped_field() {
        let issues = decode_envelope(&json!({"to": 123, "subject": "s"})).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "invalid_type");
        assert_eq!(issues[0].path, vec!["to"]);

        let issues = decode_envelope(&json!({"to": "a@x.com", "subject": 5})).unwrap_err();
        assert_eq!(issues[0].path, vec!["subject"]);
    }

    #[test]
    fn decode_points_at_bad_list_entry() {
        let issues = decode_envelope(&json!({"to": ["b@x.com", 7]})).unwrap_err();
        assert_eq!(issues[0].path, vec!["to", "1"]);
    }

    #[test]
    fn decode_non_object_body_has_empty_path() {
        let issues = decode_envelope(&json!([1, 2])).unwrap_err();
        assert!(issues[0].path.is_empty());
    }
}
