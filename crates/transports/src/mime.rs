use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use lettre::Message;
use lettre::message::header::{ContentType, HeaderName, HeaderValue};
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use mailwire_core::SendResult;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::translate::NativeMailOptions;

/// Errors raised while turning mail options into an RFC 5322 message.
#[derive(Debug, Error)]
pub enum MimeError {
    #[error("invalid {field} address '{value}': {reason}")]
    Address {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid header name '{0}'")]
    Header(String),

    #[error("invalid attachment '{filename}': {reason}")]
    Attachment { filename: String, reason: String },

    #[error("failed to build email: {0}")]
    Build(String),
}

/// An attachment given inline in the request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineAttachment {
    filename: String,
    content: String,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

/// A built message plus the protocol envelope derived from it.
#[derive(Debug, Clone)]
pub struct RenderedMessage {
    pub message: Message,
    pub message_id: String,
    pub envelope_from: String,
    /// Bare addresses of every recipient, blind copies included.
    pub recipients: Vec<String>,
}

impl RenderedMessage {
    /// RFC 5322 bytes. Blind copies are not listed in the headers.
    pub fn formatted(&self) -> Vec<u8> {
        self.message.formatted()
    }

    /// A result where every recipient was accepted.
    pub fn accepted(&self, response: impl Into<String>) -> SendResult {
        SendResult::accepted_all(
            self.message_id.clone(),
            self.envelope_from.clone(),
            self.recipients.clone(),
            response,
        )
    }
}

enum Body {
    Single(SinglePart),
    Alternative(MultiPart),
}

/// Build a `lettre::Message` from native mail options.
pub fn render(options: &NativeMailOptions) -> Result<RenderedMessage, MimeError> {
    let from = parse_mailbox("from", &options.from)?;
    let message_id = format!("<{}@{}>", Uuid::new_v4(), from.email.domain());

    let mut builder = Message::builder()
        .from(from)
        .message_id(Some(message_id.clone()));

    for (field, list) in [
        ("to", &options.to),
        ("cc", &options.cc),
        ("bcc", &options.bcc),
        ("reply-to", &options.reply_to),
    ] {
        for value in list.iter().flatten() {
            let mailbox = parse_mailbox(field, value)?;
            builder = match field {
                "to" => builder.to(mailbox),
                "cc" => builder.cc(mailbox),
                "bcc" => builder.bcc(mailbox),
                _ => builder.reply_to(mailbox),
            };
        }
    }

    if let Some(subject) = &options.subject {
        builder = builder.subject(subject);
    }

    for (name, value) in options.headers.iter().flatten() {
        let header_name =
            HeaderName::new_from_ascii(name.clone()).map_err(|_| MimeError::Header(name.clone()))?;
        builder = builder.raw_header(HeaderValue::new(header_name, value.clone()));
    }

    let body = match (options.text.clone(), options.html.clone()) {
        (Some(text), Some(html)) => Body::Alternative(MultiPart::alternative_plain_html(text, html)),
        (Some(text), None) => Body::Single(SinglePart::plain(text)),
        (None, Some(html)) => Body::Single(SinglePart::html(html)),
        (None, None) => Body::Single(SinglePart::plain(String::new())),
    };

    let attachments = options
        .attachments
        .iter()
        .flatten()
        .filter_map(attachment_part)
        .collect::<Result<Vec<_>, _>>()?;

    let message = if attachments.is_empty() {
        match body {
            Body::Single(part) => builder.singlepart(part),
            Body::Alternative(multipart) => builder.multipart(multipart),
        }
    } else {
        let mixed = match body {
            Body::Single(part) => MultiPart::mixed().singlepart(part),
            Body::Alternative(multipart) => MultiPart::mixed().multipart(multipart),
        };
        builder.multipart(attachments.into_iter().fold(mixed, MultiPart::singlepart))
    }
    .map_err(|e| MimeError::Build(e.to_string()))?;

    let envelope = message.envelope();
    let envelope_from = envelope.from().map(ToString::to_string).unwrap_or_default();
    let recipients = envelope.to().iter().map(ToString::to_string).collect();

    Ok(RenderedMessage {
        message,
        message_id,
        envelope_from,
        recipients,
    })
}

fn parse_mailbox(field: &'static str, value: &str) -> Result<Mailbox, MimeError> {
    value.parse().map_err(|e: lettre::address::AddressError| MimeError::Address {
        field,
        value: value.to_owned(),
        reason: e.to_string(),
    })
}

/// `None` for shapes this builder does not understand; they are skipped.
fn attachment_part(value: &Value) -> Option<Result<SinglePart, MimeError>> {
    let attachment: InlineAttachment = match serde_json::from_value(value.clone()) {
        Ok(attachment) => attachment,
        Err(e) => {
            warn!(error = %e, "skipping attachment with unsupported shape");
            return None;
        }
    };
    Some(build_attachment(attachment))
}

fn build_attachment(attachment: InlineAttachment) -> Result<SinglePart, MimeError> {
    let invalid = |reason: String| MimeError::Attachment {
        filename: attachment.filename.clone(),
        reason,
    };

    let content = match attachment.encoding.as_deref() {
        Some("base64") => STANDARD
            .decode(attachment.content.as_bytes())
            .map_err(|e| invalid(e.to_string()))?,
        _ => attachment.content.clone().into_bytes(),
    };
    let content_type = ContentType::parse(
        attachment
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream"),
    )
    .map_err(|e| invalid(e.to_string()))?;

    Ok(Attachment::new(attachment.filename.clone()).body(content, content_type))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn options() -> NativeMailOptions {
        NativeMailOptions {
            from: "App <app@example.com>".to_owned(),
            to: Some(vec!["b@example.com".to_owned()]),
            subject: Some("Hello".to_owned()),
            text: Some("plain body".to_owned()),
            ..NativeMailOptions::default()
        }
    }

    fn rendered_text(options: &NativeMailOptions) -> String {
        String::from_utf8(render(options).unwrap().formatted()).unwrap()
    }

    #[test]
    fn plain_text_message() {
        let rendered = render(&options()).unwrap();
        assert_eq!(rendered.envelope_from, "app@example.com");
        assert_eq!(rendered.recipients, vec!["b@example.com"]);
        assert!(rendered.message_id.ends_with("@example.com>"));

        let text = String::from_utf8(rendered.formatted()).unwrap();
        assert!(text.contains("Subject: Hello"));
        assert!(text.contains("plain body"));
    }

    #[test]
    fn html_and_text_become_alternative() {
        let mut options = options();
        options.html = Some("<p>rich</p>".to_owned());
        let text = rendered_text(&options);
        assert!(text.contains("multipart/alternative"));
        assert!(text.contains("<p>rich</p>"));
    }

    #[test]
    fn bcc_is_delivered_but_not_listed() {
        let mut options = options();
        options.cc = Some(vec!["C <c@example.com>".to_owned()]);
        options.bcc = Some(vec!["hidden@example.com".to_owned()]);
        let rendered = render(&options).unwrap();
        assert_eq!(
            rendered.recipients,
            vec!["b@example.com", "c@example.com", "hidden@example.com"]
        );
        let text = String::from_utf8(rendered.formatted()).unwrap();
        assert!(!text.contains("hidden@example.com"));
    }

    #[test]
    fn custom_headers_and_reply_to() {
        let mut options = options();
        options.reply_to = Some(vec!["reply@example.com".to_owned()]);
        options.headers = Some([("X-Campaign".to_owned(), "spring".to_owned())].into());
        let text = rendered_text(&options);
        assert!(text.contains("X-Campaign: spring"));
        assert!(text.contains("Reply-To: reply@example.com"));
    }

    #[test]
    fn base64_attachment_is_decoded() {
        let mut options = options();
        options.attachments = Some(vec![json!({
            "filename": "note.txt",
            "content": "aGVsbG8gYXR0YWNobWVudA==",
            "contentType": "text/plain",
            "encoding": "base64"
        })]);
        let text = rendered_text(&options);
        assert!(text.contains("multipart/mixed"));
        assert!(text.contains("note.txt"));
        assert!(text.contains("hello attachment"));
    }

    #[test]
    fn unknown_attachment_shape_is_skipped() {
        let mut options = options();
        options.attachments = Some(vec![json!({"path": "/etc/passwd"})]);
        let text = rendered_text(&options);
        assert!(!text.contains("multipart/mixed"));
    }

    #[test]
    fn bad_base64_is_rejected() {
        let mut options = options();
        options.attachments = Some(vec![json!({
            "filename": "x.bin",
            "content": "not base64!",
            "encoding": "base64"
        })]);
        let err = render(&options).unwrap_err();
        assert!(matches!(err, MimeError::Attachment { .. }));
    }

    #[test]
    fn invalid_from_is_rejected() {
        let mut options = options();
        options.from = "not-valid".to_owned();
        let err = render(&options).unwrap_err();
        assert!(matches!(err, MimeError::Address { field: "from", .. }));
    }

    #[test]
    fn accepted_result_lists_every_recipient() {
        let rendered = render(&options()).unwrap();
        let result = rendered.accepted("250 OK");
        assert_eq!(result.accepted, vec!["b@example.com"]);
        assert_eq!(result.envelope.from, "app@example.com");
        assert_eq!(result.message_id, rendered.message_id);
    }
}
