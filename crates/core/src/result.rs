use serde::{Deserialize, Serialize};

/// Sender and recipients as seen at the protocol level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendEnvelope {
    /// Envelope sender.
    pub from: String,
    /// Every envelope recipient, including `bcc`.
    pub to: Vec<String>,
}

/// Uniform result returned by every backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    /// Message identifier assigned by the transport or generated locally.
    pub message_id: String,
    /// Protocol-level envelope.
    pub envelope: SendEnvelope,
    /// Recipients the transport accepted.
    pub accepted: Vec<String>,
    /// Recipients the transport refused.
    pub rejected: Vec<String>,
    /// Recipients whose status is not yet known.
    pub pending: Vec<String>,
    /// Opaque diagnostic text from the transport.
    pub response: String,
}

impl SendResult {
    /// A result where every envelope recipient was accepted.
    pub fn accepted_all(
        message_id: impl Into<String>,
        from: impl Into<String>,
        to: Vec<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            envelope: SendEnvelope {
                from: from.into(),
                to: to.clone(),
            },
            accepted: to,
            rejected: Vec::new(),
            pending: Vec::new(),
            response: response.into(),
        }
    }
}
