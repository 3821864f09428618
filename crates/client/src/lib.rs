//! Mailwire HTTP Client
//!
//! Sends email envelopes to a Mailwire server's send endpoint.
//!
//! ```no_run
//! use mailwire_client::{MailerClient, SendResponse};
//! use mailwire_core::EmailEnvelope;
//!
//! # async fn example() -> Result<(), mailwire_client::Error> {
//! let client = MailerClient::new("http://localhost:8080");
//! let envelope = EmailEnvelope::new("Bob <bob@example.com>")
//!     .with_subject("Hello")
//!     .with_text("Sent through Mailwire");
//!
//! let response = client.send(&envelope).await?;
//! if let SendResponse::Sent(result) = response {
//!     println!("accepted: {:?}", result.accepted);
//! }
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::Error;

use std::time::Duration;

use mailwire_core::{EmailEnvelope, SendResult};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default path of the send endpoint.
pub const DEFAULT_SEND_ROUTE: &str = "/api/mail/send";

/// Successful answer from the send endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum SendResponse {
    /// The mailer delivered the message to its transport.
    Sent(SendResult),
    /// The server accepted the request without sending (honeypot).
    Accepted(String),
}

impl SendResponse {
    pub fn result(&self) -> Option<&SendResult> {
        match self {
            Self::Sent(result) => Some(result),
            Self::Accepted(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SuccessBody {
    #[serde(default)]
    result: Option<SendResult>,
    #[serde(default)]
    message: Option<String>,
}

impl From<SuccessBody> for SendResponse {
    fn from(body: SuccessBody) -> Self {
        match body.result {
            Some(result) => Self::Sent(result),
            None => Self::Accepted(body.message.unwrap_or_default()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// HTTP client for a Mailwire server.
#[derive(Debug, Clone)]
pub struct MailerClient {
    client: Client,
    base_url: String,
    send_route: String,
}

/// Builder for configuring a [`MailerClient`].
#[derive(Debug)]
pub struct MailerClientBuilder {
    base_url: String,
    timeout: Duration,
    send_route: String,
    client: Option<Client>,
}

impl MailerClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            send_route: DEFAULT_SEND_ROUTE.to_owned(),
            client: None,
        }
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Path of the send endpoint when the server mounts it elsewhere.
    #[must_use]
    pub fn send_route(mut self, route: impl Into<String>) -> Self {
        let route = route.into();
        self.send_route = if route.starts_with('/') {
            route
        } else {
            format!("/{route}")
        };
        self
    }

    /// Use a custom reqwest Client.
    #[must_use]
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<MailerClient, Error> {
        let client = match self.client {
            Some(c) => c,
            None => Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| Error::Configuration(e.to_string()))?,
        };

        Ok(MailerClient {
            client,
            base_url: self.base_url,
            send_route: self.send_route,
        })
    }
}

impl MailerClient {
    /// Create a new client with default configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        MailerClientBuilder::new(base_url)
            .build()
            .expect("default client configuration should not fail")
    }

    pub fn builder(base_url: impl Into<String>) -> MailerClientBuilder {
        MailerClientBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the server is healthy.
    pub async fn health(&self) -> Result<bool, Error> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        Ok(response.status().is_success())
    }

    /// Send one envelope.
    ///
    /// Validation failures come back as [`Error::Api`] with status 400 and
    /// the itemized issues in `data`.
    pub async fn send(&self, envelope: &EmailEnvelope) -> Result<SendResponse, Error> {
        let url = format!("{}{}", self.base_url, self.send_route);
        let response = self
            .client
            .post(&url)
            .json(envelope)
            .send()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        if response.status().is_success() {
            response
                .json::<SuccessBody>()
                .await
                .map(SendResponse::from)
                .map_err(|e| Error::Deserialization(e.to_string()))
        } else {
            Err(api_error(response).await)
        }
    }
}

async fn api_error(response: Response) -> Error {
    let status = response.status();
    // Proxies in front of the server may answer with non-JSON bodies.
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => Error::Api {
            status: status.as_u16(),
            message: body.message,
            data: body.data,
        },
        Err(_) => Error::Api {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .map_or_else(|| text.clone(), str::to_owned),
            data: None,
        },
    }
}
