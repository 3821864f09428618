//! Amazon SES support for mailwire.
//!
//! Two clients share one [`SesConfig`]:
//!
//! - [`SesClient`] sends raw MIME through the `SESv2` SDK (native runtimes).
//! - [`SesHttpClient`] posts a SigV4-signed JSON request straight to the
//!   `SESv2` HTTP API (edge runtimes, where the SDK is unavailable).

pub mod auth;
pub mod config;
pub mod error;
pub mod ses;
pub mod ses_http;
pub mod sigv4;

pub use config::{AwsBaseConfig, AwsCredentials, SesConfig};
pub use error::AwsProviderError;
pub use ses::{RawEmail, SendOptions, SesClient};
pub use ses_http::{SesHttpClient, SesHttpResponse};
