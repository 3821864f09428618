pub mod config;
pub mod environment;
pub mod mime;
pub mod ses;
pub mod ses_edge;
pub mod smtp;
pub mod smtp_edge;
pub mod stream;
pub mod translate;

pub use config::{SmtpAuth, SmtpConfig, SmtpCredentials};
pub use environment::{detect_runtime, detect_runtime_with};
pub use ses::SesTransport;
pub use ses_edge::SesEdgeTransport;
pub use smtp::SmtpTransport;
pub use smtp_edge::{EdgeSmtpConnector, SmtpEdgeTransport};
pub use stream::StreamTransport;
