pub mod error;
pub mod transport;

pub use error::MailError;
pub use transport::{DynMailTransport, MailTransport};
