pub mod address;
pub mod backend;
pub mod envelope;
pub mod merge;
pub mod result;
pub mod validate;

pub use address::{
    Address, Mailbox, OneOrMany, Recipients, to_formatted_list, to_formatted_string,
    to_single_formatted, to_single_structured, to_structured, to_structured_list,
};
pub use backend::{BackendKind, Driver, Runtime, UnknownDriver};
pub use envelope::EmailEnvelope;
pub use merge::{deep_merge, merge_maps};
pub use result::{SendEnvelope, SendResult};
pub use validate::{
    EnvelopeSchema, MISSING_FROM, MISSING_RECIPIENT, ValidationIssue, decode_envelope,
    validate_envelope,
};
