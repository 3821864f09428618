pub mod builder;
pub mod config;
pub mod hooks;
pub mod mailer;
pub mod metrics;
pub mod selection;

pub use builder::MailerBuilder;
pub use config::MailerConfig;
pub use hooks::{HookError, LoggingHook, MailHook};
pub use mailer::Mailer;
pub use metrics::{MailerMetrics, MetricsSnapshot};
pub use selection::select_backend;
