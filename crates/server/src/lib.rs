pub mod api;
pub mod captcha;
pub mod config;
pub mod error;
pub mod ratelimit;
pub mod telemetry;
