mod security;
mod server;
mod telemetry;

#[cfg(test)]
mod tests;

pub use security::*;
pub use server::*;
pub use telemetry::*;

use mailwire_gateway::MailerConfig;
use serde::Deserialize;

/// Prefix marking a value to be read from the environment at startup.
pub const ENV_PREFIX: &str = "env:";

/// Top-level configuration for the Mailwire server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct MailwireConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Driver, transport settings and envelope defaults.
    #[serde(default)]
    pub mailer: MailerConfig,
    /// The send endpoint.
    #[serde(default)]
    pub server_api: ServerApiConfig,
    /// Captcha, rate limiting and CORS for the send endpoint.
    #[serde(default)]
    pub security: SecurityConfig,
    /// Log output configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl MailwireConfig {
    /// Replace every `env:NAME` secret with the value of `NAME`.
    pub fn resolve_secrets(&mut self) -> Result<(), String> {
        self.resolve_secrets_with(|name| std::env::var(name).ok())
    }

    /// Same as [`resolve_secrets`](Self::resolve_secrets) with an injectable lookup.
    pub fn resolve_secrets_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), String> {
        let smtp = &mut self.mailer.smtp;
        if let Some(auth) = &mut smtp.auth {
            resolve(&mut auth.pass, &lookup)?;
        }
        if let Some(credentials) = &mut smtp.credentials {
            resolve(&mut credentials.password, &lookup)?;
        }

        if let Some(ses) = &mut self.mailer.ses {
            let client = &mut ses.client;
            for value in [&mut client.secret_access_key, &mut client.session_token]
                .into_iter()
                .flatten()
            {
                resolve(value, &lookup)?;
            }
            if let Some(credentials) = &mut client.credentials {
                resolve(&mut credentials.secret_access_key, &lookup)?;
                if let Some(token) = &mut credentials.session_token {
                    resolve(token, &lookup)?;
                }
            }
        }

        if let Some(secret) = &mut self.security.captcha.secret_key {
            resolve(secret, &lookup)?;
        }
        Ok(())
    }
}

fn resolve(value: &mut String, lookup: &impl Fn(&str) -> Option<String>) -> Result<(), String> {
    if let Some(name) = value.strip_prefix(ENV_PREFIX) {
        *value = lookup(name).ok_or_else(|| format!("environment variable {name} is not set"))?;
    }
    Ok(())
}
