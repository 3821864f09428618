use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{user, pass}` authentication, the native SMTP convention.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpAuth {
    pub user: String,
    pub pass: String,
}

impl std::fmt::Debug for SmtpAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpAuth")
            .field("user", &self.user)
            .field("pass", &"[REDACTED]")
            .finish()
    }
}

/// `{username, password}` credentials, the edge socket convention.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl From<&SmtpAuth> for SmtpCredentials {
    fn from(auth: &SmtpAuth) -> Self {
        Self {
            username: auth.user.clone(),
            password: auth.pass.clone(),
        }
    }
}

impl From<&SmtpCredentials> for SmtpAuth {
    fn from(creds: &SmtpCredentials) -> Self {
        Self {
            user: creds.username.clone(),
            pass: creds.password.clone(),
        }
    }
}

/// SMTP settings as configured, accepting either credential convention.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    pub host: String,

    /// SMTP server port. Defaults to 2525.
    pub port: u16,

    /// Implicit TLS from the first byte. When `false`, STARTTLS is used if
    /// the server offers it.
    pub secure: bool,

    /// Never upgrade to TLS, even when the server offers STARTTLS.
    pub ignore_tls: bool,

    /// Connection timeout in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<SmtpAuth>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<SmtpCredentials>,

    /// Settings this crate does not interpret, kept for the edge connector.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("ignore_tls", &self.ignore_tls)
            .field("timeout_ms", &self.timeout_ms)
            .field("auth", &self.auth)
            .field("credentials", &self.credentials)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 2525,
            secure: false,
            ignore_tls: false,
            timeout_ms: None,
            auth: None,
            credentials: None,
            extra: Map::new(),
        }
    }
}

impl SmtpConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_auth(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.auth = Some(SmtpAuth {
            user: user.into(),
            pass: pass.into(),
        });
        self
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(SmtpCredentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults() {
        let config = SmtpConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 2525);
        assert!(!config.secure);
        assert!(config.auth.is_none());
    }

    #[test]
    fn debug_redacts_passwords() {
        let config = SmtpConfig::new("smtp.x.com", 587)
            .with_auth("u", "hunter2")
            .with_credentials("u", "hunter3");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("hunter3"));
    }

    #[test]
    fn unknown_keys_are_kept() {
        let config: SmtpConfig = serde_json::from_value(json!({
            "host": "smtp.x.com",
            "pool": true
        }))
        .unwrap();
        assert_eq!(config.port, 2525);
        assert_eq!(config.extra["pool"], true);
    }
}
