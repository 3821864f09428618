use serde::Deserialize;

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum time to wait for in-flight requests after a shutdown signal.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}

/// The mail send endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerApiConfig {
    /// Whether the endpoint is mounted. Off by default.
    #[serde(default)]
    pub enabled: bool,
    /// Path of the endpoint.
    #[serde(default = "default_route")]
    pub route: String,
}

impl Default for ServerApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            route: default_route(),
        }
    }
}

fn default_route() -> String {
    "/api/mail/send".to_owned()
}
