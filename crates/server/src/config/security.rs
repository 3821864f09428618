use serde::Deserialize;

/// Protection applied to the send endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub captcha: CaptchaConfig,
    #[serde(default)]
    pub rate_limiter: RateLimiterConfig,
    #[serde(default)]
    pub cors: CorsConfig,
}

/// Captcha verification settings.
///
/// Provider and secret are checked per request, so a broken setup answers
/// 400 with the offending field rather than failing startup.
#[derive(Clone, Default, Deserialize)]
pub struct CaptchaConfig {
    #[serde(default)]
    pub enabled: bool,
    /// `turnstile`, `recaptcha` or `hcaptcha`.
    pub provider: Option<String>,
    /// Provider secret. Supports `env:NAME`.
    pub secret_key: Option<String>,
    /// Replaces the provider's verification URL.
    pub verify_url: Option<String>,
}

impl std::fmt::Debug for CaptchaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptchaConfig")
            .field("enabled", &self.enabled)
            .field("provider", &self.provider)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("verify_url", &self.verify_url)
            .finish()
    }
}

/// Per-client token bucket on the send endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimiterConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Requests allowed per interval.
    #[serde(default = "default_tokens")]
    pub tokens_per_interval: u32,
    /// Interval after which the bucket is full again.
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            tokens_per_interval: default_tokens(),
            interval_ms: default_interval(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_tokens() -> u32 {
    2
}

fn default_interval() -> u64 {
    3_000_000
}

/// Cross-origin policy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins. Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// Allowed methods. Empty allows `POST` and `OPTIONS`.
    #[serde(default)]
    pub allowed_methods: Vec<String>,
}
