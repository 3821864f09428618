pub mod health;
pub mod send;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{HeaderValue, Method, header};
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use mailwire_gateway::Mailer;

use crate::captcha::CaptchaVerifier;
use crate::config::{CorsConfig, MailwireConfig};
use crate::ratelimit::{self, RateLimiter};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The mailer every send goes through.
    pub mailer: Arc<Mailer>,
    /// Captcha verifier (None when captcha is disabled).
    pub captcha: Option<Arc<CaptchaVerifier>>,
    /// Per-client limiter on the send route (None when disabled).
    pub rate_limiter: Option<Arc<RateLimiter>>,
    /// Path of the send endpoint (None when the endpoint is disabled).
    pub send_route: Option<String>,
    pub cors: CorsConfig,
}

impl AppState {
    /// State with the send endpoint at its default path and no protection.
    pub fn new(mailer: Arc<Mailer>) -> Self {
        Self {
            mailer,
            captcha: None,
            rate_limiter: None,
            send_route: Some("/api/mail/send".to_owned()),
            cors: CorsConfig::default(),
        }
    }

    /// Wire the endpoint and its protection from configuration.
    pub fn from_config(mailer: Arc<Mailer>, config: &MailwireConfig) -> Self {
        let security = &config.security;
        Self {
            mailer,
            captcha: security
                .captcha
                .enabled
                .then(|| Arc::new(CaptchaVerifier::new(security.captcha.clone()))),
            rate_limiter: security
                .rate_limiter
                .enabled
                .then(|| Arc::new(RateLimiter::new(&security.rate_limiter))),
            send_route: config
                .server_api
                .enabled
                .then(|| config.server_api.route.clone()),
            cors: security.cors.clone(),
        }
    }

    #[must_use]
    pub fn with_captcha(mut self, verifier: CaptchaVerifier) -> Self {
        self.captcha = Some(Arc::new(verifier));
        self
    }

    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(Arc::new(limiter));
        self
    }

    #[must_use]
    pub fn with_send_route(mut self, route: Option<String>) -> Self {
        self.send_route = route;
        self
    }
}

/// Build the Axum router: health check plus the send endpoint when enabled.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new().route("/health", get(health::health));

    if let Some(route) = &state.send_route {
        let mut send_route = post(send::send);
        if let Some(limiter) = &state.rate_limiter {
            send_route = send_route.route_layer(middleware::from_fn_with_state(
                Arc::clone(limiter),
                ratelimit::enforce,
            ));
        }
        router = router.route(route, send_route);
    }

    let cors = cors_layer(&state.cors);
    router
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let methods: Vec<Method> = if config.allowed_methods.is_empty() {
        vec![Method::POST, Method::OPTIONS]
    } else {
        config
            .allowed_methods
            .iter()
            .filter_map(|m| {
                Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                    .inspect_err(|_| warn!(method = %m, "ignoring invalid CORS method"))
                    .ok()
            })
            .collect()
    };

    let origin = if config.allowed_origins.is_empty() || config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(config.allowed_origins.iter().filter_map(|o| {
            HeaderValue::from_str(o)
                .inspect_err(|_| warn!(origin = %o, "ignoring invalid CORS origin"))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE])
}

/// Caller address: the first `X-Forwarded-For` hop, then `X-Real-IP`,
/// then the socket peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_ip = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };
        let peer = || {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        };

        Ok(Self(
            header_ip("x-forwarded-for")
                .or_else(|| header_ip("x-real-ip"))
                .or_else(peer),
        ))
    }
}
