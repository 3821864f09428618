use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::oneshot;
use tracing::{info, warn};

use mailwire_gateway::{LoggingHook, Mailer};
use mailwire_server::api::{self, AppState};
use mailwire_server::config::MailwireConfig;

/// Mailwire HTTP server.
#[derive(Parser, Debug)]
#[command(name = "mailwire-server", about = "HTTP endpoint for sending email through Mailwire")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "mailwire.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    // Missing config file means defaults.
    let config_found = Path::new(&cli.config).exists();
    let mut config: MailwireConfig = if config_found {
        let contents = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&contents)?
    } else {
        MailwireConfig::default()
    };

    mailwire_server::telemetry::init(&config.telemetry)?;
    if !config_found {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    config.resolve_secrets()?;

    let mailer = Mailer::builder()
        .config(config.mailer.clone())
        .hook(Arc::new(LoggingHook))
        .build()?;
    info!(
        driver = %mailer.driver(),
        runtime = %mailer.runtime(),
        "mailer initialized"
    );

    let state = AppState::from_config(Arc::new(mailer), &config);
    match &state.send_route {
        Some(route) => info!(
            route = %route,
            captcha = state.captcha.is_some(),
            rate_limit = state.rate_limiter.is_some(),
            "send endpoint enabled"
        ),
        None => info!("send endpoint disabled"),
    }
    let app = api::router(state);

    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "mailwire-server listening");

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = stop_rx.await;
        })
        .await
    });

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        () = shutdown_signal() => {}
    }

    // In-flight requests get the configured drain window.
    let _ = stop_tx.send(());
    let drain = Duration::from_secs(config.server.shutdown_timeout_seconds);
    match tokio::time::timeout(drain, &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            warn!(
                timeout_secs = config.server.shutdown_timeout_seconds,
                "shutdown timeout exceeded, dropping in-flight requests"
            );
            server.abort();
        }
    }

    info!("mailwire-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
