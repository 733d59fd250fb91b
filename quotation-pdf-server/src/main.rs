use std::{net::SocketAddr, sync::Arc};

use quotation_pdf::{start_chromedriver, Exporter};
use quotation_pdf_server::{app, AppState, ServerConfig};
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    let mut chromedriver = None;
    if config.spawn_chromedriver {
        chromedriver = Some(start_chromedriver(config.chromedriver_port).map_err(|e| {
            tracing::error!("Failed to start chromedriver: {}", e);
            std::io::Error::other(format!("Chromedriver error: {}", e))
        })?);
        tracing::info!(port = config.chromedriver_port, "chromedriver started");
    }

    let state = AppState {
        exporter: Arc::new(Exporter::new(config.export_config())),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
        e
    })?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let result = axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(mut child) = chromedriver {
        if let Err(e) = child.kill() {
            tracing::warn!("Failed to stop chromedriver: {}", e);
        }
    }

    result
}
