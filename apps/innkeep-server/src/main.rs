//! innkeep-server binary.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use innkeep_db::{Database, DbConfig};
use innkeep_server::{init_tracing, router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting innkeep server...");

    let config = ServerConfig::load().context("loading configuration")?;
    info!(
        port = config.http_port,
        db_path = %config.db_path,
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("INNKEEP_JWT_SECRET not set, using the development secret");
    }

    let db = Database::new(DbConfig::new(&config.db_path).max_connections(config.db_max_connections))
        .await
        .context("opening database")?;
    info!("Database ready");

    let addr = config.socket_addr()?;
    let app = router(AppState::from_config(db.clone(), &config));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
