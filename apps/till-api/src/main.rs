//! # Till API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Till API Server                                │
//! │                                                                         │
//! │  Web till / back office ───► HTTP (5000) ───► Routes ───► till-db      │
//! │                                                              │          │
//! │                                                              ▼          │
//! │                                                         SQLite (WAL)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Startup: logging → config → database + migrations → admin bootstrap →
//! serve until Ctrl+C / SIGTERM → close pool.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use till_api::bootstrap::ensure_admin;
use till_api::{router, ApiConfig, AppState};
use till_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,till_api=debug,till_db=debug")),
        )
        .with_target(true)
        .init();

    info!("Starting Till API server...");

    let config = ApiConfig::load().context("failed to load configuration")?;
    info!(
        port = config.port,
        database = %config.database_path,
        "Configuration loaded"
    );

    let db = Database::new(config.db_config())
        .await
        .context("failed to open database")?;
    info!("Database ready");

    ensure_admin(&db, &config)
        .await
        .map_err(|e| anyhow::anyhow!("failed to create admin account: {e}"))?;

    let state = AppState::new(db.clone(), &config);
    let app = router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
