//! Plated account server.
//!
//! Serves registration, login and role-dashboard routing over JSON, backed
//! by `PostgreSQL` for accounts and sessions.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower_sessions_sqlx_store::PostgresStore;

use plated_server::config::ServerConfig;
use plated_server::db::{PgAccountStore, create_pool};
use plated_server::state::AppState;
use plated_server::telemetry;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("plated-server: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _telemetry = telemetry::init(&config);

    if let Err(e) = serve(config).await {
        tracing::error!(error = %e, "Server stopped");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// Connect to the database and serve until a shutdown signal arrives.
///
/// Migrations are applied separately with `plated-cli migrate`.
async fn serve(config: ServerConfig) -> Result<(), BoxError> {
    let pool = create_pool(&config.database_url).await?;
    let sessions = PostgresStore::new(pool.clone());
    let accounts = Arc::new(PgAccountStore::new(pool));

    let addr = config.socket_addr();
    let app = plated_server::app(AppState::new(config, accounts), sessions);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    // ConnectInfo is the rate limiter's fallback client key
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown())
    .await?;

    tracing::info!("Shut down cleanly");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Cannot install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {},
        () = terminate => {},
    }

    tracing::info!("Draining connections");
}
