use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod error;
mod extract;
mod games;
mod handlers;
#[cfg(test)]
mod memory;
mod models;
mod rating;
mod reviews;
mod routes;
mod state;
mod store;
mod types;

use crate::config::Config;
use crate::db::PgStore;
use crate::routes::create_routes;
use crate::state::AppState;
use crate::store::CatalogStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let store = PgStore::connect(&config.database_url, config.database_max_connections).await?;
    if config.run_migrations {
        store.migrate().await?;
        info!("Database migrations applied");
    }

    match store.ping().await {
        Ok(()) => info!("Database connection verified"),
        Err(e) => warn!(error = %e, "Database health check failed"),
    }

    let address = config.bind_address();
    let state = AppState::new(config, Arc::new(store));
    let app = create_routes(state);

    let listener = TcpListener::bind(&address).await?;
    info!("HTTP API server listening on http://{}", address);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server finished");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
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
}
