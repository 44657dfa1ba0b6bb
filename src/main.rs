use std::sync::Arc;

use anyhow::Result;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hydrosense_service::{
    api,
    config::{Config, IdentityBackend, StoreBackend},
    db::{self, MemoryReadingStore, PgReadingStore, ReadingStore},
    identity::{HttpIdentityClient, IdentityProvider, StaticIdentityProvider},
    readings::ReadingService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present; env vars may also be set externally
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    init_tracing(config.log_json);

    let store: Arc<dyn ReadingStore> = match &config.store {
        StoreBackend::Postgres { database_url, max_connections } => {
            let pool = db::create_pool(database_url, *max_connections).await?;
            db::run_migrations(&pool).await?;
            info!(app_key = %config.app_key, "Database ready");
            Arc::new(PgReadingStore::new(pool, config.app_key.clone()))
        }
        StoreBackend::Memory => {
            info!(app_key = %config.app_key, "Using in-memory reading store");
            Arc::new(MemoryReadingStore::new(config.app_key.clone()))
        }
    };

    let identity: Arc<dyn IdentityProvider> = match &config.identity {
        IdentityBackend::Http { base_url, project_id, access_token, timeout } => {
            info!(base_url = %base_url, project_id = %project_id, "Using HTTP identity provider");
            Arc::new(HttpIdentityClient::new(base_url, project_id, access_token, *timeout)?)
        }
        IdentityBackend::Static { uids } => {
            info!(count = uids.len(), "Using static identity allow-list");
            Arc::new(StaticIdentityProvider::new(uids.iter().cloned()))
        }
    };

    let service = ReadingService::new(store, identity, config.service_options());

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, api::router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hydrosense_service=info"));

    if log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
