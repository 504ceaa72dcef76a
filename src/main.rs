use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use hr_backend::api;
use hr_backend::app_state::AppState;
use hr_backend::config::Config;
use hr_backend::db::postgres::{create_pool, PgRequestStore, PgUserDirectory};
use hr_backend::db::store::{InMemoryDirectory, InMemoryStore, RequestStore, UserDirectory};
use hr_backend::ws::dispatcher::SessionRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    Config::init();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hr_backend=info,tower_http=info")),
        )
        .init();

    let config = Config::get();

    let (store, users): (Arc<dyn RequestStore>, Arc<dyn UserDirectory>) =
        match &config.database_url {
            Some(database_url) => {
                let pool = create_pool(database_url)
                    .await
                    .context("failed to connect to the database")?;
                tracing::info!("connected to PostgreSQL");
                (
                    Arc::new(PgRequestStore::new(pool.clone())),
                    Arc::new(PgUserDirectory::new(pool)),
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set, running on the in-memory store");
                (
                    Arc::new(InMemoryStore::new()),
                    Arc::new(InMemoryDirectory::default()),
                )
            }
        };

    let registry = Arc::new(SessionRegistry::new());
    let state = AppState::new(store, users, registry);
    let app = api::app(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("server running at http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    signal::ctrl_c().await.expect("failed to listen for Ctrl+C");
    tracing::info!("received Ctrl+C, shutting down");
}
