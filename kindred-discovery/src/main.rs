use std::sync::Arc;

use kindred_discovery::config::{AppConfig, StoreBackend};
use kindred_discovery::store::{MemoryStore, PgStore};
use kindred_discovery::{build_router, AppState};
use kindred_shared::clients::db::create_pool;
use kindred_shared::middleware::{init_metrics, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("kindred-discovery");

    let config = AppConfig::load()?;
    let metrics_handle = Some(init_metrics()?);
    let addr = format!("0.0.0.0:{}", config.port);

    let app = match config.store {
        StoreBackend::Postgres => {
            let pool = create_pool(&config.database_url, config.db_pool_size)?;
            let store = PgStore::new(pool);
            build_router(Arc::new(AppState { store, config, metrics_handle }))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; data will not survive a restart");
            let store = MemoryStore::new();
            build_router(Arc::new(AppState { store, config, metrics_handle }))
        }
    };

    tracing::info!(addr = %addr, "kindred-discovery starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
