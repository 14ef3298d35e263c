mod config;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use strata_gateway::{GatewayConfig, GatewayState, RpcHttpClient, routes};
use strata_store::CacheStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = config::Config::from_env()?;
    // Secondary mode: the sync process keeps the primary instance, any
    // number of gateways attach read-only alongside it.
    let store = Arc::new(CacheStore::open_secondary(
        &config.db_path,
        &config.db_scratch_path,
    )?);
    let node = Arc::new(RpcHttpClient::new(&config.rpc_endpoint, config.credentials()));

    info!(
        rpc = %config.rpc_endpoint,
        bind = %config.bind_addr,
        db = %config.db_path,
        "Starting strata-api"
    );

    let gateway = GatewayConfig {
        coin: config.coin.clone(),
        ..GatewayConfig::default()
    };
    let state = GatewayState { store, node, config: Arc::new(gateway) };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Gateway listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
