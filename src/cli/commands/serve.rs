use anyhow::Context;
use sqlx_adapter::SqlxAdapter;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::app::{self, AppState};
use crate::authz::PolicyStore;
use crate::config::AppConfig;
use crate::database::{manager, PgStore};

/// Connections reserved for the policy adapter, separate from the main pool.
const POLICY_POOL_SIZE: u32 = 4;

pub async fn handle(config: AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    let pool = manager::connect(&config.database).await?;
    manager::migrate(&pool).await?;

    let adapter = SqlxAdapter::new(config.database.url.clone(), POLICY_POOL_SIZE).await?;
    let policies = PolicyStore::open(adapter).await?;
    policies.bootstrap().await?;
    info!(event = "AUTHORIZATION-POLICY-LOADED");

    let address = format!("{}:{}", config.server.host, port.unwrap_or(config.server.port));
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!(event = "SERVER-STARTED", address = %address, environment = ?config.environment);

    let state = AppState::new(config, Arc::new(PgStore::new(pool)), policies);
    app::serve(listener, state).await?;
    Ok(())
}
