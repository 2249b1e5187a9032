//! tiffin-cloud maintenance daemon
//!
//! Long-running process that:
//! - Applies migrations and keeps monthly order partitions ahead of time
//! - Drains the lifecycle event channel into Postgres
//! - Purges expired code hashes and rate-limit counters

use std::time::Duration;

use tiffin_cloud::orders::ensure_partitions_ahead;
use tiffin_cloud::{AppState, Config};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const TTL_PURGE_INTERVAL: Duration = Duration::from_secs(60);
const PARTITION_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiffin_cloud=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting tiffin-cloud (env: {})", config.environment);

    let state = AppState::new(&config).await?;

    let mut purge = tokio::time::interval(TTL_PURGE_INTERVAL);
    let mut partitions = tokio::time::interval(PARTITION_INTERVAL);
    // First tick of each interval fires immediately; partitions were just ensured
    partitions.tick().await;

    loop {
        tokio::select! {
            _ = purge.tick() => {
                match state.ttl_store.purge_expired().await {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!(purged = n, "Expired TTL entries removed"),
                    Err(e) => tracing::error!(error = %e, "TTL purge failed"),
                }
            }
            _ = partitions.tick() => {
                if let Err(e) = ensure_partitions_ahead(
                    &state.pool,
                    shared::util::now_millis(),
                    config.partition_months_ahead,
                )
                .await
                {
                    tracing::error!(error = %e, "Partition maintenance failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    state.pool.close().await;
    Ok(())
}
