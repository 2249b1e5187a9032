//! Application state for tiffin-cloud

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::SessionIssuer;
use crate::config::{Config, TtlBackend};
use crate::events::{EventLog, EventWorker, PgEventStorage};
use crate::orders::{OrderCodeGenerator, OrderLifecycle, PgOrderStore, ensure_partitions_ahead};
use crate::otp::{OtpHasher, OtpManager};
use crate::ttl::{MemoryTtlStore, PgTtlStore, TtlStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Code hashes and rate-limit counters
    pub ttl_store: Arc<dyn TtlStore>,
    /// One-time code issue/verify
    pub otp: Arc<OtpManager>,
    /// Order state machine
    pub orders: Arc<OrderLifecycle>,
    /// Login code → session token
    pub sessions: Arc<SessionIssuer>,
    /// Lifecycle audit trail
    pub events: EventLog,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState
    ///
    /// Connects, migrates, makes sure order partitions exist and starts the
    /// lifecycle event worker.
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let partitions =
            ensure_partitions_ahead(&pool, shared::util::now_millis(), config.partition_months_ahead)
                .await?;
        tracing::info!(count = partitions.len(), "Order partitions ready");

        let ttl_store: Arc<dyn TtlStore> = match config.ttl_backend {
            TtlBackend::Postgres => Arc::new(PgTtlStore::new(pool.clone())),
            TtlBackend::Memory => {
                tracing::warn!("Using in-memory TTL store; codes and counters are per-process");
                Arc::new(MemoryTtlStore::new())
            }
        };

        let otp = Arc::new(OtpManager::new(
            ttl_store.clone(),
            OtpHasher::new(config.otp_secret.as_bytes()),
            config.otp_policy(),
            config.store_timeout,
        ));

        let event_storage = Arc::new(PgEventStorage::new(pool.clone()));
        let (events, rx) = EventLog::new(event_storage.clone(), config.event_buffer_size);
        tokio::spawn(EventWorker::new(event_storage).run(rx));

        let orders = Arc::new(OrderLifecycle::new(
            Arc::new(PgOrderStore::new(pool.clone())),
            otp.clone(),
            OrderCodeGenerator::new(config.order_code_prefix.clone())?,
            events.clone(),
            config.store_timeout,
        ));

        let sessions = Arc::new(SessionIssuer::new(
            otp.clone(),
            &config.jwt_secret,
            config.session_ttl_hours,
        ));

        Ok(Self {
            pool,
            ttl_store,
            otp,
            orders,
            sessions,
            events,
            config: config.clone(),
        })
    }
}
