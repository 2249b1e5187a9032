use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{Counter, TtlResult, TtlStore};
use crate::util::now_millis;

/// TTL store backed by the UNLOGGED `ttl_entries` table
///
/// Expiry is stored as Unix milliseconds and enforced in every query, so an
/// expired row is invisible even before `purge_expired` removes it.
#[derive(Clone)]
pub struct PgTtlStore {
    pool: PgPool,
}

impl PgTtlStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

#[async_trait]
impl TtlStore for PgTtlStore {
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> TtlResult<()> {
        let expires_at = now_millis().saturating_add(ttl_millis(ttl));
        sqlx::query(
            "INSERT INTO ttl_entries (key, value, counter, expires_at)
             VALUES ($1, $2, 0, $3)
             ON CONFLICT (key) DO UPDATE SET
                value = $2, counter = 0, expires_at = $3",
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> TtlResult<Option<Vec<u8>>> {
        let row: Option<(Option<Vec<u8>>,)> =
            sqlx::query_as("SELECT value FROM ttl_entries WHERE key = $1 AND expires_at > $2")
                .bind(key)
                .bind(now_millis())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(|(v,)| v))
    }

    async fn delete(&self, key: &str) -> TtlResult<bool> {
        let result = sqlx::query("DELETE FROM ttl_entries WHERE key = $1 AND expires_at > $2")
            .bind(key)
            .bind(now_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_if_eq(&self, key: &str, expected: &[u8]) -> TtlResult<bool> {
        let result = sqlx::query(
            "DELETE FROM ttl_entries WHERE key = $1 AND value = $2 AND expires_at > $3",
        )
        .bind(key)
        .bind(expected)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn incr(&self, key: &str, ttl: Duration) -> TtlResult<Counter> {
        let now = now_millis();
        let (count, expires_at): (i64, i64) = sqlx::query_as(
            "INSERT INTO ttl_entries (key, value, counter, expires_at)
             VALUES ($1, NULL, 1, $2)
             ON CONFLICT (key) DO UPDATE SET
                counter = CASE WHEN ttl_entries.expires_at <= $3 THEN 1
                               ELSE ttl_entries.counter + 1 END,
                expires_at = CASE WHEN ttl_entries.expires_at <= $3 THEN EXCLUDED.expires_at
                                  ELSE ttl_entries.expires_at END
             RETURNING counter, expires_at",
        )
        .bind(key)
        .bind(now.saturating_add(ttl_millis(ttl)))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(Counter {
            count: u64::try_from(count).unwrap_or(0),
            expires_in: Duration::from_millis(u64::try_from(expires_at - now).unwrap_or(0)),
        })
    }

    async fn purge_expired(&self) -> TtlResult<u64> {
        let result = sqlx::query("DELETE FROM ttl_entries WHERE expires_at <= $1")
            .bind(now_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
