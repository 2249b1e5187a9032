//! Monthly partitions of the `orders` table
//!
//! Each partition covers one UTC calendar month of `created_at` (Unix ms)
//! and is named `orders_yYYYYmMM`. Inserting an order whose month has no
//! partition fails, so partitions are created ahead of time.

use chrono::{TimeZone, Utc};
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("Invalid partition month {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One month's partition bounds, `[from_ms, to_ms)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthPartition {
    pub name: String,
    pub from_ms: i64,
    pub to_ms: i64,
}

fn month_start(year: i32, month: u32) -> Option<i64> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .map(|dt| dt.timestamp_millis())
}

/// Month `offset` months after `(year, month)`
pub fn add_months(year: i32, month: u32, offset: u32) -> (i32, u32) {
    let index = i64::from(year) * 12 + i64::from(month) - 1 + i64::from(offset);
    ((index / 12) as i32, (index % 12) as u32 + 1)
}

impl MonthPartition {
    pub fn new(year: i32, month: u32) -> Result<Self, PartitionError> {
        let invalid = || PartitionError::InvalidMonth { year, month };
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        let (next_year, next_month) = add_months(year, month, 1);
        let from_ms = month_start(year, month).ok_or_else(invalid)?;
        let to_ms = month_start(next_year, next_month).ok_or_else(invalid)?;
        Ok(Self {
            name: format!("orders_y{year:04}m{month:02}"),
            from_ms,
            to_ms,
        })
    }

    pub fn contains(&self, created_at: i64) -> bool {
        (self.from_ms..self.to_ms).contains(&created_at)
    }
}

/// Create the partition for `(year, month)` if it does not exist
pub async fn ensure_month_partition(
    pool: &PgPool,
    year: i32,
    month: u32,
) -> Result<MonthPartition, PartitionError> {
    let partition = MonthPartition::new(year, month)?;
    // Identifiers and bounds are generated, never user input
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {} PARTITION OF orders FOR VALUES FROM ({}) TO ({})",
        partition.name, partition.from_ms, partition.to_ms
    );
    sqlx::query(&sql).execute(pool).await?;
    Ok(partition)
}

/// Ensure the month containing `now_ms` and the next `months_ahead` months
pub async fn ensure_partitions_ahead(
    pool: &PgPool,
    now_ms: i64,
    months_ahead: u32,
) -> Result<Vec<MonthPartition>, PartitionError> {
    let (year, month) =
        shared::util::year_month(now_ms).ok_or(PartitionError::InvalidMonth { year: 0, month: 0 })?;

    let mut ensured = Vec::with_capacity(months_ahead as usize + 1);
    for offset in 0..=months_ahead {
        let (y, m) = add_months(year, month, offset);
        let partition = ensure_month_partition(pool, y, m).await?;
        tracing::debug!(partition = %partition.name, "Order partition ensured");
        ensured.push(partition);
    }
    Ok(ensured)
}
