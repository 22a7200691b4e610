//! Batch ledger
//!
//! Durable record of load attempts in `staging.load_batches`, one row per
//! file-load attempt. The ledger is the single source of idempotence truth:
//! a file name with a completed row is never loaded again, and a partial
//! unique index on `(file_pattern) WHERE status = 'completed'` makes that
//! hold even across concurrently running loader processes.
//!
//! Failed attempts are durable too: the in-transaction batch row is lost
//! with the data rollback, so [`record_failed`] writes a fresh row in its
//! own transaction afterwards. Any number of failed rows may accumulate per
//! file name; only a completed row blocks a retry.

use chrono::{DateTime, Utc};
use claims_common::{Fingerprint, Result};
use sqlx::postgres::PgConnection;
use sqlx::PgPool;

use crate::entity::SeedFile;

/// Check whether a completed batch already exists for this file name.
pub async fn is_already_completed(pool: &PgPool, file_name: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(
             SELECT 1 FROM staging.load_batches
             WHERE file_pattern = $1 AND status = 'completed'
         )",
    )
    .bind(file_name)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Insert a new ledger row in the running state and return its `load_id`.
///
/// Must be called on the same transaction that performs the ingestion and
/// the terminal update, so a rollback discards the row together with any
/// partially streamed data.
pub async fn begin_batch(
    conn: &mut PgConnection,
    file: &SeedFile,
    fingerprint: &Fingerprint,
) -> Result<i64> {
    let load_id: i64 = sqlx::query_scalar(
        "INSERT INTO staging.load_batches
             (source_name, description, file_pattern,
              file_size_bytes, file_sha256, source_row_count)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING load_id",
    )
    .bind(file.entity.name())
    .bind(format!("Load {} (timestamp: {})", file.file_name, file.timestamp))
    .bind(&file.file_name)
    .bind(fingerprint.size_bytes)
    .bind(&fingerprint.sha256_hex)
    .bind(fingerprint.data_row_count)
    .fetch_one(&mut *conn)
    .await?;
    Ok(load_id)
}

/// Mark a batch completed with the row count actually streamed. Terminal.
///
/// The partial unique index fires here if another process completed a batch
/// for the same file name first; the caller's transaction then rolls back,
/// undoing the duplicate staging rows.
pub async fn complete_batch(conn: &mut PgConnection, load_id: i64, row_count: i64) -> Result<()> {
    sqlx::query(
        "UPDATE staging.load_batches
         SET status = 'completed', row_count = $2, completed_at = now()
         WHERE load_id = $1",
    )
    .bind(load_id)
    .bind(row_count)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Record a failed attempt in its own transaction, after the data
/// transaction has rolled back. No row count is recorded; the streamed
/// output was discarded by the rollback.
pub async fn record_failed(
    pool: &PgPool,
    file: &SeedFile,
    fingerprint: &Fingerprint,
) -> Result<i64> {
    let load_id: i64 = sqlx::query_scalar(
        "INSERT INTO staging.load_batches
             (source_name, description, file_pattern,
              file_size_bytes, file_sha256, source_row_count,
              status, completed_at)
         VALUES ($1, $2, $3, $4, $5, $6, 'failed', now())
         RETURNING load_id",
    )
    .bind(file.entity.name())
    .bind(format!("Load {} (timestamp: {})", file.file_name, file.timestamp))
    .bind(&file.file_name)
    .bind(fingerprint.size_bytes)
    .bind(&fingerprint.sha256_hex)
    .bind(fingerprint.data_row_count)
    .fetch_one(pool)
    .await?;
    Ok(load_id)
}

/// One ledger row, as reported by the `status` subcommand.
#[derive(Debug, sqlx::FromRow)]
pub struct BatchRow {
    pub load_id: i64,
    pub source_name: String,
    pub file_pattern: String,
    pub status: String,
    pub source_row_count: i64,
    pub row_count: Option<i64>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Most recent load attempts, newest first.
pub async fn recent_batches(pool: &PgPool, limit: i64) -> Result<Vec<BatchRow>> {
    let rows = sqlx::query_as::<_, BatchRow>(
        "SELECT load_id, source_name, file_pattern, status,
                source_row_count, row_count, started_at, completed_at
         FROM staging.load_batches
         ORDER BY load_id DESC
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
