//! Bulk ingestion
//!
//! Streams the data rows of a seed CSV into its staging table through the
//! PostgreSQL COPY protocol, appending the batch's `load_id` as a trailing
//! field on every row. The file header must match the entity's expected
//! column list exactly, in order; anything else fails the file before a
//! single row is sent. No heuristic header detection.

use claims_common::{Result, StageError};
use sqlx::postgres::PgConnection;
use tracing::warn;

use crate::entity::{Entity, SeedFile};

/// Bytes buffered between COPY sends.
const COPY_CHUNK_BYTES: usize = 64 * 1024;

/// Stream every data row of `file` into its staging table, tagged with
/// `load_id`. Returns the number of rows the server accepted.
///
/// Runs on the caller's transaction: a rollback discards everything
/// streamed here.
pub async fn copy_seed_file(
    conn: &mut PgConnection,
    file: &SeedFile,
    load_id: i64,
) -> Result<u64> {
    let mut reader = csv::Reader::from_path(&file.path)?;
    let headers = reader.headers()?.clone();
    validate_header(&file.file_name, &headers, file.entity.columns())?;

    let statement = copy_statement(file.entity);
    let mut copy = conn.copy_in_raw(&statement).await?;

    let mut buf: Vec<u8> = Vec::with_capacity(2 * COPY_CHUNK_BYTES);
    let mut rows: u64 = 0;

    for record in reader.into_records() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                copy.abort("malformed CSV record").await?;
                return Err(err.into());
            },
        };
        if let Err(err) = write_record(&mut buf, &record, load_id) {
            copy.abort("record encoding failed").await?;
            return Err(err);
        }
        rows += 1;

        if buf.len() >= COPY_CHUNK_BYTES {
            copy.send(buf.as_slice()).await?;
            buf.clear();
        }
    }

    if !buf.is_empty() {
        copy.send(buf.as_slice()).await?;
    }

    let copied = copy.finish().await?;
    if copied != rows {
        warn!(
            file = %file.file_name,
            sent = rows,
            accepted = copied,
            "COPY accepted a different row count than was sent"
        );
    }
    Ok(copied)
}

/// The COPY statement for an entity's staging table, with `load_id` as the
/// trailing column.
fn copy_statement(entity: Entity) -> String {
    format!(
        "COPY staging.{} ({}, load_id) FROM STDIN WITH (FORMAT csv)",
        entity.table(),
        entity.columns().join(", "),
    )
}

/// Require the file header to equal the expected column list exactly.
fn validate_header(
    file_name: &str,
    actual: &csv::StringRecord,
    expected: &[&str],
) -> Result<()> {
    let matches =
        actual.len() == expected.len() && actual.iter().zip(expected).all(|(a, e)| a == *e);
    if matches {
        Ok(())
    } else {
        Err(StageError::HeaderMismatch {
            file: file_name.to_string(),
            expected: expected.join(","),
            actual: actual.iter().collect::<Vec<_>>().join(","),
        })
    }
}

/// CSV-encode one record with the `load_id` appended, into the send buffer.
fn write_record(buf: &mut Vec<u8>, record: &csv::StringRecord, load_id: i64) -> Result<()> {
    let mut out = record.clone();
    out.push_field(&load_id.to_string());

    let mut writer = csv::Writer::from_writer(buf);
    writer.write_record(&out)?;
    writer.flush()?;
    Ok(())
}
