//! Ingestion pipeline
//!
//! Resolves the target application table (creating it on first use),
//! projects the open extension mapping onto the allow-listed columns, clips
//! every capped field to its column width, and writes the row into the
//! partition covering the record's day. Oversized values are truncated,
//! never rejected; unknown extension keys are dropped silently. Both are
//! deliberate lossy projections, not errors.

use crate::error::StoreError;
use crate::store::partition::Partition;
use crate::store::record::{
    clip, clip_opt, clip_owned, LogRecord, EXTENSION_COLUMNS, MAX_APPLICATION_PATH,
    MAX_CORRELATION_ID, MAX_EXCEPTION_MESSAGE, MAX_EXCEPTION_TYPE, MAX_IDENTITY, MAX_LOGGER_NAME,
    MAX_MESSAGE, MAX_PERF_DATA, MAX_SERVER,
};
use crate::store::store::LogStore;
use crate::store::tables::{partition_table_name, table_name_for_path};

impl LogStore {
    /// Store one log record, returning the generated row id.
    ///
    /// First-time ingestion for an application creates its table and the
    /// today/tomorrow partitions as a byproduct.
    pub async fn add_log_record(&self, record: &LogRecord) -> Result<i64, StoreError> {
        let table = table_name_for_path(&record.application_path);
        self.schema().ensure_table_exists(&table, self.clock().today()).await?;

        let id = insert_record(self.pool(), &table, record).await?;
        crate::metrics::record_ingested(1);
        Ok(id)
    }

    /// Store a batch of records as one atomic unit: either every row is
    /// committed or none is. Records for different applications are routed
    /// to their own tables but share the transaction.
    ///
    /// Table creation is DDL and runs before the transaction opens — the
    /// batch unit covers rows, not schema.
    pub async fn add_log_records(&self, records: &[LogRecord]) -> Result<Vec<i64>, StoreError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let today = self.clock().today();
        let mut tables = Vec::with_capacity(records.len());
        for record in records {
            let table = table_name_for_path(&record.application_path);
            self.schema().ensure_table_exists(&table, today).await?;
            tables.push(table);
        }

        let mut tx = self.pool().begin().await?;
        let mut ids = Vec::with_capacity(records.len());
        for (record, table) in records.iter().zip(&tables) {
            ids.push(insert_record(&mut *tx, table, record).await?);
        }
        tx.commit().await?;

        crate::metrics::record_ingested(records.len() as u64);
        Ok(ids)
    }
}

/// Column list and placeholders, with the extension columns appended from
/// the allow-list so the statement cannot drift from the projection below.
fn insert_sql(physical: &str) -> String {
    let extension_columns: Vec<&str> = EXTENSION_COLUMNS.iter().map(|c| c.column).collect();
    let placeholders = vec!["?"; 14 + EXTENSION_COLUMNS.len()].join(", ");
    format!(
        "INSERT INTO {physical} (logger_name, log_level, time_utc, message, \
         exception_type, exception_message, exception_additional_info, correlation_id, \
         server, application_path, process_id, thread_id, identity, {}, perf_data) \
         VALUES ({placeholders})",
        extension_columns.join(", ")
    )
}

async fn insert_record<'e, E>(executor: E, table: &str, record: &LogRecord) -> Result<i64, StoreError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    // Rows land in the partition covering the record's calendar day. A
    // record dated outside every existing partition fails here with the
    // backing store's error, exactly like an out-of-range partitioned
    // insert would.
    let partition = Partition::for_day(record.time_utc.date_naive());
    let physical = partition_table_name(table, &partition);

    let perf_data = serialize_performance_data(record)?;
    let sql = insert_sql(&physical);

    let mut query = sqlx::query(&sql)
        .bind(clip(&record.logger_name, MAX_LOGGER_NAME))
        .bind(record.log_level.as_i64())
        .bind(record.time_utc)
        .bind(clip_opt(record.message.as_ref(), MAX_MESSAGE))
        .bind(clip_opt(record.exception_type.as_ref(), MAX_EXCEPTION_TYPE))
        .bind(clip_opt(record.exception_message.as_ref(), MAX_EXCEPTION_MESSAGE))
        .bind(record.exception_additional_info.as_deref())
        .bind(clip_opt(record.correlation_id.as_ref(), MAX_CORRELATION_ID))
        .bind(clip_opt(record.server.as_ref(), MAX_SERVER))
        .bind(clip(&record.application_path, MAX_APPLICATION_PATH))
        .bind(record.process_id)
        .bind(record.thread_id)
        .bind(clip_opt(record.identity.as_ref(), MAX_IDENTITY));

    for column in EXTENSION_COLUMNS {
        let value = record
            .additional_fields
            .get(column.key)
            .map(|v| clip(v, column.max_len));
        query = query.bind(value);
    }

    let result = query.bind(perf_data).execute(executor).await?;
    Ok(result.last_insert_rowid())
}

/// Compact JSON for the metric mapping; absent when the mapping is empty so
/// "no metrics" round-trips as NULL, not `{}`.
fn serialize_performance_data(record: &LogRecord) -> Result<Option<String>, StoreError> {
    if record.performance_data.is_empty() {
        return Ok(None);
    }
    let json = serde_json::to_string(&record.performance_data)?;
    Ok(Some(clip_owned(json, MAX_PERF_DATA)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_insert_sql_places_every_column() {
        let sql = insert_sql("applog_ab__p20260805");
        assert_eq!(sql.matches('?').count(), 24);
        for column in EXTENSION_COLUMNS {
            assert!(sql.contains(column.column), "missing column {}", column.column);
        }
    }

    #[test]
    fn test_empty_performance_data_serializes_to_null() {
        let record = LogRecord {
            logger_name: "test".into(),
            log_level: crate::store::record::LogLevel::Info,
            time_utc: chrono::Utc::now(),
            application_path: "/apps/x".into(),
            message: None,
            exception_type: None,
            exception_message: None,
            exception_additional_info: None,
            correlation_id: None,
            server: None,
            process_id: None,
            thread_id: None,
            identity: None,
            additional_fields: HashMap::new(),
            performance_data: HashMap::new(),
        };
        assert_eq!(serialize_performance_data(&record).unwrap(), None);

        let mut with_metrics = record;
        with_metrics.performance_data.insert("CPU".into(), 2.5);
        let json = serialize_performance_data(&with_metrics).unwrap().unwrap();
        assert!(json.contains("CPU"));
    }
}
