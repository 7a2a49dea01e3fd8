//! Query engine
//!
//! Resolves search criteria to the relevant application table(s), prunes
//! the partition set down to the requested time range, fetches up to
//! limit+offset rows per table newest-first, then merges the per-table
//! streams by timestamp and applies the global offset/limit.

use crate::error::StoreError;
use crate::store::record::{LogLevel, LogRecord, LogSearchCriteria, EXTENSION_COLUMNS};
use crate::store::store::LogStore;
use crate::store::tables::{partition_table_name, table_name_for_path};
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::HashMap;
use std::time::Instant;

impl LogStore {
    /// Search stored log records.
    ///
    /// With `application_path` set the search hits that application's table
    /// only; otherwise it fans out to every known table. An unknown
    /// application yields an empty result, not an error.
    pub async fn search_logs(
        &self,
        criteria: &LogSearchCriteria,
    ) -> Result<Vec<LogRecord>, StoreError> {
        if criteria.limit == 0 {
            return Ok(Vec::new());
        }
        let started = Instant::now();

        let tables: Vec<String> = match &criteria.application_path {
            Some(path) => {
                let table = table_name_for_path(path);
                if !self.registry().is_known(&table) {
                    return Ok(Vec::new());
                }
                vec![table]
            }
            None => self.registry().known_tables(),
        };

        // Each table only needs to produce enough rows to survive the
        // global offset.
        let fetch = criteria.limit + criteria.offset;
        let per_table = futures::future::try_join_all(
            tables.iter().map(|table| self.search_table(table, criteria, fetch)),
        )
        .await?;

        let mut merged: Vec<LogRecord> = per_table.into_iter().flatten().collect();
        merged.sort_by(|a, b| b.time_utc.cmp(&a.time_utc));
        let results: Vec<LogRecord> = merged
            .into_iter()
            .skip(criteria.offset)
            .take(criteria.limit)
            .collect();

        crate::metrics::record_search_duration(started.elapsed());
        Ok(results)
    }

    async fn search_table(
        &self,
        table: &str,
        criteria: &LogSearchCriteria,
        fetch: usize,
    ) -> Result<Vec<LogRecord>, StoreError> {
        // Newest partitions first, keeping only those overlapping
        // [from, to).
        let mut partitions = self.schema().list_partitions(table).await?;
        partitions.retain(|p| {
            let start = p.day().and_time(NaiveTime::MIN).and_utc();
            let end = p.boundary().and_time(NaiveTime::MIN).and_utc();
            start < criteria.to_utc && end > criteria.from_utc
        });
        partitions.sort_by(|a, b| b.cmp(a));

        let mut rows: Vec<LogRecord> = Vec::new();
        for partition in partitions {
            if rows.len() >= fetch {
                break;
            }
            let physical = partition_table_name(table, &partition);
            let remaining = fetch - rows.len();
            let page = fetch_partition(self, &physical, criteria, remaining).await?;
            rows.extend(page);
        }
        Ok(rows)
    }
}

fn select_columns() -> String {
    let extension_columns: Vec<&str> = EXTENSION_COLUMNS.iter().map(|c| c.column).collect();
    format!(
        "logger_name, log_level, time_utc, message, exception_type, exception_message, \
         exception_additional_info, correlation_id, server, application_path, process_id, \
         thread_id, identity, {}, perf_data",
        extension_columns.join(", ")
    )
}

async fn fetch_partition(
    store: &LogStore,
    physical: &str,
    criteria: &LogSearchCriteria,
    limit: usize,
) -> Result<Vec<LogRecord>, StoreError> {
    let mut sql = format!(
        "SELECT {} FROM {physical} WHERE time_utc >= ? AND time_utc < ?",
        select_columns()
    );
    if !criteria.levels.is_empty() {
        let placeholders = vec!["?"; criteria.levels.len()].join(", ");
        sql.push_str(&format!(" AND log_level IN ({placeholders})"));
    }
    if criteria.server.is_some() {
        sql.push_str(" AND server = ?");
    }
    if criteria.keywords.url.is_some() {
        sql.push_str(" AND url = ?");
    }
    if criteria.keywords.client_ip.is_some() {
        sql.push_str(" AND client_ip = ?");
    }
    if criteria.keywords.service_name.is_some() {
        sql.push_str(" AND service_name = ?");
    }
    if criteria.keywords.message.is_some() {
        sql.push_str(" AND message LIKE ?");
    }
    sql.push_str(" ORDER BY time_utc DESC, server DESC, id DESC LIMIT ?");

    let mut query = sqlx::query(&sql).bind(criteria.from_utc).bind(criteria.to_utc);
    for level in &criteria.levels {
        query = query.bind(level.as_i64());
    }
    if let Some(server) = &criteria.server {
        query = query.bind(server);
    }
    if let Some(url) = &criteria.keywords.url {
        query = query.bind(url);
    }
    if let Some(client_ip) = &criteria.keywords.client_ip {
        query = query.bind(client_ip);
    }
    if let Some(service_name) = &criteria.keywords.service_name {
        query = query.bind(service_name);
    }
    if let Some(message) = &criteria.keywords.message {
        query = query.bind(format!("%{}%", message));
    }
    let rows = query
        .bind(limit as i64)
        .fetch_all(store.pool())
        .await?;

    rows.into_iter().map(row_to_record).collect()
}

fn row_to_record(row: SqliteRow) -> Result<LogRecord, StoreError> {
    let level_raw: i64 = row.get("log_level");
    let log_level = LogLevel::from_i64(level_raw)
        .ok_or_else(|| StoreError::Corrupt(format!("stored log level {}", level_raw)))?;

    let mut additional_fields = HashMap::new();
    for column in EXTENSION_COLUMNS {
        if let Some(value) = row.get::<Option<String>, _>(column.column) {
            additional_fields.insert(column.key.to_string(), value);
        }
    }

    let performance_data = match row.get::<Option<String>, _>("perf_data") {
        Some(json) => serde_json::from_str(&json)?,
        None => HashMap::new(),
    };

    let time_utc: DateTime<Utc> = row.get("time_utc");

    Ok(LogRecord {
        logger_name: row.get("logger_name"),
        log_level,
        time_utc,
        application_path: row.get("application_path"),
        message: row.get("message"),
        exception_type: row.get("exception_type"),
        exception_message: row.get("exception_message"),
        exception_additional_info: row.get("exception_additional_info"),
        correlation_id: row.get("correlation_id"),
        server: row.get("server"),
        process_id: row.get("process_id"),
        thread_id: row.get("thread_id"),
        identity: row.get("identity"),
        additional_fields,
        performance_data,
    })
}
