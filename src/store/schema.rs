//! Schema manager: runtime DDL over per-application tables
//!
//! Tables and partitions are created and destroyed while the engine runs, so
//! the schema is data here: a fixed set of DDL templates parameterized by
//! table and partition names, all of which derive from pure functions
//! (path hash, boundary-date formatting). Every statement is idempotent
//! (`IF NOT EXISTS` / `IF EXISTS`) so that concurrent processes sharing one
//! database cannot fail each other.
//!
//! The backing store has no native range partitions; a partition is a
//! physical table named `<table>__p<yyyymmdd>` and the catalog
//! (`sqlite_master`) is the source of truth for which ones exist.

use crate::error::StoreError;
use crate::store::partition::{Partition, PARTITION_PREFIX};
use crate::store::record::EXTENSION_COLUMNS;
use crate::store::tables::{
    partition_table_name, split_partition_table, TableRegistry, APP_TABLE_PREFIX,
    PARTITION_SEPARATOR,
};
use chrono::{Days, NaiveDate};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Fixed column layout of one partition table. The ten allow-listed
/// extension columns are appended from `EXTENSION_COLUMNS` so the DDL and
/// the ingestion projection cannot drift apart.
fn partition_ddl(physical: &str) -> String {
    let extension_columns: String = EXTENSION_COLUMNS
        .iter()
        .map(|c| format!("{} TEXT,", c.column))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {physical} (\
         id INTEGER PRIMARY KEY AUTOINCREMENT,\
         logger_name TEXT NOT NULL,\
         log_level INTEGER NOT NULL,\
         time_utc TEXT NOT NULL,\
         message TEXT,\
         exception_type TEXT,\
         exception_message TEXT,\
         exception_additional_info TEXT,\
         correlation_id TEXT,\
         server TEXT,\
         application_path TEXT,\
         process_id INTEGER,\
         thread_id INTEGER,\
         identity TEXT,\
         {extension_columns}\
         perf_data TEXT)"
    )
}

/// Primary access path: ordered scans by (time_utc, server, id).
fn partition_index_ddl(physical: &str) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS idx_{physical}_access \
         ON {physical} (time_utc, server, id)"
    )
}

/// Fixed status table, one row per (application identity, server) pair.
const APPSTAT_DDL: &str = "CREATE TABLE IF NOT EXISTS appstat (\
     application_hash TEXT NOT NULL,\
     server TEXT NOT NULL,\
     application_path TEXT NOT NULL,\
     cpu REAL,\
     memory REAL,\
     last_perf_update_utc TEXT,\
     last_error_type TEXT,\
     last_error_time_utc TEXT,\
     PRIMARY KEY (application_hash, server))";

/// Creates application tables and adds/drops their partitions.
#[derive(Debug, Clone)]
pub struct SchemaManager {
    pool: SqlitePool,
    registry: Arc<TableRegistry>,
}

impl SchemaManager {
    pub fn new(pool: SqlitePool, registry: Arc<TableRegistry>) -> Self {
        Self { pool, registry }
    }

    /// Create the fixed status table. Runs once at startup.
    pub(crate) async fn ensure_status_table(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(APPSTAT_DDL).execute(pool).await?;
        Ok(())
    }

    /// Seed the registry with every application table already present in
    /// the catalog.
    pub(crate) async fn seed_registry(
        pool: &SqlitePool,
        registry: &TableRegistry,
    ) -> Result<usize, StoreError> {
        let pattern = format!("{}%{}{}%", APP_TABLE_PREFIX, PARTITION_SEPARATOR, PARTITION_PREFIX);
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE ?",
        )
        .bind(&pattern)
        .fetch_all(pool)
        .await?;

        let mut seeded = 0;
        for name in names {
            if let Some((table, _)) = split_partition_table(&name) {
                if !registry.is_known(table) {
                    registry.mark_known(table);
                    seeded += 1;
                }
            }
        }
        Ok(seeded)
    }

    /// Make sure the application table exists, creating it with its two
    /// initial partitions (today and tomorrow) on first use.
    ///
    /// Safe to call concurrently for the same unseen table: the fast path is
    /// a lock-free registry read, and creation runs under a single critical
    /// section with the registry re-checked after acquisition. Returns
    /// whether this call created the table.
    pub async fn ensure_table_exists(
        &self,
        table: &str,
        today: NaiveDate,
    ) -> Result<bool, StoreError> {
        if self.registry.is_known(table) {
            return Ok(false);
        }

        let _guard = self.registry.creation_gate().lock().await;
        if self.registry.is_known(table) {
            // Another caller won the race while we waited for the gate.
            return Ok(false);
        }

        self.create_partition(table, Partition::for_day(today)).await?;
        self.create_partition(table, Partition::for_day(today + Days::new(1))).await?;
        self.registry.mark_known(table);

        crate::metrics::record_table_created();
        tracing::info!(table = %table, "created application table with initial partitions");
        Ok(true)
    }

    /// Add the partition covering `day` to an existing table. Idempotent.
    pub async fn add_partition(&self, table: &str, day: NaiveDate) -> Result<(), StoreError> {
        self.create_partition(table, Partition::for_day(day)).await
    }

    async fn create_partition(&self, table: &str, partition: Partition) -> Result<(), StoreError> {
        let physical = partition_table_name(table, &partition);
        sqlx::query(&partition_ddl(&physical)).execute(&self.pool).await?;
        sqlx::query(&partition_index_ddl(&physical)).execute(&self.pool).await?;
        Ok(())
    }

    /// Drop a partition by name. Idempotent; the name must follow the
    /// partition naming convention.
    pub async fn drop_partition(
        &self,
        table: &str,
        partition_name: &str,
    ) -> Result<(), StoreError> {
        let partition = Partition::parse_name(partition_name).ok_or_else(|| {
            StoreError::Validation(format!("not a partition name: {}", partition_name))
        })?;
        let physical = partition_table_name(table, &partition);
        sqlx::query(&format!("DROP TABLE IF EXISTS {physical}"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// List the partitions of one logical table from the catalog, oldest
    /// first.
    pub async fn list_partitions(&self, table: &str) -> Result<Vec<Partition>, StoreError> {
        let pattern = format!("{}{}%", table, PARTITION_SEPARATOR);
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE ? ORDER BY name",
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        let mut partitions: Vec<Partition> = names
            .iter()
            .filter_map(|name| split_partition_table(name))
            .filter(|(parsed_table, _)| *parsed_table == table)
            .map(|(_, partition)| partition)
            .collect();
        partitions.sort();
        Ok(partitions)
    }
}
