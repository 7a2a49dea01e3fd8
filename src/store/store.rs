//! Store facade: connection pool, injected clock, startup seeding
//!
//! `LogStore` owns the SQLite pool, the table registry and the schema
//! manager; the ingestion, status, maintenance and query operations are
//! implemented on it in their own modules. All components are wired through
//! the constructor — there is no ambient static state, which keeps the
//! engine testable against a throwaway database and a fixed clock.

use crate::error::StoreError;
use crate::store::schema::SchemaManager;
use crate::store::tables::TableRegistry;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Injectable UTC time source. Production code uses [`Clock::system`];
/// tests pin the engine to a fixed instant.
#[derive(Clone)]
pub struct Clock(Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>);

impl Clock {
    pub fn system() -> Self {
        Self(Arc::new(Utc::now))
    }

    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self(Arc::new(move || at))
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.0)()
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Clock").field(&self.now()).finish()
    }
}

/// Diagnostic-log storage engine handle.
///
/// Cheap to share behind an `Arc`; all operations take `&self`.
///
/// # Example
///
/// ```ignore
/// let store = LogStore::open("sqlite:./data/logvault.db", Clock::system()).await?;
/// let id = store.add_log_record(&record).await?;
/// ```
pub struct LogStore {
    pool: SqlitePool,
    registry: Arc<TableRegistry>,
    schema: SchemaManager,
    clock: Clock,
}

impl LogStore {
    /// Open (creating if missing) the database, create the status table,
    /// and seed the registry from the catalog.
    pub async fn open(database_url: &str, clock: Clock) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30))
            .pragma("synchronous", "NORMAL")
            .pragma("temp_store", "memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        SchemaManager::ensure_status_table(&pool).await?;

        let registry = Arc::new(TableRegistry::new());
        let seeded = SchemaManager::seed_registry(&pool, &registry).await?;
        tracing::info!(tables = seeded, "log store opened");

        let schema = SchemaManager::new(pool.clone(), registry.clone());
        Ok(Self { pool, registry, schema, clock })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub fn schema(&self) -> &SchemaManager {
        &self.schema
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }
}

impl fmt::Debug for LogStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogStore")
            .field("known_tables", &self.registry.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_is_stable() {
        let at = Utc.with_ymd_and_hms(2026, 8, 4, 12, 30, 0).unwrap();
        let clock = Clock::fixed(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.today(), at.date_naive());
    }

    #[tokio::test]
    async fn test_open_seeds_registry_from_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("seed.db").display());
        let clock = Clock::fixed(Utc.with_ymd_and_hms(2026, 8, 4, 12, 0, 0).unwrap());

        {
            let store = LogStore::open(&url, clock.clone()).await.unwrap();
            let table = crate::store::tables::table_name_for_path("/apps/orders");
            store.schema().ensure_table_exists(&table, clock.today()).await.unwrap();
            assert_eq!(store.registry().len(), 1);
        }

        // A fresh handle over the same file rediscovers the table.
        let reopened = LogStore::open(&url, clock).await.unwrap();
        assert_eq!(reopened.registry().len(), 1);
        assert!(reopened
            .registry()
            .is_known(&crate::store::tables::table_name_for_path("/apps/orders")));
    }
}
