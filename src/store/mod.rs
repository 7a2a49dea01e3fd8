//! Diagnostic-log storage engine
//!
//! Ingests structured log records and per-application status heartbeats
//! into SQLite and manages the lifecycle of time-partitioned storage:
//!
//! - one logical table per application, created lazily on first ingestion
//! - one physical partition table per calendar day
//! - scheduled maintenance keeps today/tomorrow writable and prunes
//!   partitions past the retention horizon
//!
//! ## Architecture
//!
//! ```text
//! ingestion / status / queries        maintenance schedule
//!        ↓                                   ↓
//!   LogStore (pool + registry + schema manager + clock)
//!        ↓
//!   per-application partition tables, fixed appstat table
//! ```

pub mod ingest;
pub mod maintenance;
pub mod partition;
pub mod query;
pub mod record;
pub mod schema;
pub mod status;
pub mod store;
pub mod tables;

pub use maintenance::{
    run_maintenance_now, spawn_maintenance_task, MaintenanceConfig, MaintenanceReport,
};
pub use partition::Partition;
pub use record::{
    ApplicationStatus, ErrorUpdate, KeywordFilters, LogLevel, LogRecord, LogSearchCriteria,
    PerformanceUpdate, StatusUpdate, EXTENSION_COLUMNS,
};
pub use schema::SchemaManager;
pub use store::{Clock, LogStore};
pub use tables::{application_hash, table_name_for_path, TableRegistry};
