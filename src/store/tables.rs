//! Table naming and the registry of known application tables
//!
//! Every application gets one logical table, named from a stable hash of the
//! application path. The registry caches which logical tables exist so that
//! the ingestion hot path never touches the catalog; it is seeded from the
//! catalog at startup and only ever grows (this engine never drops tables).

use crate::store::partition::Partition;
use dashmap::DashSet;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

/// Prefix of every application log table.
pub const APP_TABLE_PREFIX: &str = "applog_";

/// Separates the logical table name from the partition suffix in the
/// physical table name.
pub const PARTITION_SEPARATOR: &str = "__";

/// Stable application identity: a 32-hex-char digest of the application
/// path. Pure and deterministic — the same path always hashes to the same
/// identity.
pub fn application_hash(application_path: &str) -> String {
    let digest = Sha256::digest(application_path.as_bytes());
    digest[..16].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Logical table name for an application path.
pub fn table_name_for_path(application_path: &str) -> String {
    format!("{}{}", APP_TABLE_PREFIX, application_hash(application_path))
}

/// Physical table name of one partition of a logical table.
pub fn partition_table_name(table: &str, partition: &Partition) -> String {
    format!("{}{}{}", table, PARTITION_SEPARATOR, partition.name())
}

/// Split a physical partition table name into (logical table, partition).
/// Returns `None` for names outside the convention.
pub fn split_partition_table(physical: &str) -> Option<(&str, Partition)> {
    if !physical.starts_with(APP_TABLE_PREFIX) {
        return None;
    }
    let sep = physical.rfind(PARTITION_SEPARATOR)?;
    let (table, rest) = physical.split_at(sep);
    let partition = Partition::parse_name(&rest[PARTITION_SEPARATOR.len()..])?;
    Some((table, partition))
}

/// Process-wide cache of known application tables.
///
/// Readers are lock-free; the creation gate serializes the one place where
/// check-then-create must be atomic within this process. Cross-process races
/// are covered by the idempotent DDL itself.
#[derive(Debug, Default)]
pub struct TableRegistry {
    known: DashSet<String>,
    creation_gate: Mutex<()>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_known(&self, table: &str) -> bool {
        self.known.contains(table)
    }

    pub fn mark_known(&self, table: impl Into<String>) {
        self.known.insert(table.into());
    }

    /// Snapshot of all known logical tables, sorted for deterministic
    /// iteration order.
    pub fn known_tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = self.known.iter().map(|t| t.key().clone()).collect();
        tables.sort();
        tables
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Critical section guarding first-time table creation. Callers must
    /// re-check `is_known` after acquisition.
    pub(crate) fn creation_gate(&self) -> &Mutex<()> {
        &self.creation_gate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_hash_is_deterministic() {
        let a = application_hash("/apps/orders");
        let b = application_hash("/apps/orders");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_differs_per_path() {
        assert_ne!(application_hash("/apps/orders"), application_hash("/apps/billing"));
        // Case matters: paths are byte-compared, not normalized.
        assert_ne!(application_hash("/Apps/Orders"), application_hash("/apps/orders"));
    }

    #[test]
    fn test_table_name_convention() {
        let name = table_name_for_path("/apps/orders");
        assert!(name.starts_with(APP_TABLE_PREFIX));
        assert_eq!(name.len(), APP_TABLE_PREFIX.len() + 32);
    }

    #[test]
    fn test_partition_table_name_round_trip() {
        let table = table_name_for_path("/apps/orders");
        let partition = Partition::for_day(NaiveDate::from_ymd_opt(2026, 8, 4).unwrap());
        let physical = partition_table_name(&table, &partition);

        let (parsed_table, parsed_partition) = split_partition_table(&physical).unwrap();
        assert_eq!(parsed_table, table);
        assert_eq!(parsed_partition, partition);
    }

    #[test]
    fn test_split_rejects_foreign_tables() {
        assert_eq!(split_partition_table("appstat"), None);
        assert_eq!(split_partition_table("applog_abc"), None);
        assert_eq!(split_partition_table("applog_abc__pxyz"), None);
        assert_eq!(split_partition_table("sqlite_sequence"), None);
    }

    #[test]
    fn test_registry_marks_and_lists() {
        let registry = TableRegistry::new();
        assert!(!registry.is_known("applog_b"));

        registry.mark_known("applog_b");
        registry.mark_known("applog_a");
        registry.mark_known("applog_b");

        assert!(registry.is_known("applog_b"));
        assert_eq!(registry.known_tables(), vec!["applog_a", "applog_b"]);
        assert_eq!(registry.len(), 2);
    }
}
