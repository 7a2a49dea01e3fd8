//! Partition maintainer
//!
//! Keeps every application table writable for the present and the immediate
//! future, and prunes partitions past the retention horizon. Runs as a
//! single periodic task, concurrently with ingestion and queries.
//!
//! Ordering inside one table is deliberate: the today/tomorrow partitions
//! are ensured *before* stale partitions are dropped, so partition creation
//! is never starved by a backlog of drops and happens even on days with no
//! traffic yet. Failures are scoped per table — one table's DDL failure
//! must not keep the remaining tables from being maintained.

use crate::error::StoreError;
use crate::store::partition::Partition;
use crate::store::store::LogStore;
use crate::store::tables::table_name_for_path;
use chrono::{Datelike, Days, NaiveDate, TimeDelta, Timelike};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

/// Outcome of one maintenance run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MaintenanceReport {
    pub tables_maintained: usize,
    pub partitions_added: u64,
    pub partitions_dropped: u64,
    /// Tables whose maintenance failed this run; the rest were still
    /// processed.
    pub failed_tables: Vec<String>,
}

impl LogStore {
    /// Maintain every known application table.
    ///
    /// `keep_time` is the global retention horizon; zero is the sentinel
    /// for "retain forever — never drop". `per_application` overrides the
    /// horizon for individual applications, keyed by application path.
    /// Negative durations fail validation before any I/O.
    pub async fn maintain(
        &self,
        keep_time: TimeDelta,
        per_application: Option<&HashMap<String, TimeDelta>>,
    ) -> Result<MaintenanceReport, StoreError> {
        if keep_time < TimeDelta::zero() {
            return Err(StoreError::Validation(
                "retention time must be zero (retain forever) or positive".into(),
            ));
        }
        let mut keep_by_table: HashMap<String, TimeDelta> = HashMap::new();
        if let Some(overrides) = per_application {
            for (path, keep) in overrides {
                if *keep < TimeDelta::zero() {
                    return Err(StoreError::Validation(format!(
                        "retention override for {} must be non-negative",
                        path
                    )));
                }
                keep_by_table.insert(table_name_for_path(path), *keep);
            }
        }

        let today = self.clock().today();
        let mut report = MaintenanceReport::default();

        for table in self.registry().known_tables() {
            let keep = keep_by_table.get(&table).copied().unwrap_or(keep_time);
            match self.maintain_table(&table, today, keep).await {
                Ok((added, dropped)) => {
                    report.tables_maintained += 1;
                    report.partitions_added += added;
                    report.partitions_dropped += dropped;
                }
                Err(e) => {
                    tracing::error!(table = %table, error = %e, "partition maintenance failed");
                    report.failed_tables.push(table);
                }
            }
        }

        crate::metrics::record_partitions_added(report.partitions_added);
        crate::metrics::record_partitions_dropped(report.partitions_dropped);
        Ok(report)
    }

    async fn maintain_table(
        &self,
        table: &str,
        today: NaiveDate,
        keep: TimeDelta,
    ) -> Result<(u64, u64), StoreError> {
        let current = Partition::for_day(today);
        let future = Partition::for_day(today + Days::new(1));
        // Zero keep time: no horizon, nothing is ever stale.
        let horizon = if keep == TimeDelta::zero() {
            None
        } else {
            Some(Partition::for_day(today - keep))
        };

        let mut have_current = false;
        let mut have_future = false;
        let mut stale: Vec<Partition> = Vec::new();
        for partition in self.schema().list_partitions(table).await? {
            if horizon.is_some_and(|h| partition < h) {
                stale.push(partition);
            } else if partition == current {
                have_current = true;
            } else if partition == future {
                have_future = true;
            }
        }

        let mut added = 0;
        if !have_current {
            self.schema().add_partition(table, today).await?;
            added += 1;
        }
        if !have_future {
            self.schema().add_partition(table, today + Days::new(1)).await?;
            added += 1;
        }

        let mut dropped = 0;
        for partition in stale {
            self.schema().drop_partition(table, &partition.name()).await?;
            tracing::debug!(table = %table, partition = %partition.name(), "dropped stale partition");
            dropped += 1;
        }

        Ok((added, dropped))
    }
}

/// Scheduled-maintenance configuration.
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Hour of day (0-23, UTC) to run maintenance.
    pub maintenance_hour: u32,
    /// How often to check whether it is maintenance time.
    pub check_interval: Duration,
    pub keep_time: TimeDelta,
    pub per_application: HashMap<String, TimeDelta>,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            maintenance_hour: 3,
            check_interval: Duration::from_secs(3600),
            keep_time: TimeDelta::days(14),
            per_application: HashMap::new(),
        }
    }
}

/// Spawn the background maintenance task.
///
/// The task wakes every `check_interval`, and runs maintenance once per day
/// when the configured hour comes around.
pub fn spawn_maintenance_task(
    store: Arc<LogStore>,
    config: MaintenanceConfig,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        maintenance_loop(store, config).await;
    })
}

async fn maintenance_loop(store: Arc<LogStore>, config: MaintenanceConfig) {
    let mut interval = time::interval(config.check_interval);
    let mut last_run_day: Option<u32> = None;

    loop {
        interval.tick().await;

        let now = store.clock().now();
        if now.hour() != config.maintenance_hour || last_run_day == Some(now.ordinal()) {
            continue;
        }

        tracing::info!(hour = config.maintenance_hour, "starting scheduled maintenance");
        let per_application = (!config.per_application.is_empty()).then_some(&config.per_application);
        match store.maintain(config.keep_time, per_application).await {
            Ok(report) => {
                tracing::info!(
                    tables = report.tables_maintained,
                    added = report.partitions_added,
                    dropped = report.partitions_dropped,
                    failed = report.failed_tables.len(),
                    "scheduled maintenance completed"
                );
                last_run_day = Some(now.ordinal());
            }
            Err(e) => {
                tracing::error!(error = %e, "scheduled maintenance failed");
            }
        }
    }
}

/// Run maintenance immediately, outside the schedule.
pub async fn run_maintenance_now(
    store: &LogStore,
    keep_time: TimeDelta,
    per_application: Option<&HashMap<String, TimeDelta>>,
) -> Result<MaintenanceReport, StoreError> {
    tracing::info!("running manual maintenance");
    let report = store.maintain(keep_time, per_application).await?;
    tracing::info!(
        tables = report.tables_maintained,
        added = report.partitions_added,
        dropped = report.partitions_dropped,
        "manual maintenance completed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maintenance_config_default() {
        let config = MaintenanceConfig::default();
        assert_eq!(config.maintenance_hour, 3);
        assert_eq!(config.check_interval, Duration::from_secs(3600));
        assert_eq!(config.keep_time, TimeDelta::days(14));
    }
}
