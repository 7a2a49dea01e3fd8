//! Status aggregator
//!
//! One row per (application identity, server) pair in the fixed `appstat`
//! table. The performance sub-record and the error sub-record are updated
//! independently: each maps to its own SET clause and an update carrying
//! only one of them must never touch the other. Absent values stay NULL —
//! "never reported" is distinct from zero.

use crate::error::StoreError;
use crate::store::record::{
    clip, clip_opt, ApplicationStatus, StatusUpdate, MAX_APPLICATION_PATH, MAX_ERROR_TYPE,
    MAX_SERVER,
};
use crate::store::store::LogStore;
use crate::store::tables::application_hash;
use chrono::{DateTime, Utc};
use sqlx::Row;

impl LogStore {
    /// Upsert the status row for `(update.application_path, update.server)`.
    ///
    /// An update with neither sub-record present is a no-op. Otherwise the
    /// row is updated in place; if it does not exist yet it is inserted with
    /// exactly the supplied fields.
    pub async fn update_application_status(&self, update: &StatusUpdate) -> Result<(), StoreError> {
        if update.performance.is_none() && update.error.is_none() {
            return Ok(());
        }

        let hash = application_hash(&update.application_path);

        let mut clauses: Vec<&str> = Vec::with_capacity(2);
        if update.performance.is_some() {
            clauses.push("cpu = ?, memory = ?, last_perf_update_utc = ?");
        }
        if update.error.is_some() {
            clauses.push("last_error_type = ?, last_error_time_utc = ?");
        }
        let sql = format!(
            "UPDATE appstat SET {} WHERE application_hash = ? AND server = ?",
            clauses.join(", ")
        );

        let mut query = sqlx::query(&sql);
        if let Some(perf) = &update.performance {
            query = query.bind(perf.cpu).bind(perf.memory).bind(perf.observed_utc);
        }
        if let Some(error) = &update.error {
            query = query
                .bind(clip_opt(error.error_type.as_ref(), MAX_ERROR_TYPE))
                .bind(error.observed_utc);
        }
        let result = query
            .bind(&hash)
            .bind(&update.server)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            // First report for this pair. INSERT OR IGNORE keeps a racing
            // inserter from failing; the loser's fields arrive with its
            // next heartbeat.
            sqlx::query(
                "INSERT OR IGNORE INTO appstat \
                 (application_hash, application_path, server, cpu, memory, \
                  last_perf_update_utc, last_error_type, last_error_time_utc) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&hash)
            .bind(clip(&update.application_path, MAX_APPLICATION_PATH))
            .bind(clip(&update.server, MAX_SERVER))
            .bind(update.performance.as_ref().and_then(|p| p.cpu))
            .bind(update.performance.as_ref().and_then(|p| p.memory))
            .bind(update.performance.as_ref().map(|p| p.observed_utc))
            .bind(
                update
                    .error
                    .as_ref()
                    .and_then(|e| e.error_type.as_ref())
                    .map(|t| clip(t, MAX_ERROR_TYPE)),
            )
            .bind(update.error.as_ref().map(|e| e.observed_utc))
            .execute(self.pool())
            .await?;
        }

        Ok(())
    }

    /// All status rows touched (performance or error) at or after
    /// `since_utc`. Read-only; used by liveness dashboards.
    pub async fn get_application_statuses(
        &self,
        since_utc: DateTime<Utc>,
    ) -> Result<Vec<ApplicationStatus>, StoreError> {
        let rows = sqlx::query(
            "SELECT application_path, server, cpu, memory, last_perf_update_utc, \
             last_error_type, last_error_time_utc \
             FROM appstat \
             WHERE last_perf_update_utc >= ? OR last_error_time_utc >= ? \
             ORDER BY application_path, server",
        )
        .bind(since_utc)
        .bind(since_utc)
        .fetch_all(self.pool())
        .await?;

        let statuses = rows
            .into_iter()
            .map(|row| ApplicationStatus {
                application_path: row.get("application_path"),
                server: row.get("server"),
                cpu: row.get("cpu"),
                memory: row.get("memory"),
                last_perf_update_utc: row.get("last_perf_update_utc"),
                last_error_type: row.get("last_error_type"),
                last_error_time_utc: row.get("last_error_time_utc"),
            })
            .collect();

        Ok(statuses)
    }
}
