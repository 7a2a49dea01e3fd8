//! Ingestion and search handlers

use crate::error::StoreError;
use crate::handlers::AppState;
use crate::store::{KeywordFilters, LogLevel, LogRecord, LogSearchCriteria};
use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct BatchIngestResponse {
    pub ids: Vec<i64>,
    pub count: usize,
}

/// POST /api/logs - store one log record
pub async fn add_log(
    State(state): State<AppState>,
    Json(record): Json<LogRecord>,
) -> Result<Json<IngestResponse>, StoreError> {
    let id = state.store.add_log_record(&record).await?;
    Ok(Json(IngestResponse { id }))
}

/// POST /api/logs/batch - store a batch of records atomically
pub async fn add_log_batch(
    State(state): State<AppState>,
    Json(records): Json<Vec<LogRecord>>,
) -> Result<Json<BatchIngestResponse>, StoreError> {
    let ids = state.store.add_log_records(&records).await?;
    let count = ids.len();
    Ok(Json(BatchIngestResponse { ids, count }))
}

/// Query parameters for the search API
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Inclusive lower time bound (RFC 3339). Defaults to one hour ago.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper time bound (RFC 3339). Defaults to now.
    pub to: Option<DateTime<Utc>>,
    /// Application path; when omitted the search spans all applications.
    pub application: Option<String>,
    /// Comma-separated level names, e.g. `error,fatal`.
    pub levels: Option<String>,
    pub server: Option<String>,
    /// Exact match against the url column.
    pub url: Option<String>,
    /// Exact match against the client_ip column.
    pub client_ip: Option<String>,
    /// Exact match against the service_name column.
    pub service_name: Option<String>,
    /// Substring match against the message column.
    pub message: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    100
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub total: usize,
    pub logs: Vec<LogRecord>,
}

/// GET /api/logs - search stored log records
///
/// Example: GET /api/logs?application=/apps/orders&levels=error&limit=10
pub async fn search_logs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, StoreError> {
    let levels = parse_levels(params.levels.as_deref())?;
    let now = state.store.clock().now();

    let criteria = LogSearchCriteria {
        from_utc: params.from.unwrap_or(now - TimeDelta::hours(1)),
        to_utc: params.to.unwrap_or(now),
        application_path: params.application,
        levels,
        server: params.server,
        keywords: KeywordFilters {
            url: params.url,
            client_ip: params.client_ip,
            service_name: params.service_name,
            message: params.message,
        },
        limit: params.limit,
        offset: params.offset,
    };

    let logs = state.store.search_logs(&criteria).await?;
    Ok(Json(SearchResponse { total: logs.len(), logs }))
}

fn parse_levels(raw: Option<&str>) -> Result<Vec<LogLevel>, StoreError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<LogLevel>().map_err(StoreError::Validation))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_levels() {
        assert_eq!(parse_levels(None).unwrap(), Vec::<LogLevel>::new());
        assert_eq!(
            parse_levels(Some("error, warn")).unwrap(),
            vec![LogLevel::Error, LogLevel::Warn]
        );
        assert!(parse_levels(Some("error,nope")).is_err());
    }
}
