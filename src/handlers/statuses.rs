//! Application status handlers

use crate::error::StoreError;
use crate::handlers::AppState;
use crate::store::{ApplicationStatus, StatusUpdate};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

/// POST /api/status - upsert one application status heartbeat
pub async fn update_status(
    State(state): State<AppState>,
    Json(update): Json<StatusUpdate>,
) -> Result<StatusCode, StoreError> {
    state.store.update_application_status(&update).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct StatusesParams {
    /// Lower bound (RFC 3339) for either status timestamp. Defaults to
    /// five minutes ago.
    pub since: Option<DateTime<Utc>>,
}

/// GET /api/statuses - list recently updated application statuses
pub async fn get_statuses(
    State(state): State<AppState>,
    Query(params): Query<StatusesParams>,
) -> Result<Json<Vec<ApplicationStatus>>, StoreError> {
    let since = params
        .since
        .unwrap_or_else(|| state.store.clock().now() - TimeDelta::minutes(5));
    let statuses = state.store.get_application_statuses(since).await?;
    Ok(Json(statuses))
}
