//! Manual maintenance trigger

use crate::error::StoreError;
use crate::handlers::AppState;
use crate::store::{run_maintenance_now, MaintenanceReport};
use axum::extract::State;
use axum::Json;

/// POST /api/maintenance/run - run partition maintenance with the configured
/// retention settings and report what changed.
pub async fn run_maintenance(
    State(state): State<AppState>,
) -> Result<Json<MaintenanceReport>, StoreError> {
    let per_application = state.retention.per_application_keep();
    let per_application = (!per_application.is_empty()).then_some(&per_application);

    let report =
        run_maintenance_now(&state.store, state.retention.keep_time(), per_application).await?;
    Ok(Json(report))
}
