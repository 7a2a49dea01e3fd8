//! Prometheus metrics endpoint

use axum::extract::State;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// GET /metrics - render Prometheus metrics
pub async fn metrics(State(handle): State<Arc<PrometheusHandle>>) -> String {
    handle.render()
}
