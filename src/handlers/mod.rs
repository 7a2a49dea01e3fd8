//! HTTP handlers for the storage-facing API

pub mod health;
pub mod logs;
pub mod maintenance;
pub mod metrics_handler;
pub mod statuses;

use crate::config::RetentionConfig;
use crate::store::LogStore;
use std::sync::Arc;

/// Shared state for the API routes
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LogStore>,
    pub retention: RetentionConfig,
}
