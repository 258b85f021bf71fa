//! Health and readiness handlers.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::state::AppState;

/// Root message.
#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
}

/// Health report.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub cache: CacheHealth,
}

#[derive(Serialize)]
pub struct CacheHealth {
    pub entries: usize,
    pub capacity: usize,
}

/// Service banner.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Tablecast service is running".to_string(),
    })
}

/// Health check endpoint for monitoring.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = state.cache.read().await;
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "tablecast".to_string(),
        cache: CacheHealth {
            entries: cache.len(),
            capacity: cache.capacity(),
        },
    })
}
