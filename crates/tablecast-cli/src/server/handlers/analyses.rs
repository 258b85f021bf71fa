//! Concentration analysis handler.

use axum::{extract::State, Json};

use tablecast::{ConcentrationAnalysisTransform, Transform};

use crate::server::error::ApiError;
use crate::server::state::AppState;
use crate::wire::{ConcentrationAnalysisRequest, ConcentrationAnalysisResponse, TableData};

/// Run a concentration analysis on a cached table.
pub async fn run_concentration(
    State(state): State<AppState>,
    Json(request): Json<ConcentrationAnalysisRequest>,
) -> Result<Json<ConcentrationAnalysisResponse>, ApiError> {
    let table = state
        .cache
        .read()
        .await
        .get(&request.cache_key)
        .ok_or_else(|| {
            ApiError::NotFound(format!("Table not found in cache: {}", request.cache_key))
        })?;

    let on = request.on.clone();
    let by = request.by.clone();
    let result = tokio::task::spawn_blocking(move || {
        ConcentrationAnalysisTransform::new(on, by).apply(&table)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("analysis task failed: {}", e)))??;

    let cache_key = state.cache.write().await.put(result.clone(), None);

    let rows = result.data.height();
    let table_data = TableData::from_table(&result, cache_key, 0, rows);

    Ok(Json(ConcentrationAnalysisResponse {
        success: true,
        table: table_data,
        message: format!(
            "Successfully completed concentration analysis on '{}' by {:?} with {} rows",
            request.on, request.by, rows
        ),
        pivot_by: request.by,
        concentration_measure: request.on,
    }))
}
