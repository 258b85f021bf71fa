//! File upload and load handlers.

use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::server::error::ApiError;
use crate::server::state::AppState;
use crate::wire::{LoadFileResponse, TableData, UploadFileResponse};

/// Maximum number of preview rows returned by the load endpoint.
const MAX_PREVIEW_ROWS: usize = 5000;

/// Query parameters for the upload endpoint.
#[derive(Deserialize)]
pub struct UploadQuery {
    /// Original filename; must end in `.csv`.
    pub filename: String,
}

/// Store raw CSV bytes without processing them.
pub async fn upload_file(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<UploadFileResponse>, ApiError> {
    if !query.filename.to_lowercase().ends_with(".csv") {
        return Err(ApiError::BadRequest(
            "Only CSV files are supported".to_string(),
        ));
    }
    if body.is_empty() {
        return Err(ApiError::BadRequest("Empty upload".to_string()));
    }

    let file_key = format!("{}/{}", Utc::now().format("%Y-%m-%d"), query.filename);
    let size = body.len();
    state.files.write().await.insert(file_key.clone(), body.to_vec());

    Ok(Json(UploadFileResponse {
        success: true,
        message: format!("Successfully uploaded {}", query.filename),
        file_key,
        filename: query.filename,
        size,
    }))
}

/// Query parameters for the load endpoint.
#[derive(Deserialize)]
pub struct LoadQuery {
    /// Key of the uploaded file to load.
    pub file_key: String,
    /// Row offset of the preview window.
    #[serde(default)]
    pub offset: usize,
    /// Number of preview rows to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

/// Process an uploaded file through the loader and return the table.
pub async fn load_file(
    State(state): State<AppState>,
    Query(query): Query<LoadQuery>,
) -> Result<Json<LoadFileResponse>, ApiError> {
    let bytes = state
        .files
        .read()
        .await
        .get(&query.file_key)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("File not found: {}", query.file_key)))?;

    let filename = query
        .file_key
        .rsplit('/')
        .next()
        .unwrap_or(query.file_key.as_str())
        .to_string();

    // The loader (and a possible oracle round-trip) is blocking work.
    let loader = state.loader();
    let table = tokio::task::spawn_blocking(move || loader.load_bytes(&bytes, &filename, None))
        .await
        .map_err(|e| ApiError::Internal(format!("load task failed: {}", e)))??;

    let cache_key = state.cache.write().await.put(table.clone(), None);

    let limit = query.limit.min(MAX_PREVIEW_ROWS);
    let (rows, cols) = table.data.shape();
    let table_data = TableData::from_table(&table, cache_key, query.offset, limit);

    Ok(Json(LoadFileResponse {
        success: true,
        table: table_data,
        message: format!(
            "Successfully processed {} with {} rows and {} columns",
            query.file_key, rows, cols
        ),
        file_key: query.file_key,
    }))
}
