//! Settings document export/import handlers.

use axum::Json;
use axum::extract::State;
use serde_json::Value;
use tracing::info;

use crate::error::ApiError;

use crate::state::AppState;

/// GET /api/settings/export
pub async fn export(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let document = state.store.export().await?;
    Ok(Json(document))
}

/// POST /api/settings/import
pub async fn import(
    State(state): State<AppState>,
    Json(document): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    state.store.import(document).await?;
    info!("Settings document imported");
    Ok(Json(
        serde_json::json!({ "success": true, "data": { "message": "Settings imported" } }),
    ))
}
