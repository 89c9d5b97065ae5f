//! Module management handlers.

use axum::Json;
use axum::extract::{Path, State};
use serde_json::Value;

use crate::error::ApiError;
use meshboard_module::contract::ModuleInfo;

use crate::dto::response::{ApiResponse, ModuleDetailResponse};
use crate::state::AppState;

/// GET /api/modules
pub async fn list_modules(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<ModuleInfo>>> {
    Json(ApiResponse::ok(state.registry.module_list().await))
}

/// GET /api/modules/{name}
pub async fn get_module(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<ModuleDetailResponse>>, ApiError> {
    let module = state.registry.get(&name).await?;
    let settings = module.settings().await?;

    Ok(Json(ApiResponse::ok(ModuleDetailResponse {
        name: module.name().to_string(),
        display_name: module.display_name().to_string(),
        description: module.description().to_string(),
        icon: module.icon().to_string(),
        schema: module.schema(),
        settings,
        actions: module.actions(),
    })))
}

/// PUT /api/modules/{name}/settings
pub async fn save_settings(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(candidate): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let module = state.registry.get(&name).await?;
    let saved = module.save_settings(candidate).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": saved })))
}

/// POST /api/modules/{name}/actions/{action}
pub async fn execute_action(
    State(state): State<AppState>,
    Path((name, action)): Path<(String, String)>,
    params: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let params = params.map(|Json(p)| p).unwrap_or(Value::Null);
    let result = state
        .registry
        .execute_action(&name, &action, params, "api")
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": result })))
}

/// POST /api/modules/{name}/reload
pub async fn reload_module(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.registry.reload(&name).await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": { "message": "Module reloaded" } }),
    ))
}
