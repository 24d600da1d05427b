use axum::{extract::State, response::Json};
use validator::Validate;

use crate::services::settings::{BridgeSettings, BridgeSettingsUpdate};
use crate::{ApiResponse, ApiResult, AppState};

/// Read the bridge delivery settings, seeding defaults on first access
pub async fn get_bridge_settings(State(state): State<AppState>) -> ApiResult<BridgeSettings> {
    let settings = state.settings_service.current_settings().await?;
    Ok(Json(ApiResponse::success(settings)))
}

/// Update the bridge delivery settings; absent fields keep their value
pub async fn update_bridge_settings(
    State(state): State<AppState>,
    Json(payload): Json<BridgeSettingsUpdate>,
) -> ApiResult<BridgeSettings> {
    payload.validate()?;
    let settings = state.settings_service.apply_update(payload).await?;
    Ok(Json(ApiResponse::success(settings)))
}
