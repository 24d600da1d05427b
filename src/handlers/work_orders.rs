use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::entities::work_order;
use crate::{ApiResponse, ApiResult, AppState};

/// Get a single work order by ID
pub async fn get_work_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<work_order::Model> {
    let work_order = state.work_order_service.get_work_order(id).await?;
    Ok(Json(ApiResponse::success(work_order)))
}

/// Start a work order, notifying the downstream endpoint when the owning
/// order is a sub-assembly
pub async fn start_work_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<work_order::Model> {
    let work_order = state.work_order_service.start_work_order(id).await?;
    Ok(Json(ApiResponse::success(work_order)))
}

/// Finish a work order; the last one to finish closes the order and reports
/// completion downstream
pub async fn finish_work_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<work_order::Model> {
    let work_order = state.work_order_service.finish_work_order(id).await?;
    Ok(Json(ApiResponse::success(work_order)))
}
