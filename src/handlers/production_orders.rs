use axum::{
    extract::{Path, Query, State},
    response::Json,
};

use crate::entities::{order_note, production_order};
use crate::services::production_orders::ProductionOrderList;
use crate::{ApiResponse, ApiResult, AppState, ListQuery};

/// List production orders, newest first
pub async fn list_production_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<ProductionOrderList> {
    let list = state
        .production_order_service
        .list_orders(query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(list)))
}

/// Get a single production order by ID
pub async fn get_production_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<production_order::Model> {
    let order = state.production_order_service.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// List the audit notes attached to a production order
pub async fn list_order_notes(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<order_note::Model>> {
    let notes = state.production_order_service.list_notes(id).await?;
    Ok(Json(ApiResponse::success(notes)))
}
