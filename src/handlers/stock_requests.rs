use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::Actor;
use crate::errors::ServiceError;
use crate::services::stock_requests::{CreateStockRequest, StockRequestView};
use crate::{ApiResponse, ApiResult, AppState};

pub async fn create_stock_request(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateStockRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StockRequestView>>), ServiceError> {
    let request = state.services.stock_requests.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(request))))
}

pub async fn get_stock_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> ApiResult<StockRequestView> {
    let request = state.services.stock_requests.get(&actor, id).await?;
    Ok(Json(ApiResponse::success(request)))
}

pub async fn approve_stock_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> ApiResult<StockRequestView> {
    let request = state.services.stock_requests.approve(&actor, id).await?;
    Ok(Json(ApiResponse::success(request)))
}

pub async fn cancel_stock_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> ApiResult<StockRequestView> {
    let request = state.services.stock_requests.cancel(&actor, id).await?;
    Ok(Json(ApiResponse::success(request)))
}
