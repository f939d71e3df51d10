use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::Actor;
use crate::entities::order;
use crate::errors::ServiceError;
use crate::services::{
    checkout::{CheckoutOutcome, CreateOrderRequest},
    fulfillment::FulfillmentOutcome,
    orders::OrderView,
};
use crate::{ApiResponse, ApiResult, AppState};

/// Check out cart items
pub async fn create_order(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CheckoutOutcome>>), ServiceError> {
    let outcome = state.services.checkout.create_order(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(outcome))))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> ApiResult<OrderView> {
    let order = state.services.orders.get_order(&actor, id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Take stock for a confirmed order
pub async fn proceed_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> ApiResult<FulfillmentOutcome> {
    let outcome = state.services.fulfillment.proceed_order(&actor, id).await?;
    Ok(Json(ApiResponse::success_with_message(
        outcome,
        "Order processed",
    )))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> ApiResult<order::Model> {
    let order = state.services.fulfillment.cancel_order(&actor, id).await?;
    Ok(Json(ApiResponse::success_with_message(
        order,
        "Order cancelled",
    )))
}

pub async fn send_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> ApiResult<order::Model> {
    let order = state.services.orders.send_order(&actor, id).await?;
    Ok(Json(ApiResponse::success(order)))
}

pub async fn confirm_arrival(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> ApiResult<order::Model> {
    let order = state.services.orders.confirm_arrival(&actor, id).await?;
    Ok(Json(ApiResponse::success(order)))
}
