use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::Actor;
use crate::errors::ServiceError;
use crate::services::payments::PaymentView;
use crate::{ApiResponse, ApiResult, AppState};

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct UploadProofRequest {
    /// Location of the uploaded transfer receipt
    #[validate(length(min = 1, max = 2048))]
    pub proof: String,
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> ApiResult<PaymentView> {
    let payment = state.services.payments.get_payment(&actor, id).await?;
    Ok(Json(ApiResponse::success(payment)))
}

pub async fn upload_proof(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
    Json(payload): Json<UploadProofRequest>,
) -> ApiResult<PaymentView> {
    payload.validate().map_err(ServiceError::from)?;
    let payment = state
        .services
        .payments
        .upload_proof(&actor, id, payload.proof)
        .await?;
    Ok(Json(ApiResponse::success(payment)))
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> ApiResult<PaymentView> {
    let payment = state.services.payments.confirm_payment(&actor, id).await?;
    Ok(Json(ApiResponse::success(payment)))
}

pub async fn reject_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> ApiResult<PaymentView> {
    let payment = state.services.payments.reject_payment(&actor, id).await?;
    Ok(Json(ApiResponse::success(payment)))
}

pub async fn cancel_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> ApiResult<PaymentView> {
    let payment = state.services.payments.cancel_payment(&actor, id).await?;
    Ok(Json(ApiResponse::success(payment)))
}

pub async fn expire_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> ApiResult<PaymentView> {
    let payment = state.services.payments.expire_payment(&actor, id).await?;
    Ok(Json(ApiResponse::success(payment)))
}
