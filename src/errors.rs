use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};

/// Body returned for every failed request
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    pub error: String,
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error description
    pub message: String,
    /// ISO 8601 timestamp when error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Insufficient stock to mutate from any partner pharmacy: {0}")]
    InsufficientStockMutation(String),

    #[error("Invalid shipment method: {0}")]
    InvalidShipmentMethods(String),

    #[error("No valid cart items left to order")]
    NoValidCartOrder,

    #[error("No valid payment for order: {0}")]
    NoValidPayment(String),

    #[error("Order or payment is no longer in the expected state: {0}")]
    NoValidOrderPayment(String),

    #[error("Order can't be cancelled in its current status")]
    CantCancelOrder,

    #[error("Stock can't be requested from the same pharmacy")]
    CantRequestToSamePharmacy,

    #[error("Stock can only be requested between pharmacies you manage")]
    CantRequestToPharmaciesNotPartner,

    #[error("Stock request can't be approved")]
    CantApproveStockMutation,

    #[error("Stock request can't be cancelled")]
    CantCancelStockMutation,

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_)
            | Self::InvalidShipmentMethods(_)
            | Self::NoValidCartOrder
            | Self::NoValidPayment(_)
            | Self::CantRequestToSamePharmacy
            | Self::CantRequestToPharmaciesNotPartner => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NoValidOrderPayment(_)
            | Self::CantCancelOrder
            | Self::CantApproveStockMutation
            | Self::CantCancelStockMutation => StatusCode::CONFLICT,
            Self::InsufficientStock(_) | Self::InsufficientStockMutation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            Self::DatabaseError(_) | Self::InternalError(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable code clients can branch on.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "database_error",
            Self::NotFound(_) => "resource_not_found",
            Self::ValidationError(_) => "validation_error",
            Self::Unauthorized(_) => "unauthorized",
            Self::InsufficientStock(_) => "insufficient_stock",
            Self::InsufficientStockMutation(_) => "insufficient_stock_mutation",
            Self::InvalidShipmentMethods(_) => "invalid_shipment_methods",
            Self::NoValidCartOrder => "no_valid_cart_order",
            Self::NoValidPayment(_) => "no_valid_payment",
            Self::NoValidOrderPayment(_) => "no_valid_order_payment",
            Self::CantCancelOrder => "cant_cancel_order",
            Self::CantRequestToSamePharmacy => "cant_request_to_same_pharmacy",
            Self::CantRequestToPharmaciesNotPartner => "cant_request_to_pharmacies_not_partner",
            Self::CantApproveStockMutation => "cant_approve_stock_mutation",
            Self::CantCancelStockMutation => "cant_cancel_stock_mutation",
            Self::ExternalServiceError(_) => "external_service_error",
            Self::InternalError(_) | Self::Other(_) => "internal_error",
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) | Self::Other(_) => "Internal server error".to_string(),
            Self::ExternalServiceError(_) => "Upstream service unavailable".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            code: self.code().to_string(),
            message: self.response_message(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}
