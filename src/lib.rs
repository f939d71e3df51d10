//! PharmaHub API library
//!
//! Order checkout, payment confirmation and inter-pharmacy stock
//! reconciliation for a pharmacy marketplace.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod repositories;
pub mod services;

use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

/// Envelope of every successful JSON response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    use handlers::{orders, payments, stock_requests};

    let orders = Router::new()
        .route("/orders", post(orders::create_order))
        .route("/orders/:id", get(orders::get_order))
        .route("/orders/:id/proceed", post(orders::proceed_order))
        .route("/orders/:id/cancel", post(orders::cancel_order))
        .route("/orders/:id/send", post(orders::send_order))
        .route("/orders/:id/arrival", post(orders::confirm_arrival));

    let payments = Router::new()
        .route("/payments/:id", get(payments::get_payment))
        .route("/payments/:id/proof", post(payments::upload_proof))
        .route("/payments/:id/confirm", post(payments::confirm_payment))
        .route("/payments/:id/reject", post(payments::reject_payment))
        .route("/payments/:id/cancel", post(payments::cancel_payment))
        .route("/payments/:id/expire", post(payments::expire_payment));

    let stock_requests = Router::new()
        .route(
            "/stock-requests",
            post(stock_requests::create_stock_request),
        )
        .route(
            "/stock-requests/:id",
            get(stock_requests::get_stock_request),
        )
        .route(
            "/stock-requests/:id/approve",
            post(stock_requests::approve_stock_request),
        )
        .route(
            "/stock-requests/:id/cancel",
            post(stock_requests::cancel_stock_request),
        );

    Router::new()
        .merge(orders)
        .merge(payments)
        .merge(stock_requests)
        .layer(middleware::from_fn(auth::gateway_actor_middleware))
}

/// Health probe plus the versioned API, without transport layers.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_v1_routes())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    let database = match db::check_connection(&state.db).await {
        Ok(()) => "healthy",
        Err(err) => {
            tracing::warn!(error = %err, "Database health check failed");
            "unhealthy"
        }
    };

    Json(ApiResponse::success(json!({
        "status": if database == "healthy" { "ok" } else { "degraded" },
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    })))
}
