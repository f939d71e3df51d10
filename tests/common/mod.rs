#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use pharmahub_api::{
    auth::{Actor, Role, ACTOR_ID_HEADER, ACTOR_ROLE_HEADER},
    config::AppConfig,
    db,
    entities::{
        cart_item, drug,
        order::{self, OrderStatus},
        order_detail, payment, pharmacy, pharmacy_drug, pharmacy_shipment_method,
        shipment_method, stock_journal, user_address,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    handlers::AppServices,
    repositories::{InventoryLedger, UserAddressRepository},
    services::{
        rate_quote::{RateQuote, RateQuoteClient, RateQuoteRequest},
        shipment_pricing::{DistanceCalculator, GeoPoint, HaversineDistance},
    },
    AppState,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Distance calculator returning the same distance for every pair
#[derive(Debug, Clone, Copy)]
pub struct FixedDistance(pub f64);

impl DistanceCalculator for FixedDistance {
    fn distance_km(&self, _from: GeoPoint, _to: GeoPoint) -> f64 {
        self.0
    }
}

/// Rate client answering every request with the same quotes
#[derive(Debug, Clone, Default)]
pub struct StubRates(pub Vec<RateQuote>);

#[async_trait]
impl RateQuoteClient for StubRates {
    async fn quote(&self, _request: &RateQuoteRequest) -> Result<Vec<RateQuote>, ServiceError> {
        Ok(self.0.clone())
    }
}

/// Rate client whose upstream is always down
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingRates;

#[async_trait]
impl RateQuoteClient for FailingRates {
    async fn quote(&self, _request: &RateQuoteRequest) -> Result<Vec<RateQuote>, ServiceError> {
        Err(ServiceError::ExternalServiceError(
            "rate API unavailable".to_string(),
        ))
    }
}

pub fn user(id: Uuid) -> Actor {
    Actor::new(Role::User, id, "user@pharmahub.test")
}

pub fn manager(id: Uuid) -> Actor {
    Actor::new(Role::Manager, id, "pm@pharmahub.test")
}

pub fn admin() -> Actor {
    Actor::new(Role::Admin, Uuid::new_v4(), "admin@pharmahub.test")
}

/// Fresh in-memory database with the schema and every service wired up.
pub struct TestDb {
    pub db: Arc<DatabaseConnection>,
    pub config: AppConfig,
    pub services: AppServices,
    events: mpsc::Receiver<Event>,
}

impl TestDb {
    pub async fn new() -> Self {
        Self::with_collaborators(Arc::new(HaversineDistance), Arc::new(StubRates::default())).await
    }

    pub async fn with_distance(km: f64) -> Self {
        Self::with_collaborators(Arc::new(FixedDistance(km)), Arc::new(StubRates::default())).await
    }

    pub async fn with_collaborators(
        distance: Arc<dyn DistanceCalculator>,
        rates: Arc<dyn RateQuoteClient>,
    ) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // One connection keeps every statement on the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db = Arc::new(pool);
        let (tx, rx) = mpsc::channel(1024);
        let services = AppServices::new(
            db.clone(),
            EventSender::new(tx),
            &cfg,
            Arc::new(UserAddressRepository::new(db.clone())),
            distance,
            rates,
        );

        Self {
            db,
            config: cfg,
            services,
            events: rx,
        }
    }

    pub fn conn(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    pub fn router(&self) -> Router {
        pharmahub_api::app_router(AppState {
            db: self.db.clone(),
            config: self.config.clone(),
            services: self.services.clone(),
        })
    }

    /// Sends a request through the router as `actor`.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        actor: Option<&Actor>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(actor) = actor {
            builder = builder
                .header(ACTOR_ROLE_HEADER, actor.role().to_string())
                .header(ACTOR_ID_HEADER, actor.id().to_string());
        }

        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("serialize request body"))
            }
            None => Body::empty(),
        };

        self.router()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("router error during test request")
    }

    /// Events published so far.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    pub async fn pharmacy(&self, manager_id: Uuid, latitude: f64, longitude: f64) -> pharmacy::Model {
        let now = Utc::now();
        pharmacy::ActiveModel::from(pharmacy::Model {
            id: Uuid::new_v4(),
            manager_id,
            name: "Apotek Sehat".to_string(),
            address: "Jl. Sudirman 1".to_string(),
            city_id: 151,
            latitude,
            longitude,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
        .insert(self.conn())
        .await
        .expect("seed pharmacy")
    }

    pub async fn drug(&self, weight: i32) -> drug::Model {
        let now = Utc::now();
        drug::ActiveModel::from(drug::Model {
            id: Uuid::new_v4(),
            name: "Paracetamol 500mg".to_string(),
            weight,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
        .insert(self.conn())
        .await
        .expect("seed drug")
    }

    pub async fn stock(
        &self,
        pharmacy_id: Uuid,
        drug_id: Uuid,
        stock: i32,
        price: i64,
    ) -> pharmacy_drug::Model {
        let now = Utc::now();
        pharmacy_drug::ActiveModel::from(pharmacy_drug::Model {
            id: Uuid::new_v4(),
            pharmacy_id,
            drug_id,
            category_id: None,
            stock,
            price,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
        .insert(self.conn())
        .await
        .expect("seed pharmacy drug")
    }

    pub async fn cart_item(
        &self,
        user_id: Uuid,
        pharmacy_drug: &pharmacy_drug::Model,
        quantity: i32,
    ) -> cart_item::Model {
        let now = Utc::now();
        cart_item::ActiveModel::from(cart_item::Model {
            id: Uuid::new_v4(),
            user_id,
            pharmacy_drug_id: pharmacy_drug.id,
            quantity,
            is_prescripted: false,
            price: pharmacy_drug.price,
            total_price: pharmacy_drug.price * i64::from(quantity),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
        .insert(self.conn())
        .await
        .expect("seed cart item")
    }

    pub async fn address(&self, user_id: Uuid, latitude: f64, longitude: f64) -> user_address::Model {
        let now = Utc::now();
        user_address::ActiveModel::from(user_address::Model {
            id: Uuid::new_v4(),
            user_id,
            address: "Jl. Melati 7, Jakarta".to_string(),
            city_id: 152,
            latitude,
            longitude,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
        .insert(self.conn())
        .await
        .expect("seed address")
    }

    pub async fn shipment_method(
        &self,
        id: i32,
        price_per_km: i64,
        estimated_days: Option<i32>,
    ) -> shipment_method::Model {
        shipment_method::ActiveModel::from(shipment_method::Model {
            id,
            name: format!("method {}", id),
            courier_name: if id <= 2 { "official" } else { "jne" }.to_string(),
            price_per_km,
            estimated_days,
        })
        .insert(self.conn())
        .await
        .expect("seed shipment method")
    }

    pub async fn offer_method(&self, pharmacy_id: Uuid, shipment_method_id: i32) {
        pharmacy_shipment_method::ActiveModel::from(pharmacy_shipment_method::Model {
            id: Uuid::new_v4(),
            pharmacy_id,
            shipment_method_id,
        })
        .insert(self.conn())
        .await
        .expect("seed pharmacy shipment method");
    }

    pub async fn payment(
        &self,
        user_id: Uuid,
        expired_at: Option<DateTime<Utc>>,
        proof: Option<&str>,
    ) -> payment::Model {
        let now = Utc::now();
        payment::ActiveModel::from(payment::Model {
            id: Uuid::new_v4(),
            user_id,
            number: format!("PAY-TEST-{}", Uuid::new_v4().simple()),
            method: "bank transfer".to_string(),
            proof: proof.map(str::to_string),
            total_price: 0,
            address: "Jl. Melati 7, Jakarta".to_string(),
            expired_at,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
        .insert(self.conn())
        .await
        .expect("seed payment")
    }

    /// An order of `pharmacy_id` in `status` with one line per entry.
    pub async fn order(
        &self,
        payment: &payment::Model,
        pharmacy_id: Uuid,
        status: OrderStatus,
        lines: &[(&pharmacy_drug::Model, i32)],
    ) -> order::Model {
        let now = Utc::now();
        let total: i64 = lines
            .iter()
            .map(|(item, qty)| item.price * i64::from(*qty))
            .sum();
        let order = order::ActiveModel::from(order::Model {
            id: Uuid::new_v4(),
            payment_id: payment.id,
            pharmacy_id,
            order_number: format!("ORD-TEST-{}", Uuid::new_v4().simple()),
            total_price: total,
            shipment_price: 0,
            status,
            shipment_method_id: 1,
            finished_at: None,
            created_at: now,
            updated_at: now,
        })
        .insert(self.conn())
        .await
        .expect("seed order");

        for (index, (item, quantity)) in lines.iter().enumerate() {
            order_detail::ActiveModel::from(order_detail::Model {
                id: Uuid::new_v4(),
                order_id: order.id,
                pharmacy_drug_id: item.id,
                quantity: *quantity,
                price: item.price,
                // Keeps detail order stable for line-by-line processing
                created_at: now + Duration::milliseconds(index as i64),
            })
            .insert(self.conn())
            .await
            .expect("seed order detail");
        }
        order
    }

    /// A paid order waiting for its pharmacy to process it.
    pub async fn confirmed_order(
        &self,
        user_id: Uuid,
        pharmacy_id: Uuid,
        lines: &[(&pharmacy_drug::Model, i32)],
    ) -> order::Model {
        let payment = self.payment(user_id, None, Some("receipt.png")).await;
        self.order(&payment, pharmacy_id, OrderStatus::PaymentConfirmed, lines)
            .await
    }

    pub async fn stock_of(&self, pharmacy_id: Uuid, drug_id: Uuid) -> i32 {
        InventoryLedger
            .stock_of(self.conn(), pharmacy_id, drug_id)
            .await
            .expect("read stock")
            .expect("pharmacy drug exists")
    }

    pub async fn journal_of(&self, pharmacy_id: Uuid, drug_id: Uuid) -> Vec<stock_journal::Model> {
        InventoryLedger
            .journal_of(self.conn(), pharmacy_id, drug_id)
            .await
            .expect("read journal")
    }

    pub async fn journal_sum(&self, pharmacy_id: Uuid, drug_id: Uuid) -> i32 {
        self.journal_of(pharmacy_id, drug_id)
            .await
            .iter()
            .map(|entry| entry.quantity)
            .sum()
    }
}
