//! HTTP handlers.
//!
//! Handlers only extract the actor and the payload, call one service method
//! and wrap the result in an [`ApiResponse`](crate::ApiResponse).

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::{DbPool, Transactor};
use crate::events::EventSender;
use crate::repositories::AddressResolver;
use crate::services::{
    rate_quote::RateQuoteClient,
    shipment_pricing::{DistanceCalculator, ShipmentPricer},
    CheckoutService, FulfillmentService, OrderService, PaymentService, StockRequestService,
};

pub mod orders;
pub mod payments;
pub mod stock_requests;

#[derive(Clone)]
pub struct AppServices {
    pub checkout: Arc<CheckoutService>,
    pub fulfillment: Arc<FulfillmentService>,
    pub orders: Arc<OrderService>,
    pub payments: Arc<PaymentService>,
    pub stock_requests: Arc<StockRequestService>,
}

impl AppServices {
    /// Wires every service onto one pool and event channel.
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        config: &AppConfig,
        addresses: Arc<dyn AddressResolver>,
        distance: Arc<dyn DistanceCalculator>,
        rates: Arc<dyn RateQuoteClient>,
    ) -> Self {
        let transactor = Transactor::new(db_pool);
        let pricer = ShipmentPricer::new(distance.clone(), rates, config.shipment.clone());

        Self {
            checkout: Arc::new(CheckoutService::new(
                transactor.clone(),
                event_sender.clone(),
                addresses,
                pricer,
                config,
            )),
            fulfillment: Arc::new(FulfillmentService::new(
                transactor.clone(),
                event_sender.clone(),
                distance,
            )),
            orders: Arc::new(OrderService::new(transactor.clone(), event_sender.clone())),
            payments: Arc::new(PaymentService::new(
                transactor.clone(),
                event_sender.clone(),
                config,
            )),
            stock_requests: Arc::new(StockRequestService::new(transactor, event_sender)),
        }
    }
}
